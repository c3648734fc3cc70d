use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::catalog::{Extra, ServiceCatalogEntry};
use crate::domain::coupon::{evaluate, normalize_code, CouponResult};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CatalogRepository, Clock};

/// Look up and judge a coupon code. Storage failures propagate.
pub fn check_coupon<R: CatalogRepository + ?Sized>(
    repo: &R,
    code: &str,
    now: DateTime<Utc>,
) -> Result<CouponResult, DomainError> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Ok(CouponResult::invalid("Coupon code is required"));
    }
    let coupon = repo.find_coupon(&code)?;
    Ok(evaluate(coupon.as_ref(), now))
}

pub struct CatalogService<R: ?Sized> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: CatalogRepository + ?Sized> CatalogService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>, DomainError> {
        self.repo.list_services()
    }

    pub fn list_extras(&self) -> Result<Vec<Extra>, DomainError> {
        self.repo.list_extras()
    }

    /// Never fails: lookup errors are logged and reported as an invalid code.
    pub fn validate_coupon(&self, code: &str) -> CouponResult {
        match check_coupon(self.repo.as_ref(), code, self.clock.now()) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Coupon lookup failed: {}", e);
                CouponResult::invalid("Coupon could not be validated")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coupon::{Coupon, Discount};
    use crate::domain::ports::ManualClock;
    use crate::infrastructure::memory::MemoryStore;
    use bigdecimal::BigDecimal;
    use chrono::Duration;

    fn service() -> (CatalogService<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_default_catalog());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (CatalogService::new(store.clone(), clock), store)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let (svc, _) = service();
        let result = svc.validate_coupon(" giro20 ");
        assert!(result.valid);
        assert_eq!(result.discount, Some(Discount::Percentage(BigDecimal::from(20))));
    }

    #[test]
    fn empty_code_is_invalid_not_an_error() {
        let (svc, _) = service();
        let result = svc.validate_coupon("   ");
        assert!(!result.valid);
        assert_eq!(result.message, "Coupon code is required");
    }

    #[test]
    fn expired_code_reports_expiry() {
        let (svc, store) = service();
        store.put_coupon(Coupon {
            code: "SUMMER".to_string(),
            discount: Discount::Fixed(BigDecimal::from(5)),
            active: true,
            valid_to: Some(Utc::now() - Duration::hours(1)),
        });
        let result = svc.validate_coupon("summer");
        assert!(!result.valid);
        assert!(result.message.contains("expired"));
    }

    #[test]
    fn validation_does_not_consume_the_coupon() {
        let (svc, _) = service();
        for _ in 0..3 {
            assert!(svc.validate_coupon("GIRO20").valid);
        }
    }

    #[test]
    fn seeded_catalog_is_listed() {
        let (svc, _) = service();
        assert_eq!(svc.list_services().unwrap().len(), 3);
        assert_eq!(svc.list_extras().unwrap().len(), 5);
    }
}
