use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::account::{Customer, CustomerRegistration};
use super::catalog::{Extra, ServiceCatalogEntry};
use super::coupon::Coupon;
use super::errors::DomainError;
use super::order::{FulfillmentStatus, Order, OrderSummary, PaymentMethod, PaymentStatus, Role, StatusChange};
use super::provider::{LaundryProvider, ProviderLoad};

pub trait OrderRepository: Send + Sync + 'static {
    /// Insert `order` after re-running admission control for its provider
    /// under that provider's exclusive guard.
    fn insert_admitted(&self, order: &Order) -> Result<(), DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Check-and-set of the fulfillment status under the order's guard.
    fn advance_status(
        &self,
        id: Uuid,
        target: FulfillmentStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, DomainError>;
    fn set_payment(
        &self,
        id: Uuid,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
    /// Orders visible to `account_id` acting as `role`, newest first.
    fn list_for(&self, role: Role, account_id: Uuid) -> Result<Vec<OrderSummary>, DomainError>;
}

pub trait ProviderRepository: Send + Sync + 'static {
    fn candidates_in_city(&self, city: &str) -> Result<Vec<ProviderLoad>, DomainError>;
    fn find_provider(&self, id: Uuid) -> Result<Option<LaundryProvider>, DomainError>;
    fn register_provider(&self, provider: &LaundryProvider, credential: &str) -> Result<(), DomainError>;
    /// Conditional `pending → active`. Returns whether this call made the change.
    fn activate_if_pending(&self, id: Uuid) -> Result<bool, DomainError>;
    fn deactivate(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>, DomainError>;
    fn find_service(&self, id: i32) -> Result<Option<ServiceCatalogEntry>, DomainError>;
    fn list_extras(&self) -> Result<Vec<Extra>, DomainError>;
    fn find_extras(&self, ids: &[i32]) -> Result<Vec<Extra>, DomainError>;
    /// Exact match on an already normalized code.
    fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, DomainError>;
}

pub trait AccountRepository: Send + Sync + 'static {
    /// Account id when `identifier`/`credential` match an account of `role`.
    fn verify_credentials(
        &self,
        role: Role,
        identifier: &str,
        credential: &str,
    ) -> Result<Option<Uuid>, DomainError>;
    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
    fn register_customer(
        &self,
        registration: &CustomerRegistration,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Customer, DomainError>;
}

/// Everything the application services need from storage.
pub trait Store: OrderRepository + ProviderRepository + CatalogRepository + AccountRepository {}

impl<T> Store for T where T: OrderRepository + ProviderRepository + CatalogRepository + AccountRepository {}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}
