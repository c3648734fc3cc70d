use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{CatalogRepository, Clock, ProviderRepository};
use crate::domain::provider::{rank_available, LaundryProvider, ProviderLoad, ProviderRegistration};

pub struct ProviderService<R: ?Sized> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: ProviderRepository + CatalogRepository + ?Sized> ProviderService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Providers in `city` that can take an order for `service_id` right now.
    ///
    /// Advisory only: nothing is reserved, creation re-checks capacity.
    pub fn list_available(&self, city: &str, service_id: i32) -> Result<Vec<ProviderLoad>, DomainError> {
        if city.trim().is_empty() {
            return Err(DomainError::Validation("city is required".to_string()));
        }
        let candidates = self.repo.candidates_in_city(city)?;
        Ok(rank_available(candidates, city, service_id))
    }

    /// New accounts start pending and activate once the verification window
    /// has passed.
    pub fn register(&self, registration: ProviderRegistration) -> Result<LaundryProvider, DomainError> {
        registration.validate()?;
        for service_id in &registration.offered_services {
            if self.repo.find_service(*service_id)?.is_none() {
                return Err(DomainError::ServiceNotFound);
            }
        }
        let credential = registration.credential.clone();
        let provider = registration.into_provider(Uuid::new_v4(), self.clock.now());
        self.repo.register_provider(&provider, &credential)?;
        log::info!(
            "Laundry provider {} registered in {}, pending verification",
            provider.id,
            provider.city
        );
        Ok(provider)
    }

    pub fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.deactivate(id)?;
        log::info!("Laundry provider {} deactivated", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ManualClock;
    use crate::domain::provider::{ActivationState, OpeningHours};
    use crate::infrastructure::memory::MemoryStore;
    use chrono::{NaiveTime, Utc};

    fn registration(email: &str, capacity: i32) -> ProviderRegistration {
        ProviderRegistration {
            name: format!("Laundry {}", email),
            email: email.to_string(),
            credential: "pw".to_string(),
            phone: None,
            city: "Cali".to_string(),
            address: "Av. 6N".to_string(),
            capacity,
            offered_services: vec![1, 2],
            hours: OpeningHours::Daily {
                opens_at: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                closes_at: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            },
        }
    }

    fn service() -> (ProviderService<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_default_catalog());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (ProviderService::new(store.clone(), clock), store)
    }

    #[test]
    fn registered_provider_starts_pending_and_is_not_listed() {
        let (svc, _) = service();
        let provider = svc.register(registration("a@example.com", 3)).unwrap();
        assert_eq!(provider.activation, ActivationState::Pending);
        assert!(svc.list_available("Cali", 1).unwrap().is_empty());
    }

    #[test]
    fn activated_provider_is_listed_until_deactivated() {
        let (svc, store) = service();
        let provider = svc.register(registration("b@example.com", 3)).unwrap();
        store.activate_if_pending(provider.id).unwrap();

        let listed = svc.list_available("cali", 2).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].active_orders, 0);

        svc.deactivate(provider.id).unwrap();
        assert!(svc.list_available("Cali", 2).unwrap().is_empty());
    }

    #[test]
    fn unknown_offered_service_is_rejected() {
        let (svc, _) = service();
        let mut reg = registration("c@example.com", 3);
        reg.offered_services = vec![1, 9];
        assert!(matches!(svc.register(reg), Err(DomainError::ServiceNotFound)));
    }

    #[test]
    fn blank_city_is_a_validation_error() {
        let (svc, _) = service();
        assert!(matches!(
            svc.list_available(" ", 1),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn deactivating_unknown_provider_is_not_found() {
        let (svc, _) = service();
        assert!(matches!(
            svc.deactivate(Uuid::new_v4()),
            Err(DomainError::ProviderNotFound)
        ));
    }
}
