use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::domain::account::{Authenticated, Customer, CustomerRegistration};
use crate::domain::activation::resolve_state;
use crate::domain::errors::DomainError;
use crate::domain::order::Role;
use crate::domain::ports::{AccountRepository, Clock, ProviderRepository};

pub struct AuthService<R: ?Sized> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    activation_window: Duration,
}

impl<R: AccountRepository + ProviderRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, activation_window: Duration) -> Self {
        Self {
            repo,
            clock,
            activation_window,
        }
    }

    /// Credential check, then the activation gate for providers.
    pub fn authenticate(
        &self,
        identifier: &str,
        credential: &str,
        role: Role,
    ) -> Result<Authenticated, DomainError> {
        let account_id = self
            .repo
            .verify_credentials(role, identifier.trim(), credential)?
            .ok_or(DomainError::InvalidCredentials)?;

        if role == Role::Provider {
            let provider = self
                .repo
                .find_provider(account_id)?
                .ok_or(DomainError::InvalidCredentials)?;
            let resolution = resolve_state(
                provider.activation,
                provider.created_at,
                self.clock.now(),
                self.activation_window,
            );
            let activate = resolution.into_verdict().inspect_err(|e| {
                log::warn!("Login refused for provider {}: {}", account_id, e);
            })?;
            if activate && self.repo.activate_if_pending(account_id)? {
                log::info!("Laundry provider {} activated after verification window", account_id);
            }
        }

        Ok(Authenticated { account_id, role })
    }

    pub fn register_customer(&self, registration: CustomerRegistration) -> Result<Customer, DomainError> {
        registration.validate()?;
        let customer = self
            .repo
            .register_customer(&registration, Uuid::new_v4(), self.clock.now())?;
        log::info!("Customer {} registered", customer.id);
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activation::DEFAULT_ACTIVATION_WINDOW_SECS;
    use crate::domain::ports::ManualClock;
    use crate::domain::provider::tests::provider;
    use crate::domain::provider::ActivationState;
    use crate::infrastructure::memory::MemoryStore;
    use chrono::Utc;

    struct Fixture {
        svc: AuthService<MemoryStore>,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::with_default_catalog());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = AuthService::new(
            store.clone(),
            clock.clone(),
            Duration::seconds(DEFAULT_ACTIVATION_WINDOW_SECS),
        );
        Fixture { svc, store, clock }
    }

    fn pending_provider(f: &Fixture) -> Uuid {
        let mut p = provider("Fresh", 2, &[1]);
        p.activation = ActivationState::Pending;
        p.created_at = f.clock.now();
        f.store.register_provider(&p, "s3cret").unwrap();
        p.id
    }

    #[test]
    fn pending_provider_gets_a_countdown() {
        let f = fixture();
        pending_provider(&f);
        f.clock.advance(Duration::seconds(DEFAULT_ACTIVATION_WINDOW_SECS - 1));
        let err = f
            .svc
            .authenticate("fresh@example.com", "s3cret", Role::Provider)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::AccountPendingVerification { remaining_seconds: 1 }
        ));
    }

    #[test]
    fn provider_activates_when_the_window_elapses() {
        let f = fixture();
        let id = pending_provider(&f);
        f.clock.advance(Duration::seconds(DEFAULT_ACTIVATION_WINDOW_SECS));

        let auth = f
            .svc
            .authenticate("fresh@example.com", "s3cret", Role::Provider)
            .unwrap();

        assert_eq!(auth.account_id, id);
        assert_eq!(auth.role, Role::Provider);
        let stored = f.store.find_provider(id).unwrap().unwrap();
        assert_eq!(stored.activation, ActivationState::Active);
        // second login sees an already active account
        assert!(f
            .svc
            .authenticate("fresh@example.com", "s3cret", Role::Provider)
            .is_ok());
    }

    #[test]
    fn inactive_provider_is_refused_regardless_of_time() {
        let f = fixture();
        let id = pending_provider(&f);
        f.store.deactivate(id).unwrap();
        f.clock.advance(Duration::days(7));
        assert!(matches!(
            f.svc.authenticate("fresh@example.com", "s3cret", Role::Provider),
            Err(DomainError::AccountInactive)
        ));
    }

    #[test]
    fn wrong_credential_or_role_is_rejected() {
        let f = fixture();
        pending_provider(&f);
        assert!(matches!(
            f.svc.authenticate("fresh@example.com", "nope", Role::Provider),
            Err(DomainError::InvalidCredentials)
        ));
        assert!(matches!(
            f.svc.authenticate("fresh@example.com", "s3cret", Role::Customer),
            Err(DomainError::InvalidCredentials)
        ));
    }

    #[test]
    fn customers_log_in_immediately() {
        let f = fixture();
        let customer = f
            .svc
            .register_customer(CustomerRegistration {
                name: "Luis".to_string(),
                email: "luis@example.com".to_string(),
                credential: "pw".to_string(),
                phone: None,
            })
            .unwrap();
        let auth = f
            .svc
            .authenticate("luis@example.com", "pw", Role::Customer)
            .unwrap();
        assert_eq!(auth.account_id, customer.id);
    }

    #[test]
    fn concurrent_logins_after_the_window_all_succeed() {
        let f = fixture();
        pending_provider(&f);
        f.clock.advance(Duration::seconds(DEFAULT_ACTIVATION_WINDOW_SECS + 5));
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| f.svc.authenticate("fresh@example.com", "s3cret", Role::Provider)))
                .collect();
            for handle in handles {
                assert!(handle.join().expect("worker panicked").is_ok());
            }
        });
    }
}
