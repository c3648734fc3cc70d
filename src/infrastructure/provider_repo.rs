use std::collections::HashMap;

use diesel::dsl::count_star;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::FulfillmentStatus;
use crate::domain::ports::ProviderRepository;
use crate::domain::provider::{ActivationState, LaundryProvider, ProviderLoad};
use crate::schema::{laundry_providers, orders};

use super::models::{NewProviderRow, ProviderRow};
use super::{email_conflict, lower, DieselStore};

impl ProviderRepository for DieselStore {
    fn candidates_in_city(&self, city: &str) -> Result<Vec<ProviderLoad>, DomainError> {
        let mut conn = self.pool.get()?;

        let providers = laundry_providers::table
            .filter(lower(laundry_providers::city).eq(city.trim().to_lowercase()))
            .select(ProviderRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(ProviderRow::into_domain)
            .collect::<Result<Vec<LaundryProvider>, _>>()?;
        if providers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = providers.iter().map(|p| p.id).collect();
        let states: Vec<&str> = FulfillmentStatus::load_states().map(|s| s.as_str()).collect();
        let loads: HashMap<Uuid, i64> = orders::table
            .filter(orders::provider_id.eq_any(&ids))
            .filter(orders::fulfillment_status.eq_any(states))
            .group_by(orders::provider_id)
            .select((orders::provider_id, count_star()))
            .load::<(Uuid, i64)>(&mut conn)?
            .into_iter()
            .collect();

        Ok(providers
            .into_iter()
            .map(|provider| ProviderLoad {
                active_orders: loads.get(&provider.id).copied().unwrap_or(0),
                provider,
            })
            .collect())
    }

    fn find_provider(&self, id: Uuid) -> Result<Option<LaundryProvider>, DomainError> {
        let mut conn = self.pool.get()?;

        laundry_providers::table
            .find(id)
            .select(ProviderRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(ProviderRow::into_domain)
            .transpose()
    }

    fn register_provider(&self, provider: &LaundryProvider, credential: &str) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(laundry_providers::table)
            .values(NewProviderRow::new(provider, credential))
            .execute(&mut conn)
            .map_err(email_conflict)?;
        Ok(())
    }

    fn activate_if_pending(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(
            laundry_providers::table
                .find(id)
                .filter(laundry_providers::activation_state.eq(ActivationState::Pending.as_str())),
        )
        .set(laundry_providers::activation_state.eq(ActivationState::Active.as_str()))
        .execute(&mut conn)?;
        if updated > 0 {
            return Ok(true);
        }

        let exists: i64 = laundry_providers::table
            .find(id)
            .count()
            .get_result(&mut conn)?;
        if exists == 0 {
            return Err(DomainError::ProviderNotFound);
        }
        Ok(false)
    }

    fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(laundry_providers::table.find(id))
            .set(laundry_providers::activation_state.eq(ActivationState::Inactive.as_str()))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DomainError::ProviderNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::tests::provider;
    use crate::infrastructure::test_support::setup_db;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn candidates_match_city_case_insensitively() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let p = provider("Lava", 3, &[1]);
        store.register_provider(&p, "pw").expect("insert failed");

        let found = store.candidates_in_city("  bogotá ").expect("query failed");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].provider.id, p.id);
        assert_eq!(found[0].active_orders, 0);

        assert!(store.candidates_in_city("Medellín").expect("query failed").is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn duplicate_email_is_a_validation_error() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        store
            .register_provider(&provider("Lava", 3, &[1]), "pw")
            .expect("insert failed");

        let mut twin = provider("Lava", 3, &[1]);
        twin.email = "LAVA@example.com".to_string();
        let err = store.register_provider(&twin, "pw").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn activation_only_flips_pending_accounts() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let mut p = provider("Lava", 3, &[1]);
        p.activation = ActivationState::Pending;
        store.register_provider(&p, "pw").expect("insert failed");

        assert!(store.activate_if_pending(p.id).expect("activate failed"));
        assert!(!store.activate_if_pending(p.id).expect("activate failed"));

        store.deactivate(p.id).expect("deactivate failed");
        assert!(!store.activate_if_pending(p.id).expect("activate failed"));
        let stored = store.find_provider(p.id).expect("find failed").expect("missing");
        assert_eq!(stored.activation, ActivationState::Inactive);

        let err = store.activate_if_pending(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::ProviderNotFound));
    }
}
