use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::account::{Customer, CustomerRegistration};
use crate::domain::errors::DomainError;
use crate::domain::order::Role;
use crate::domain::ports::AccountRepository;
use crate::schema::{customers, laundry_providers};

use super::models::{CustomerRow, NewCustomerRow};
use super::{email_conflict, lower, DieselStore};

impl AccountRepository for DieselStore {
    fn verify_credentials(
        &self,
        role: Role,
        identifier: &str,
        credential: &str,
    ) -> Result<Option<Uuid>, DomainError> {
        let mut conn = self.pool.get()?;
        let email = identifier.trim().to_lowercase();

        let id = match role {
            Role::Customer => customers::table
                .filter(lower(customers::email).eq(&email))
                .filter(customers::credential.eq(credential))
                .select(customers::id)
                .first::<Uuid>(&mut conn)
                .optional()?,
            Role::Provider => laundry_providers::table
                .filter(lower(laundry_providers::email).eq(&email))
                .filter(laundry_providers::credential.eq(credential))
                .select(laundry_providers::id)
                .first::<Uuid>(&mut conn)
                .optional()?,
        };
        Ok(id)
    }

    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn register_customer(
        &self,
        registration: &CustomerRegistration,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Customer, DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(customers::table)
            .values(NewCustomerRow {
                id,
                name: &registration.name,
                email: &registration.email,
                credential: &registration.credential,
                phone: registration.phone.as_deref(),
                created_at: at,
            })
            .execute(&mut conn)
            .map_err(email_conflict)?;

        Ok(Customer {
            id,
            name: registration.name.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            created_at: at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_support::setup_db;

    fn registration(email: &str) -> CustomerRegistration {
        CustomerRegistration {
            name: "Ana".to_string(),
            email: email.to_string(),
            credential: "pw".to_string(),
            phone: Some("3001234567".to_string()),
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn registered_customer_can_log_in() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let customer = store
            .register_customer(&registration("ana@example.com"), Uuid::new_v4(), Utc::now())
            .expect("insert failed");

        let found = store
            .verify_credentials(Role::Customer, "ANA@example.com", "pw")
            .expect("query failed");
        assert_eq!(found, Some(customer.id));

        let wrong = store
            .verify_credentials(Role::Customer, "ana@example.com", "nope")
            .expect("query failed");
        assert_eq!(wrong, None);

        let other_role = store
            .verify_credentials(Role::Provider, "ana@example.com", "pw")
            .expect("query failed");
        assert_eq!(other_role, None);

        let fetched = store.find_customer(customer.id).expect("query failed");
        assert_eq!(fetched.map(|c| c.email), Some("ana@example.com".to_string()));
        assert!(store.find_customer(Uuid::new_v4()).expect("query failed").is_none());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn duplicate_customer_email_is_rejected() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        store
            .register_customer(&registration("ana@example.com"), Uuid::new_v4(), Utc::now())
            .expect("insert failed");

        let err = store
            .register_customer(&registration("Ana@Example.com"), Uuid::new_v4(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
