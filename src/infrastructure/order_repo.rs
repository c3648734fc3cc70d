use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::OrderEvent;
use crate::domain::order::{
    Counterparty, FulfillmentStatus, Order, OrderSummary, PaymentMethod, PaymentStatus, Role,
    StatusChange,
};
use crate::domain::ports::OrderRepository;
use crate::domain::provider::admit;
use crate::schema::{customers, laundry_providers, order_events, order_extras, orders, service_catalog};

use super::models::{
    NewOrderEventRow, NewOrderExtraRow, NewOrderRow, OrderExtraRow, OrderRow, ProviderRow,
};
use super::{unknown_customer, DieselStore};

fn record_event(conn: &mut PgConnection, event: &OrderEvent) -> Result<(), DomainError> {
    diesel::insert_into(order_events::table)
        .values(NewOrderEventRow::from(event))
        .execute(conn)?;
    Ok(())
}

fn load_state_names() -> Vec<&'static str> {
    FulfillmentStatus::load_states().map(|s| s.as_str()).collect()
}

/// Attach each row's extras, preserving row order.
fn with_extras(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let extras = OrderExtraRow::belonging_to(&rows)
        .select(OrderExtraRow::as_select())
        .load(conn)?
        .grouped_by(&rows);
    rows.into_iter()
        .zip(extras)
        .map(|(row, extras)| row.into_domain(extras))
        .collect()
}

impl OrderRepository for DieselStore {
    fn insert_admitted(&self, order: &Order) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Lock the provider row; concurrent creations for the same
            //    provider queue here until this transaction ends.
            let provider = laundry_providers::table
                .find(order.provider_id)
                .select(ProviderRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::ProviderNotFound)?
                .into_domain()?;

            // 2. Recount load and admit
            let load: i64 = orders::table
                .filter(orders::provider_id.eq(order.provider_id))
                .filter(orders::fulfillment_status.eq_any(load_state_names()))
                .count()
                .get_result(conn)?;
            admit(&provider, load, order.service_id)?;

            // 3. Insert the order, its extras snapshot and the outbox event
            diesel::insert_into(orders::table)
                .values(NewOrderRow::from(order))
                .execute(conn)
                .map_err(unknown_customer)?;

            let extras: Vec<NewOrderExtraRow> = order
                .extras
                .iter()
                .map(|e| NewOrderExtraRow {
                    id: Uuid::new_v4(),
                    order_id: order.id,
                    extra_id: e.extra_id,
                    name: &e.name,
                    price: &e.price,
                })
                .collect();
            if !extras.is_empty() {
                diesel::insert_into(order_extras::table)
                    .values(&extras)
                    .execute(conn)?;
            }

            record_event(conn, &OrderEvent::created(order))
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(with_extras(&mut conn, vec![row])?.pop())
    }

    fn advance_status(
        &self,
        id: Uuid,
        target: FulfillmentStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let current: String = orders::table
                .find(id)
                .select(orders::fulfillment_status)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::OrderNotFound)?;
            let current: FulfillmentStatus = current
                .parse()
                .map_err(|e: DomainError| DomainError::Internal(e.to_string()))?;

            let change = current.transition_to(target)?;
            if !change.changed {
                return Ok(change);
            }

            diesel::update(orders::table.find(id))
                .set((
                    orders::fulfillment_status.eq(target.as_str()),
                    orders::updated_at.eq(at),
                ))
                .execute(conn)?;
            record_event(conn, &OrderEvent::status_changed(id, &change, at))?;
            Ok(change)
        })
    }

    fn set_payment(
        &self,
        id: Uuid,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let target = orders::table.find(id);
            let updated = match method {
                Some(method) => diesel::update(target)
                    .set((
                        orders::payment_status.eq(status.as_str()),
                        orders::payment_method.eq(method.as_str()),
                        orders::updated_at.eq(at),
                    ))
                    .execute(conn)?,
                None => diesel::update(target)
                    .set((
                        orders::payment_status.eq(status.as_str()),
                        orders::updated_at.eq(at),
                    ))
                    .execute(conn)?,
            };
            if updated == 0 {
                return Err(DomainError::OrderNotFound);
            }
            record_event(conn, &OrderEvent::payment_changed(id, status, method, at))
        })
    }

    fn list_for(&self, role: Role, account_id: Uuid) -> Result<Vec<OrderSummary>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| match role {
            Role::Customer => {
                let rows: Vec<(OrderRow, String, String, i32)> = orders::table
                    .inner_join(laundry_providers::table)
                    .inner_join(service_catalog::table)
                    .filter(orders::customer_id.eq(account_id))
                    .order(orders::created_at.desc())
                    .select((
                        OrderRow::as_select(),
                        laundry_providers::name,
                        service_catalog::name,
                        service_catalog::delivery_hours,
                    ))
                    .load(conn)?;
                let (order_rows, details): (Vec<_>, Vec<_>) = rows
                    .into_iter()
                    .map(|(row, provider, service, hours)| (row, (provider, service, hours)))
                    .unzip();
                Ok(with_extras(conn, order_rows)?
                    .into_iter()
                    .zip(details)
                    .map(|(order, (provider, service_name, delivery_hours))| OrderSummary {
                        order,
                        service_name,
                        delivery_hours,
                        counterparty: Counterparty::Provider { name: provider },
                    })
                    .collect())
            }
            Role::Provider => {
                let rows: Vec<(OrderRow, String, Option<String>, String, i32)> = orders::table
                    .inner_join(customers::table)
                    .inner_join(service_catalog::table)
                    .filter(orders::provider_id.eq(account_id))
                    .order(orders::created_at.desc())
                    .select((
                        OrderRow::as_select(),
                        customers::name,
                        customers::phone,
                        service_catalog::name,
                        service_catalog::delivery_hours,
                    ))
                    .load(conn)?;
                let (order_rows, details): (Vec<_>, Vec<_>) = rows
                    .into_iter()
                    .map(|(row, name, phone, service, hours)| (row, (name, phone, service, hours)))
                    .unzip();
                Ok(with_extras(conn, order_rows)?
                    .into_iter()
                    .zip(details)
                    .map(|(order, (name, phone, service_name, delivery_hours))| OrderSummary {
                        order,
                        service_name,
                        delivery_hours,
                        counterparty: Counterparty::Customer { name, phone },
                    })
                    .collect())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use diesel::prelude::*;

    use super::*;
    use crate::domain::account::CustomerRegistration;
    use crate::domain::order::{DeliveryMethod, OrderExtra, PickupDetails};
    use crate::domain::ports::{AccountRepository, ProviderRepository};
    use crate::domain::provider::tests::provider;
    use crate::infrastructure::models::OrderEventRow;
    use crate::infrastructure::test_support::setup_db;

    fn order(customer_id: Uuid, provider_id: Uuid) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_number: format!("LND-{}", Uuid::new_v4().simple()),
            customer_id,
            provider_id,
            service_id: 2,
            weight_kg: BigDecimal::from_str("5").unwrap(),
            base_price: BigDecimal::from_str("60.00").unwrap(),
            extras_price: BigDecimal::from_str("5.00").unwrap(),
            pickup_discount: BigDecimal::from_str("6.50").unwrap(),
            coupon_discount: BigDecimal::from_str("13.00").unwrap(),
            discount_code: Some("GIRO20".to_string()),
            total_price: BigDecimal::from_str("45.50").unwrap(),
            fulfillment_status: FulfillmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            delivery_method: DeliveryMethod::Pickup,
            pickup: PickupDetails {
                address: "Calle 80".to_string(),
                ..Default::default()
            },
            extras: vec![OrderExtra {
                extra_id: 1,
                name: "Premium softener".to_string(),
                price: BigDecimal::from_str("5.00").unwrap(),
            }],
            created_at: now,
            updated_at: now,
        }
    }

    fn seed(store: &DieselStore, capacity: i32) -> (Uuid, Uuid) {
        let p = provider("Lava", capacity, &[1, 2]);
        store.register_provider(&p, "pw").expect("provider insert failed");
        let customer = store
            .register_customer(
                &CustomerRegistration {
                    name: "Ana".to_string(),
                    email: "ana@example.com".to_string(),
                    credential: "pw".to_string(),
                    phone: None,
                },
                Uuid::new_v4(),
                Utc::now(),
            )
            .expect("customer insert failed");
        (customer.id, p.id)
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let (customer_id, provider_id) = seed(&store, 3);

        let placed = order(customer_id, provider_id);
        store.insert_admitted(&placed).expect("create failed");

        let found = store
            .find_by_id(placed.id)
            .expect("find failed")
            .expect("order should exist");
        assert_eq!(found.total_price, placed.total_price);
        assert_eq!(found.fulfillment_status, FulfillmentStatus::Pending);
        assert_eq!(found.extras, placed.extras);
        assert_eq!(found.delivery_method, DeliveryMethod::Pickup);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn order_for_unknown_customer_is_not_stored() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let (_, provider_id) = seed(&store, 3);

        let orphan = order(Uuid::new_v4(), provider_id);
        let err = store.insert_admitted(&orphan).unwrap_err();
        assert!(matches!(err, DomainError::CustomerNotFound));
        assert!(store.find_by_id(orphan.id).expect("find failed").is_none());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn concurrent_inserts_respect_capacity() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let (customer_id, provider_id) = seed(&store, 2);

        let accepted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..6)
                .map(|_| scope.spawn(|| store.insert_admitted(&order(customer_id, provider_id))))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("worker panicked"))
                .filter(Result::is_ok)
                .count()
        });

        assert_eq!(accepted, 2);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn status_changes_are_monotonic_and_recorded() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool.clone());
        let (customer_id, provider_id) = seed(&store, 3);
        let placed = order(customer_id, provider_id);
        store.insert_admitted(&placed).expect("create failed");

        store
            .advance_status(placed.id, FulfillmentStatus::Drying, Utc::now())
            .expect("advance failed");
        let err = store
            .advance_status(placed.id, FulfillmentStatus::Received, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        let noop = store
            .advance_status(placed.id, FulfillmentStatus::Drying, Utc::now())
            .expect("no-op failed");
        assert!(!noop.changed);

        let mut conn = pool.get().expect("Failed to get connection");
        let events: Vec<OrderEventRow> = order_events::table
            .filter(order_events::aggregate_id.eq(placed.id))
            .order(order_events::created_at.asc())
            .select(OrderEventRow::as_select())
            .load(&mut conn)
            .expect("query failed");
        let kinds: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["OrderCreated", "OrderStatusChanged"]);
        assert_eq!(events[0].aggregate_type, "Order");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn payment_update_on_unknown_order_is_not_found() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);

        let err = store
            .set_payment(Uuid::new_v4(), PaymentStatus::Completed, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::OrderNotFound));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn listing_branches_on_role() {
        let (_container, pool) = setup_db().await;
        let store = DieselStore::new(pool);
        let (customer_id, provider_id) = seed(&store, 3);
        store
            .insert_admitted(&order(customer_id, provider_id))
            .expect("create failed");

        let as_customer = store.list_for(Role::Customer, customer_id).expect("list failed");
        assert_eq!(as_customer.len(), 1);
        assert_eq!(
            as_customer[0].counterparty,
            Counterparty::Provider {
                name: "Lava".to_string()
            }
        );
        assert_eq!(as_customer[0].service_name, "Premium");

        let as_provider = store.list_for(Role::Provider, provider_id).expect("list failed");
        assert!(matches!(
            &as_provider[0].counterparty,
            Counterparty::Customer { name, .. } if name == "Ana"
        ));
    }
}
