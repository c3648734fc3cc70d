//! In-memory implementation of the storage ports.
//!
//! Used by the unit tests, the HTTP tests and `STORAGE=memory` local runs.
//! Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::account::{Customer, CustomerRegistration};
use crate::domain::catalog::{Extra, ServiceCatalogEntry};
use crate::domain::coupon::Coupon;
use crate::domain::errors::DomainError;
use crate::domain::events::OrderEvent;
use crate::domain::order::{
    Counterparty, FulfillmentStatus, Order, OrderSummary, PaymentMethod, PaymentStatus, Role,
    StatusChange,
};
use crate::domain::ports::{AccountRepository, CatalogRepository, OrderRepository, ProviderRepository};
use crate::domain::provider::{admit, ActivationState, LaundryProvider, ProviderLoad};

struct Account<T> {
    record: T,
    credential: String,
}

#[derive(Default)]
pub struct MemoryStore {
    services: RwLock<BTreeMap<i32, ServiceCatalogEntry>>,
    extras: RwLock<BTreeMap<i32, Extra>>,
    coupons: RwLock<HashMap<String, Coupon>>,
    providers: RwLock<HashMap<Uuid, Account<LaundryProvider>>>,
    customers: RwLock<HashMap<Uuid, Account<Customer>>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    events: RwLock<Vec<OrderEvent>>,
    provider_guards: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap_or_else(|_| BigDecimal::from(0))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the same catalog the database migration seeds.
    pub fn with_default_catalog() -> Self {
        let store = Self::new();
        let services = [
            (1, "Basic", "9.50", false, false, 48),
            (2, "Premium", "12.00", true, true, 24),
            (3, "Express", "17.00", true, true, 12),
        ];
        for (id, name, price, drying, ironing, hours) in services {
            store.put_service(ServiceCatalogEntry {
                id,
                name: name.to_string(),
                price_per_kg: dec(price),
                includes_drying: drying,
                includes_ironing: ironing,
                delivery_hours: hours,
            });
        }
        let extras = [
            (1, "Premium softener", "Long lasting fragrance", "5.00"),
            (2, "Stain treatment", "Pre-wash spot treatment", "8.00"),
            (3, "Special packaging", "Garment bags and tissue", "6.00"),
            (4, "Professional folding", "Shop-style folding", "10.00"),
            (5, "Deep disinfection", "High temperature sanitising cycle", "7.00"),
        ];
        for (id, name, description, price) in extras {
            store.put_extra(Extra {
                id,
                name: name.to_string(),
                description: description.to_string(),
                price: dec(price),
            });
        }
        store.put_coupon(Coupon {
            code: "GIRO20".to_string(),
            discount: crate::domain::coupon::Discount::Percentage(dec("20")),
            active: true,
            valid_to: None,
        });
        store
    }

    pub fn put_service(&self, service: ServiceCatalogEntry) {
        if let Ok(mut services) = self.services.write() {
            services.insert(service.id, service);
        }
    }

    pub fn put_extra(&self, extra: Extra) {
        if let Ok(mut extras) = self.extras.write() {
            extras.insert(extra.id, extra);
        }
    }

    pub fn put_coupon(&self, coupon: Coupon) {
        if let Ok(mut coupons) = self.coupons.write() {
            coupons.insert(coupon.code.clone(), coupon);
        }
    }

    /// Outbox records written for `order_id`, oldest first.
    pub fn events_for(&self, order_id: Uuid) -> Vec<OrderEvent> {
        self.events
            .read()
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.order_id == order_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn provider_guard(&self, provider_id: Uuid) -> Result<Arc<Mutex<()>>, DomainError> {
        let mut guards = self.provider_guards.lock()?;
        Ok(guards.entry(provider_id).or_default().clone())
    }

    fn load_of(&self, provider_id: Uuid) -> Result<i64, DomainError> {
        let orders = self.orders.read()?;
        Ok(orders
            .values()
            .filter(|o| o.provider_id == provider_id && o.fulfillment_status.occupies_capacity())
            .count() as i64)
    }

    fn record(&self, event: OrderEvent) -> Result<(), DomainError> {
        self.events.write()?.push(event);
        Ok(())
    }

    fn email_taken<T>(accounts: &HashMap<Uuid, Account<T>>, email: &str, email_of: impl Fn(&T) -> &str) -> bool {
        accounts
            .values()
            .any(|a| email_of(&a.record).eq_ignore_ascii_case(email))
    }
}

impl OrderRepository for MemoryStore {
    fn insert_admitted(&self, order: &Order) -> Result<(), DomainError> {
        let guard = self.provider_guard(order.provider_id)?;
        let _held = guard.lock()?;

        let provider = self
            .providers
            .read()?
            .get(&order.provider_id)
            .map(|a| a.record.clone())
            .ok_or(DomainError::ProviderNotFound)?;
        if !self.customers.read()?.contains_key(&order.customer_id) {
            return Err(DomainError::CustomerNotFound);
        }
        let load = self.load_of(order.provider_id)?;
        admit(&provider, load, order.service_id)?;

        self.orders.write()?.insert(order.id, order.clone());
        self.record(OrderEvent::created(order))
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read()?.get(&id).cloned())
    }

    fn advance_status(
        &self,
        id: Uuid,
        target: FulfillmentStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, DomainError> {
        let mut orders = self.orders.write()?;
        let order = orders.get_mut(&id).ok_or(DomainError::OrderNotFound)?;
        let change = order.fulfillment_status.transition_to(target)?;
        if change.changed {
            order.fulfillment_status = target;
            order.updated_at = at;
            self.record(OrderEvent::status_changed(id, &change, at))?;
        }
        Ok(change)
    }

    fn set_payment(
        &self,
        id: Uuid,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut orders = self.orders.write()?;
        let order = orders.get_mut(&id).ok_or(DomainError::OrderNotFound)?;
        order.payment_status = status;
        if method.is_some() {
            order.payment_method = method;
        }
        order.updated_at = at;
        self.record(OrderEvent::payment_changed(id, status, method, at))
    }

    fn list_for(&self, role: Role, account_id: Uuid) -> Result<Vec<OrderSummary>, DomainError> {
        let mut mine: Vec<Order> = self
            .orders
            .read()?
            .values()
            .filter(|o| match role {
                Role::Customer => o.customer_id == account_id,
                Role::Provider => o.provider_id == account_id,
            })
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let services = self.services.read()?;
        let providers = self.providers.read()?;
        let customers = self.customers.read()?;
        Ok(mine
            .into_iter()
            .filter_map(|order| {
                let service = services.get(&order.service_id)?;
                let counterparty = match role {
                    Role::Customer => Counterparty::Provider {
                        name: providers.get(&order.provider_id)?.record.name.clone(),
                    },
                    Role::Provider => {
                        let customer = &customers.get(&order.customer_id)?.record;
                        Counterparty::Customer {
                            name: customer.name.clone(),
                            phone: customer.phone.clone(),
                        }
                    }
                };
                Some(OrderSummary {
                    service_name: service.name.clone(),
                    delivery_hours: service.delivery_hours,
                    counterparty,
                    order,
                })
            })
            .collect())
    }
}

impl ProviderRepository for MemoryStore {
    fn candidates_in_city(&self, city: &str) -> Result<Vec<ProviderLoad>, DomainError> {
        let providers: Vec<LaundryProvider> = self
            .providers
            .read()?
            .values()
            .map(|a| a.record.clone())
            .filter(|p| p.is_in_city(city))
            .collect();
        providers
            .into_iter()
            .map(|provider| {
                let active_orders = self.load_of(provider.id)?;
                Ok(ProviderLoad {
                    provider,
                    active_orders,
                })
            })
            .collect()
    }

    fn find_provider(&self, id: Uuid) -> Result<Option<LaundryProvider>, DomainError> {
        Ok(self.providers.read()?.get(&id).map(|a| a.record.clone()))
    }

    fn register_provider(&self, provider: &LaundryProvider, credential: &str) -> Result<(), DomainError> {
        let mut providers = self.providers.write()?;
        if Self::email_taken(&providers, &provider.email, |p| p.email.as_str()) {
            return Err(DomainError::Validation("email already registered".to_string()));
        }
        providers.insert(
            provider.id,
            Account {
                record: provider.clone(),
                credential: credential.to_string(),
            },
        );
        Ok(())
    }

    fn activate_if_pending(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut providers = self.providers.write()?;
        let account = providers.get_mut(&id).ok_or(DomainError::ProviderNotFound)?;
        if account.record.activation != ActivationState::Pending {
            return Ok(false);
        }
        account.record.activation = ActivationState::Active;
        Ok(true)
    }

    fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        let mut providers = self.providers.write()?;
        let account = providers.get_mut(&id).ok_or(DomainError::ProviderNotFound)?;
        account.record.activation = ActivationState::Inactive;
        Ok(())
    }
}

impl CatalogRepository for MemoryStore {
    fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>, DomainError> {
        Ok(self.services.read()?.values().cloned().collect())
    }

    fn find_service(&self, id: i32) -> Result<Option<ServiceCatalogEntry>, DomainError> {
        Ok(self.services.read()?.get(&id).cloned())
    }

    fn list_extras(&self) -> Result<Vec<Extra>, DomainError> {
        Ok(self.extras.read()?.values().cloned().collect())
    }

    fn find_extras(&self, ids: &[i32]) -> Result<Vec<Extra>, DomainError> {
        let extras = self.extras.read()?;
        Ok(ids.iter().filter_map(|id| extras.get(id).cloned()).collect())
    }

    fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        Ok(self.coupons.read()?.get(code).cloned())
    }
}

impl AccountRepository for MemoryStore {
    fn verify_credentials(
        &self,
        role: Role,
        identifier: &str,
        credential: &str,
    ) -> Result<Option<Uuid>, DomainError> {
        let found = match role {
            Role::Customer => self
                .customers
                .read()?
                .values()
                .find(|a| a.record.email.eq_ignore_ascii_case(identifier) && a.credential == credential)
                .map(|a| a.record.id),
            Role::Provider => self
                .providers
                .read()?
                .values()
                .find(|a| a.record.email.eq_ignore_ascii_case(identifier) && a.credential == credential)
                .map(|a| a.record.id),
        };
        Ok(found)
    }

    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        Ok(self.customers.read()?.get(&id).map(|a| a.record.clone()))
    }

    fn register_customer(
        &self,
        registration: &CustomerRegistration,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Customer, DomainError> {
        let mut customers = self.customers.write()?;
        if Self::email_taken(&customers, &registration.email, |c| c.email.as_str()) {
            return Err(DomainError::Validation("email already registered".to_string()));
        }
        let customer = Customer {
            id,
            name: registration.name.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            created_at: at,
        };
        customers.insert(
            id,
            Account {
                record: customer.clone(),
                credential: registration.credential.clone(),
            },
        );
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::tests::sample_order;
    use crate::domain::provider::tests::provider;

    const CUSTOMER_ID: Uuid = Uuid::from_u128(0xC0FFEE);

    fn store_with_provider(capacity: i32) -> (MemoryStore, LaundryProvider) {
        let store = MemoryStore::with_default_catalog();
        let p = provider("Lava", capacity, &[1, 2]);
        store.register_provider(&p, "secret").unwrap();
        let registration = CustomerRegistration {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            credential: "pw".to_string(),
            phone: None,
        };
        store.register_customer(&registration, CUSTOMER_ID, Utc::now()).unwrap();
        (store, p)
    }

    fn order_for(p: &LaundryProvider) -> Order {
        let mut order = sample_order(FulfillmentStatus::Pending);
        order.provider_id = p.id;
        order.customer_id = CUSTOMER_ID;
        order
    }

    #[test]
    fn order_for_unknown_customer_is_refused_without_taking_a_slot() {
        let (store, p) = store_with_provider(1);
        let mut orphan = order_for(&p);
        orphan.customer_id = Uuid::new_v4();

        let err = store.insert_admitted(&orphan).unwrap_err();
        assert!(matches!(err, DomainError::CustomerNotFound));
        assert!(store.find_by_id(orphan.id).unwrap().is_none());
        assert!(store.insert_admitted(&order_for(&p)).is_ok());
    }

    #[test]
    fn insert_is_refused_once_capacity_is_reached() {
        let (store, p) = store_with_provider(2);
        store.insert_admitted(&order_for(&p)).unwrap();
        store.insert_admitted(&order_for(&p)).unwrap();
        let err = store.insert_admitted(&order_for(&p)).unwrap_err();
        assert!(matches!(err, DomainError::ProviderAtCapacity));
    }

    #[test]
    fn ready_for_dispatch_frees_a_slot() {
        let (store, p) = store_with_provider(1);
        let first = order_for(&p);
        store.insert_admitted(&first).unwrap();
        store
            .advance_status(first.id, FulfillmentStatus::ReadyForDispatch, Utc::now())
            .unwrap();
        assert!(store.insert_admitted(&order_for(&p)).is_ok());
    }

    #[test]
    fn failed_transition_leaves_status_untouched() {
        let (store, p) = store_with_provider(3);
        let order = order_for(&p);
        store.insert_admitted(&order).unwrap();
        store
            .advance_status(order.id, FulfillmentStatus::Drying, Utc::now())
            .unwrap();
        assert!(store
            .advance_status(order.id, FulfillmentStatus::Washing, Utc::now())
            .is_err());
        let stored = store.find_by_id(order.id).unwrap().unwrap();
        assert_eq!(stored.fulfillment_status, FulfillmentStatus::Drying);
    }

    #[test]
    fn writes_leave_outbox_records() {
        let (store, p) = store_with_provider(3);
        let order = order_for(&p);
        store.insert_admitted(&order).unwrap();
        store
            .advance_status(order.id, FulfillmentStatus::Received, Utc::now())
            .unwrap();
        store
            .advance_status(order.id, FulfillmentStatus::Received, Utc::now())
            .unwrap();
        store
            .set_payment(order.id, PaymentStatus::Completed, Some(PaymentMethod::Card), Utc::now())
            .unwrap();

        let kinds: Vec<_> = store.events_for(order.id).iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec!["OrderCreated", "OrderStatusChanged", "PaymentStatusChanged"]
        );
    }

    #[test]
    fn activation_write_applies_once() {
        let (store, mut p) = store_with_provider(1);
        p.id = Uuid::new_v4();
        p.email = "pending@example.com".to_string();
        p.activation = ActivationState::Pending;
        store.register_provider(&p, "pw").unwrap();

        assert!(store.activate_if_pending(p.id).unwrap());
        assert!(!store.activate_if_pending(p.id).unwrap());
    }

    #[test]
    fn duplicate_provider_email_is_rejected() {
        let (store, p) = store_with_provider(1);
        let mut twin = p.clone();
        twin.id = Uuid::new_v4();
        twin.email = p.email.to_uppercase();
        assert!(matches!(
            store.register_provider(&twin, "x"),
            Err(DomainError::Validation(_))
        ));
    }
}
