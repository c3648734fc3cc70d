use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::account::Customer;
use crate::domain::catalog::{Extra, ServiceCatalogEntry};
use crate::domain::coupon::Coupon;
use crate::domain::errors::DomainError;
use crate::domain::events::{OrderEvent, AGGREGATE_TYPE};
use crate::domain::order::{Order, OrderExtra, PickupDetails};
use crate::domain::provider::{LaundryProvider, OpeningHours};
use crate::schema::{
    coupons, customers, extras, laundry_providers, order_events, order_extras, orders,
    service_catalog,
};

/// Parse an enum column. A value that does not parse is corrupt data, not
/// bad user input.
fn parse_column<T: FromStr<Err = DomainError>>(value: &str) -> Result<T, DomainError> {
    value
        .parse()
        .map_err(|e: DomainError| DomainError::Internal(format!("stored value: {}", e)))
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = service_catalog)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceRow {
    pub id: i32,
    pub name: String,
    pub price_per_kg: BigDecimal,
    pub includes_drying: bool,
    pub includes_ironing: bool,
    pub delivery_hours: i32,
}

impl From<ServiceRow> for ServiceCatalogEntry {
    fn from(row: ServiceRow) -> Self {
        ServiceCatalogEntry {
            id: row.id,
            name: row.name,
            price_per_kg: row.price_per_kg,
            includes_drying: row.includes_drying,
            includes_ironing: row.includes_ironing,
            delivery_hours: row.delivery_hours,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = extras)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExtraRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

impl From<ExtraRow> for Extra {
    fn from(row: ExtraRow) -> Self {
        Extra {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CouponRow {
    pub code: String,
    pub percentage: Option<BigDecimal>,
    pub fixed_amount: Option<BigDecimal>,
    pub active: bool,
    pub valid_to: Option<DateTime<Utc>>,
}

impl CouponRow {
    pub fn into_domain(self) -> Result<Coupon, DomainError> {
        Coupon::from_parts(
            &self.code,
            self.percentage,
            self.fixed_amount,
            self.active,
            self.valid_to,
        )
        .map_err(|e| DomainError::Internal(e.to_string()))
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub credential: &'a str,
    pub phone: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = laundry_providers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProviderRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub address: String,
    pub capacity: i32,
    pub offered_services: Vec<i32>,
    pub is_24h: bool,
    pub opens_at: Option<NaiveTime>,
    pub closes_at: Option<NaiveTime>,
    pub activation_state: String,
    pub created_at: DateTime<Utc>,
}

impl ProviderRow {
    pub fn into_domain(self) -> Result<LaundryProvider, DomainError> {
        let hours = match (self.is_24h, self.opens_at, self.closes_at) {
            (true, _, _) => OpeningHours::AlwaysOpen,
            (false, Some(opens_at), Some(closes_at)) => OpeningHours::Daily { opens_at, closes_at },
            (false, _, _) => {
                return Err(DomainError::Internal(format!(
                    "provider {} has no opening hours",
                    self.id
                )))
            }
        };
        Ok(LaundryProvider {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            city: self.city,
            address: self.address,
            capacity: self.capacity,
            offered_services: self.offered_services,
            hours,
            activation: parse_column(&self.activation_state)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = laundry_providers)]
pub struct NewProviderRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub credential: &'a str,
    pub phone: Option<&'a str>,
    pub city: &'a str,
    pub address: &'a str,
    pub capacity: i32,
    pub offered_services: &'a [i32],
    pub is_24h: bool,
    pub opens_at: Option<NaiveTime>,
    pub closes_at: Option<NaiveTime>,
    pub activation_state: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewProviderRow<'a> {
    pub fn new(provider: &'a LaundryProvider, credential: &'a str) -> Self {
        let (is_24h, opens_at, closes_at) = match provider.hours {
            OpeningHours::AlwaysOpen => (true, None, None),
            OpeningHours::Daily { opens_at, closes_at } => (false, Some(opens_at), Some(closes_at)),
        };
        Self {
            id: provider.id,
            name: &provider.name,
            email: &provider.email,
            credential,
            phone: provider.phone.as_deref(),
            city: &provider.city,
            address: &provider.address,
            capacity: provider.capacity,
            offered_services: &provider.offered_services,
            is_24h,
            opens_at,
            closes_at,
            activation_state: provider.activation.as_str(),
            created_at: provider.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: i32,
    pub weight_kg: BigDecimal,
    pub base_price: BigDecimal,
    pub extras_price: BigDecimal,
    pub pickup_discount: BigDecimal,
    pub coupon_discount: BigDecimal,
    pub discount_code: Option<String>,
    pub total_price: BigDecimal,
    pub fulfillment_status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub delivery_method: String,
    pub pickup_address: String,
    pub pickup_neighbourhood: Option<String>,
    pub pickup_references: Option<String>,
    pub pickup_time_window: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_domain(self, extras: Vec<OrderExtraRow>) -> Result<Order, DomainError> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            provider_id: self.provider_id,
            service_id: self.service_id,
            weight_kg: self.weight_kg,
            base_price: self.base_price,
            extras_price: self.extras_price,
            pickup_discount: self.pickup_discount,
            coupon_discount: self.coupon_discount,
            discount_code: self.discount_code,
            total_price: self.total_price,
            fulfillment_status: parse_column(&self.fulfillment_status)?,
            payment_status: parse_column(&self.payment_status)?,
            payment_method: self
                .payment_method
                .as_deref()
                .map(parse_column)
                .transpose()?,
            delivery_method: parse_column(&self.delivery_method)?,
            pickup: PickupDetails {
                address: self.pickup_address,
                neighbourhood: self.pickup_neighbourhood,
                references: self.pickup_references,
                time_window: self.pickup_time_window,
            },
            extras: extras
                .into_iter()
                .map(|e| OrderExtra {
                    extra_id: e.extra_id,
                    name: e.name,
                    price: e.price,
                })
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub id: Uuid,
    pub order_number: &'a str,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: i32,
    pub weight_kg: &'a BigDecimal,
    pub base_price: &'a BigDecimal,
    pub extras_price: &'a BigDecimal,
    pub pickup_discount: &'a BigDecimal,
    pub coupon_discount: &'a BigDecimal,
    pub discount_code: Option<&'a str>,
    pub total_price: &'a BigDecimal,
    pub fulfillment_status: &'a str,
    pub payment_status: &'a str,
    pub payment_method: Option<&'a str>,
    pub delivery_method: &'a str,
    pub pickup_address: &'a str,
    pub pickup_neighbourhood: Option<&'a str>,
    pub pickup_references: Option<&'a str>,
    pub pickup_time_window: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Order> for NewOrderRow<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            id: order.id,
            order_number: &order.order_number,
            customer_id: order.customer_id,
            provider_id: order.provider_id,
            service_id: order.service_id,
            weight_kg: &order.weight_kg,
            base_price: &order.base_price,
            extras_price: &order.extras_price,
            pickup_discount: &order.pickup_discount,
            coupon_discount: &order.coupon_discount,
            discount_code: order.discount_code.as_deref(),
            total_price: &order.total_price,
            fulfillment_status: order.fulfillment_status.as_str(),
            payment_status: order.payment_status.as_str(),
            payment_method: order.payment_method.map(|m| m.as_str()),
            delivery_method: order.delivery_method.as_str(),
            pickup_address: &order.pickup.address,
            pickup_neighbourhood: order.pickup.neighbourhood.as_deref(),
            pickup_references: order.pickup.references.as_deref(),
            pickup_time_window: order.pickup.time_window.as_deref(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_extras)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderExtraRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub extra_id: i32,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_extras)]
pub struct NewOrderExtraRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub extra_id: i32,
    pub name: &'a str,
    pub price: &'a BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_events)]
pub struct NewOrderEventRow<'a> {
    pub id: Uuid,
    pub aggregate_type: &'a str,
    pub aggregate_id: Uuid,
    pub event_type: &'a str,
    pub payload: &'a Value,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a OrderEvent> for NewOrderEventRow<'a> {
    fn from(event: &'a OrderEvent) -> Self {
        Self {
            id: event.id,
            aggregate_type: AGGREGATE_TYPE,
            aggregate_id: event.order_id,
            event_type: event.event_type,
            payload: &event.payload,
            created_at: event.created_at,
        }
    }
}
