use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use super::order::{Order, PaymentMethod, PaymentStatus, StatusChange};

pub const AGGREGATE_TYPE: &str = "Order";

/// Outbox record written alongside the order change it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub id: Uuid,
    pub order_id: Uuid,
    pub event_type: &'static str,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn created(order: &Order) -> Self {
        Self::new(
            order.id,
            "OrderCreated",
            json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "customer_id": order.customer_id,
                "provider_id": order.provider_id,
                "status": order.fulfillment_status.as_str(),
                "total_price": order.total_price.to_string(),
            }),
            order.created_at,
        )
    }

    pub fn status_changed(order_id: Uuid, change: &StatusChange, at: DateTime<Utc>) -> Self {
        Self::new(
            order_id,
            "OrderStatusChanged",
            json!({
                "order_id": order_id,
                "from": change.from.as_str(),
                "to": change.to.as_str(),
            }),
            at,
        )
    }

    pub fn payment_changed(
        order_id: Uuid,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            order_id,
            "PaymentStatusChanged",
            json!({
                "order_id": order_id,
                "payment_status": status.as_str(),
                "payment_method": method.map(|m| m.as_str()),
            }),
            at,
        )
    }

    fn new(order_id: Uuid, event_type: &'static str, payload: Value, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            event_type,
            payload,
            created_at: at,
        }
    }
}
