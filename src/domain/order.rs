use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

/// Position of an order in the wash → dispatch pipeline.
///
/// Variants are declared in pipeline order; `Cancelled` sits outside the
/// sequence as a terminal sibling of `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Pending,
    Received,
    Washing,
    Drying,
    Ironing,
    ReadyForDispatch,
    Dispatched,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    pub const SEQUENCE: [FulfillmentStatus; 8] = [
        FulfillmentStatus::Pending,
        FulfillmentStatus::Received,
        FulfillmentStatus::Washing,
        FulfillmentStatus::Drying,
        FulfillmentStatus::Ironing,
        FulfillmentStatus::ReadyForDispatch,
        FulfillmentStatus::Dispatched,
        FulfillmentStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Received => "received",
            FulfillmentStatus::Washing => "washing",
            FulfillmentStatus::Drying => "drying",
            FulfillmentStatus::Ironing => "ironing",
            FulfillmentStatus::ReadyForDispatch => "ready_for_dispatch",
            FulfillmentStatus::Dispatched => "dispatched",
            FulfillmentStatus::Delivered => "delivered",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }

    /// Index in the pipeline; `None` for `Cancelled`.
    pub fn sequence_index(&self) -> Option<usize> {
        Self::SEQUENCE.iter().position(|s| s == self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Delivered | FulfillmentStatus::Cancelled
        )
    }

    /// Whether an order in this state occupies one of the provider's
    /// processing slots. Ready-for-dispatch orders no longer do.
    pub fn occupies_capacity(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Pending
                | FulfillmentStatus::Received
                | FulfillmentStatus::Washing
                | FulfillmentStatus::Drying
                | FulfillmentStatus::Ironing
        )
    }

    pub fn load_states() -> impl Iterator<Item = FulfillmentStatus> {
        Self::SEQUENCE.into_iter().filter(|s| s.occupies_capacity())
    }

    /// Check a move from `self` to `target`.
    ///
    /// Equal states are accepted as a no-op. Moving backwards, or out of a
    /// terminal state, is rejected.
    pub fn transition_to(self, target: FulfillmentStatus) -> Result<StatusChange, DomainError> {
        if self == target {
            return Ok(StatusChange {
                from: self,
                to: target,
                changed: false,
            });
        }
        let invalid = DomainError::InvalidTransition {
            from: self,
            to: target,
        };
        if self.is_terminal() {
            return Err(invalid);
        }
        let forward = match (self.sequence_index(), target.sequence_index()) {
            (_, None) => true,
            (Some(current), Some(next)) => next > current,
            (None, Some(_)) => false,
        };
        if !forward {
            return Err(invalid);
        }
        Ok(StatusChange {
            from: self,
            to: target,
            changed: true,
        })
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SEQUENCE
            .into_iter()
            .chain(std::iter::once(FulfillmentStatus::Cancelled))
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown order status '{}'", s)))
    }
}

/// Outcome of an accepted status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: FulfillmentStatus,
    pub to: FulfillmentStatus,
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::Validation(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(DomainError::Validation(format!(
                "unknown payment method '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Clean laundry is brought back to the customer.
    Home,
    /// Customer collects the clean laundry at the provider.
    Pickup,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Home => "home",
            DeliveryMethod::Pickup => "pickup",
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(DeliveryMethod::Home),
            "pickup" => Ok(DeliveryMethod::Pickup),
            other => Err(DomainError::Validation(format!(
                "unknown delivery method '{}'",
                other
            ))),
        }
    }
}

/// Who is looking at an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    #[serde(alias = "laundry")]
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupDetails {
    pub address: String,
    pub neighbourhood: Option<String>,
    pub references: Option<String>,
    pub time_window: Option<String>,
}

/// Catalog extra as priced when the order was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExtra {
    pub extra_id: i32,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct Order {
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
    pub fulfillment_status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_method: DeliveryMethod,
    pub pickup: PickupDetails,
    pub extras: Vec<OrderExtra>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn total_discount(&self) -> BigDecimal {
        &self.pickup_discount + &self.coupon_discount
    }

    /// Delivered and paid. Everything else is still active.
    pub fn is_historical(&self) -> bool {
        self.fulfillment_status == FulfillmentStatus::Delivered
            && self.payment_status == PaymentStatus::Completed
    }

    /// Delivered cash orders the provider has not yet marked as paid.
    pub fn awaiting_cash_collection(&self) -> bool {
        self.payment_method == Some(PaymentMethod::Cash)
            && self.fulfillment_status == FulfillmentStatus::Delivered
            && self.payment_status != PaymentStatus::Completed
    }
}

/// The other party on an order, as seen by the viewer's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Counterparty {
    Provider { name: String },
    Customer { name: String, phone: Option<String> },
}

#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order: Order,
    pub service_name: String,
    pub delivery_hours: i32,
    pub counterparty: Counterparty,
}

#[derive(Debug, Clone, Default)]
pub struct OrderListing {
    pub active: Vec<OrderSummary>,
    pub historical: Vec<OrderSummary>,
}

impl OrderListing {
    pub fn partition(summaries: Vec<OrderSummary>) -> Self {
        let (historical, active): (Vec<_>, Vec<_>) = summaries
            .into_iter()
            .partition(|summary| summary.order.is_historical());
        Self { active, historical }
    }
}

/// Read-time projection over a provider's orders.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDashboard {
    pub pending: usize,
    pub in_process: usize,
    pub ready_for_dispatch: usize,
    pub awaiting_cash_collection: usize,
    pub revenue: BigDecimal,
}

impl ProviderDashboard {
    /// Revenue counts paid orders created on `day` (UTC).
    pub fn summarize<'a>(orders: impl IntoIterator<Item = &'a Order>, day: NaiveDate) -> Self {
        let mut dashboard = ProviderDashboard {
            pending: 0,
            in_process: 0,
            ready_for_dispatch: 0,
            awaiting_cash_collection: 0,
            revenue: BigDecimal::from(0),
        };
        for order in orders {
            match order.fulfillment_status {
                FulfillmentStatus::Pending => dashboard.pending += 1,
                FulfillmentStatus::Washing
                | FulfillmentStatus::Drying
                | FulfillmentStatus::Ironing => dashboard.in_process += 1,
                FulfillmentStatus::ReadyForDispatch => dashboard.ready_for_dispatch += 1,
                _ => {}
            }
            if order.awaiting_cash_collection() {
                dashboard.awaiting_cash_collection += 1;
            }
            if order.payment_status == PaymentStatus::Completed
                && order.created_at.date_naive() == day
            {
                dashboard.revenue += &order.total_price;
            }
        }
        dashboard
    }
}
