use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    Pending,
    Active,
    Inactive,
}

impl ActivationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationState::Pending => "pending",
            ActivationState::Active => "active",
            ActivationState::Inactive => "inactive",
        }
    }
}

impl FromStr for ActivationState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ActivationState::Pending),
            "active" => Ok(ActivationState::Active),
            "inactive" => Ok(ActivationState::Inactive),
            other => Err(DomainError::Validation(format!(
                "unknown activation state '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpeningHours {
    AlwaysOpen,
    Daily {
        opens_at: NaiveTime,
        closes_at: NaiveTime,
    },
}

#[derive(Debug, Clone)]
pub struct LaundryProvider {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub address: String,
    pub capacity: i32,
    pub offered_services: Vec<i32>,
    pub hours: OpeningHours,
    pub activation: ActivationState,
    pub created_at: DateTime<Utc>,
}

impl LaundryProvider {
    pub fn offers(&self, service_id: i32) -> bool {
        self.offered_services.contains(&service_id)
    }

    pub fn is_in_city(&self, city: &str) -> bool {
        self.city.trim().to_lowercase() == city.trim().to_lowercase()
    }
}

/// Input for registering a new provider account.
#[derive(Debug, Clone)]
pub struct ProviderRegistration {
    pub name: String,
    pub email: String,
    pub credential: String,
    pub phone: Option<String>,
    pub city: String,
    pub address: String,
    pub capacity: i32,
    pub offered_services: Vec<i32>,
    pub hours: OpeningHours,
}

impl ProviderRegistration {
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("credential", &self.credential),
            ("city", &self.city),
            ("address", &self.address),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(DomainError::Validation(format!("{} is required", field)));
        }
        if self.capacity < 1 {
            return Err(DomainError::Validation(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.offered_services.is_empty() {
            return Err(DomainError::Validation(
                "at least one offered service is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_provider(self, id: Uuid, created_at: DateTime<Utc>) -> LaundryProvider {
        LaundryProvider {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            city: self.city,
            address: self.address,
            capacity: self.capacity,
            offered_services: self.offered_services,
            hours: self.hours,
            activation: ActivationState::Pending,
            created_at,
        }
    }
}

/// A provider together with its current processing load.
#[derive(Debug, Clone)]
pub struct ProviderLoad {
    pub provider: LaundryProvider,
    pub active_orders: i64,
}

/// Admission control for a single new order.
///
/// Callers must hold the provider's write guard while `load` is counted and
/// the order inserted.
pub fn admit(provider: &LaundryProvider, load: i64, service_id: i32) -> Result<(), DomainError> {
    if provider.activation != ActivationState::Active {
        return Err(DomainError::ProviderUnavailable);
    }
    if !provider.offers(service_id) {
        return Err(DomainError::ServiceNotOffered);
    }
    if load >= i64::from(provider.capacity) {
        return Err(DomainError::ProviderAtCapacity);
    }
    Ok(())
}

/// Providers that can take an order for `service_id` in `city`, least
/// loaded first.
pub fn rank_available(candidates: Vec<ProviderLoad>, city: &str, service_id: i32) -> Vec<ProviderLoad> {
    let mut eligible: Vec<ProviderLoad> = candidates
        .into_iter()
        .filter(|c| c.provider.is_in_city(city))
        .filter(|c| admit(&c.provider, c.active_orders, service_id).is_ok())
        .collect();
    eligible.sort_by(|a, b| {
        a.active_orders
            .cmp(&b.active_orders)
            .then_with(|| a.provider.name.cmp(&b.provider.name))
            .then_with(|| a.provider.id.cmp(&b.provider.id))
    });
    eligible
}
