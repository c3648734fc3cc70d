use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::application::provider_service::ProviderService;
use crate::domain::ports::Store;
use crate::domain::provider::{
    ActivationState, LaundryProvider, OpeningHours, ProviderLoad, ProviderRegistration,
};
use crate::errors::AppError;

use super::money;

type Providers = web::Data<ProviderService<dyn Store>>;
type Orders = web::Data<OrderService<dyn Store>>;

const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailableParams {
    pub city: String,
    pub service_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub address: String,
    pub capacity: i32,
    pub offered_services: Vec<i32>,
    pub is_24h: bool,
    /// `HH:MM`, absent for 24h providers
    pub opens_at: Option<String>,
    pub closes_at: Option<String>,
    pub activation_state: ActivationState,
}

impl From<&LaundryProvider> for ProviderResponse {
    fn from(p: &LaundryProvider) -> Self {
        let (is_24h, opens_at, closes_at) = match p.hours {
            OpeningHours::AlwaysOpen => (true, None, None),
            OpeningHours::Daily { opens_at, closes_at } => (
                false,
                Some(opens_at.format(TIME_FORMAT).to_string()),
                Some(closes_at.format(TIME_FORMAT).to_string()),
            ),
        };
        ProviderResponse {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            city: p.city.clone(),
            address: p.address.clone(),
            capacity: p.capacity,
            offered_services: p.offered_services.clone(),
            is_24h,
            opens_at,
            closes_at,
            activation_state: p.activation,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableProviderResponse {
    #[serde(flatten)]
    pub provider: ProviderResponse,
    pub active_orders: i64,
}

impl From<&ProviderLoad> for AvailableProviderResponse {
    fn from(load: &ProviderLoad) -> Self {
        AvailableProviderResponse {
            provider: ProviderResponse::from(&load.provider),
            active_orders: load.active_orders,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterProviderRequest {
    pub name: String,
    pub email: String,
    pub credential: String,
    pub phone: Option<String>,
    pub city: String,
    pub address: String,
    pub capacity: i32,
    pub offered_services: Vec<i32>,
    #[serde(default)]
    pub is_24h: bool,
    /// `HH:MM`, required unless `is_24h`
    pub opens_at: Option<String>,
    pub closes_at: Option<String>,
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| AppError::BadRequest(format!("{} must be HH:MM, got '{}'", field, raw)))
}

impl RegisterProviderRequest {
    fn into_registration(self) -> Result<ProviderRegistration, AppError> {
        let hours = if self.is_24h {
            OpeningHours::AlwaysOpen
        } else {
            match (self.opens_at.as_deref(), self.closes_at.as_deref()) {
                (Some(opens), Some(closes)) => OpeningHours::Daily {
                    opens_at: parse_time("opens_at", opens)?,
                    closes_at: parse_time("closes_at", closes)?,
                },
                _ => {
                    return Err(AppError::BadRequest(
                        "opens_at and closes_at are required unless is_24h".to_string(),
                    ))
                }
            }
        };
        Ok(ProviderRegistration {
            name: self.name,
            email: self.email,
            credential: self.credential,
            phone: self.phone,
            city: self.city,
            address: self.address,
            capacity: self.capacity,
            offered_services: self.offered_services,
            hours,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DashboardParams {
    /// UTC day, `YYYY-MM-DD`. Defaults to today.
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub provider_id: Uuid,
    pub day: Option<NaiveDate>,
    pub pending: usize,
    pub in_process: usize,
    pub ready_for_dispatch: usize,
    pub awaiting_cash_collection: usize,
    /// Paid orders created on the day
    pub revenue: String,
}

/// GET /providers/available
///
/// Active providers in the city that offer the service and have a free
/// slot, least loaded first. Advisory: nothing is reserved.
#[utoipa::path(
    get,
    path = "/providers/available",
    params(
        ("city" = String, Query, description = "City, matched case-insensitively"),
        ("service_id" = i32, Query, description = "Catalog service id"),
    ),
    responses(
        (status = 200, description = "Ranked providers", body = [AvailableProviderResponse]),
        (status = 400, description = "Missing city"),
    ),
    tag = "providers"
)]
pub async fn list_available(
    service: Providers,
    query: web::Query<AvailableParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();

    let ranked = web::block(move || service.list_available(&params.city, params.service_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<AvailableProviderResponse> = ranked.iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /providers
///
/// Registers a provider account. It stays pending until the verification
/// window has passed.
#[utoipa::path(
    post,
    path = "/providers",
    request_body = RegisterProviderRequest,
    responses(
        (status = 201, description = "Provider registered", body = ProviderResponse),
        (status = 400, description = "Invalid registration or email taken"),
        (status = 404, description = "Unknown offered service"),
    ),
    tag = "providers"
)]
pub async fn register_provider(
    service: Providers,
    body: web::Json<RegisterProviderRequest>,
) -> Result<HttpResponse, AppError> {
    let registration = body.into_inner().into_registration()?;

    let provider = web::block(move || service.register(registration))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProviderResponse::from(&provider)))
}

/// POST /providers/{id}/deactivate
#[utoipa::path(
    post,
    path = "/providers/{id}/deactivate",
    params(
        ("id" = Uuid, Path, description = "Provider UUID"),
    ),
    responses(
        (status = 204, description = "Provider deactivated"),
        (status = 404, description = "Provider not found"),
    ),
    tag = "providers"
)]
pub async fn deactivate_provider(
    service: Providers,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let provider_id = path.into_inner();

    web::block(move || service.deactivate(provider_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /providers/{id}/dashboard
#[utoipa::path(
    get,
    path = "/providers/{id}/dashboard",
    params(
        ("id" = Uuid, Path, description = "Provider UUID"),
        ("day" = Option<NaiveDate>, Query, description = "UTC day, defaults to today"),
    ),
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardResponse),
        (status = 404, description = "Provider not found"),
    ),
    tag = "providers"
)]
pub async fn dashboard(
    service: Orders,
    path: web::Path<Uuid>,
    query: web::Query<DashboardParams>,
) -> Result<HttpResponse, AppError> {
    let provider_id = path.into_inner();
    let day = query.into_inner().day;

    let board = web::block(move || service.dashboard(provider_id, day))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        provider_id,
        day,
        pending: board.pending,
        in_process: board.in_process,
        ready_for_dispatch: board.ready_for_dispatch,
        awaiting_cash_collection: board.awaiting_cash_collection,
        revenue: money(&board.revenue),
    }))
}
