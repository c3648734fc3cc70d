use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::catalog_service::CatalogService;
use crate::domain::catalog::{Extra, ServiceCatalogEntry};
use crate::domain::coupon::{trim_zeros, CouponResult, Discount};
use crate::domain::ports::Store;
use crate::errors::AppError;

use super::money;

type Catalog = web::Data<CatalogService<dyn Store>>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceResponse {
    pub id: i32,
    pub name: String,
    pub price_per_kg: String,
    pub includes_drying: bool,
    pub includes_ironing: bool,
    pub delivery_hours: i32,
}

impl From<ServiceCatalogEntry> for ServiceResponse {
    fn from(s: ServiceCatalogEntry) -> Self {
        ServiceResponse {
            id: s.id,
            name: s.name,
            price_per_kg: money(&s.price_per_kg),
            includes_drying: s.includes_drying,
            includes_ironing: s.includes_ironing,
            delivery_hours: s.delivery_hours,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtraResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
}

impl From<Extra> for ExtraResponse {
    fn from(e: Extra) -> Self {
        ExtraResponse {
            id: e.id,
            name: e.name,
            description: e.description,
            price: money(&e.price),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponResponse {
    pub valid: bool,
    /// Percentage off the subtotal, e.g. "20"
    pub discount_percentage: Option<String>,
    /// Fixed amount off the total, e.g. "5.00"
    pub discount_amount: Option<String>,
    pub message: String,
}

impl From<CouponResult> for CouponResponse {
    fn from(result: CouponResult) -> Self {
        let (discount_percentage, discount_amount) = match &result.discount {
            Some(Discount::Percentage(p)) => (Some(trim_zeros(p)), None),
            Some(Discount::Fixed(a)) => (None, Some(money(a))),
            None => (None, None),
        };
        CouponResponse {
            valid: result.valid,
            discount_percentage,
            discount_amount,
            message: result.message,
        }
    }
}

/// GET /services
#[utoipa::path(
    get,
    path = "/services",
    responses(
        (status = 200, description = "Service catalog", body = [ServiceResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn list_services(service: Catalog) -> Result<HttpResponse, AppError> {
    let services = web::block(move || service.list_services())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ServiceResponse> = services.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /extras
#[utoipa::path(
    get,
    path = "/extras",
    responses(
        (status = 200, description = "Optional extras", body = [ExtraResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn list_extras(service: Catalog) -> Result<HttpResponse, AppError> {
    let extras = web::block(move || service.list_extras())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ExtraResponse> = extras.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /coupons/validate
///
/// Always answers 200; an unusable code is reported in the body.
#[utoipa::path(
    post,
    path = "/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Validation result", body = CouponResponse),
    ),
    tag = "catalog"
)]
pub async fn validate_coupon(
    service: Catalog,
    body: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let code = body.into_inner().code;

    let result = web::block(move || service.validate_coupon(&code))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(CouponResponse::from(result)))
}
