use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::domain::account::CustomerRegistration;
use crate::domain::order::Role;
use crate::domain::ports::Store;
use crate::errors::AppError;

type Auth = web::Data<AuthService<dyn Store>>;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Account email
    pub identifier: String,
    pub credential: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub account_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterCustomerRequest {
    pub name: String,
    pub email: String,
    pub credential: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: String,
}

/// POST /auth/login
///
/// Provider accounts are refused with 403 until their verification window
/// has passed; the body then carries `remaining_seconds`.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Wrong identifier or credential"),
        (status = 403, description = "Account pending verification or inactive"),
    ),
    tag = "accounts"
)]
pub async fn login(service: Auth, body: web::Json<LoginRequest>) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let authenticated = web::block(move || {
        service.authenticate(&body.identifier, &body.credential, body.role)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(LoginResponse {
        account_id: authenticated.account_id,
        role: authenticated.role,
    }))
}

/// POST /customers
#[utoipa::path(
    post,
    path = "/customers",
    request_body = RegisterCustomerRequest,
    responses(
        (status = 201, description = "Customer registered", body = CustomerResponse),
        (status = 400, description = "Missing fields or email taken"),
    ),
    tag = "accounts"
)]
pub async fn register_customer(
    service: Auth,
    body: web::Json<RegisterCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let registration = CustomerRegistration {
        name: body.name,
        email: body.email,
        credential: body.credential,
        phone: body.phone,
    };

    let customer = web::block(move || service.register_customer(registration))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CustomerResponse {
        id: customer.id,
        name: customer.name,
        email: customer.email,
        phone: customer.phone,
        created_at: customer.created_at.to_rfc3339(),
    }))
}
