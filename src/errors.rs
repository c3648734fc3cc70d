use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Forbidden {
        message: String,
        remaining_seconds: Option<i64>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        match e {
            DomainError::Validation(_) | DomainError::ServiceNotOffered => AppError::BadRequest(message),
            DomainError::OrderNotFound
            | DomainError::ProviderNotFound
            | DomainError::CustomerNotFound
            | DomainError::ServiceNotFound
            | DomainError::ExtraNotFound(_) => AppError::NotFound(message),
            DomainError::ProviderAtCapacity
            | DomainError::ProviderUnavailable
            | DomainError::InvalidTransition { .. } => AppError::Conflict(message),
            DomainError::InvalidCredentials => AppError::Unauthorized(message),
            DomainError::AccountPendingVerification { remaining_seconds } => AppError::Forbidden {
                message,
                remaining_seconds: Some(remaining_seconds),
            },
            DomainError::AccountInactive => AppError::Forbidden {
                message,
                remaining_seconds: None,
            },
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Forbidden {
                remaining_seconds: Some(remaining),
                ..
            } => json!({ "error": self.to_string(), "remaining_seconds": remaining }),
            AppError::Internal(_) => json!({ "error": "Internal server error" }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
