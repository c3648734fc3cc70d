use thiserror::Error;

use super::order::FulfillmentStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Order not found")]
    OrderNotFound,
    #[error("Laundry provider not found")]
    ProviderNotFound,
    #[error("Customer not found")]
    CustomerNotFound,
    #[error("Service not found")]
    ServiceNotFound,
    #[error("Extra {0} not found")]
    ExtraNotFound(i32),
    #[error("Provider does not offer the requested service")]
    ServiceNotOffered,
    #[error("Provider is not accepting orders")]
    ProviderUnavailable,
    #[error("Provider is at capacity")]
    ProviderAtCapacity,
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account pending verification, retry in {remaining_seconds}s")]
    AccountPendingVerification { remaining_seconds: i64 },
    #[error("Account is inactive")]
    AccountInactive,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl<T> From<std::sync::PoisonError<T>> for DomainError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DomainError::Internal(e.to_string())
    }
}
