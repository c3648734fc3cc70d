pub mod account_repo;
pub mod catalog_repo;
pub mod memory;
pub mod models;
pub mod order_repo;
pub mod provider_repo;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;

use crate::db::DbPool;
use crate::domain::errors::DomainError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        log::error!("Database error: {}", e);
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        log::error!("Connection pool error: {}", e);
        DomainError::Internal(e.to_string())
    }
}

diesel::define_sql_function!(fn lower(x: Text) -> Text);

/// Map a unique-index violation on an account email to a validation error.
fn email_conflict(e: DieselError) -> DomainError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DomainError::Validation("email already registered".to_string())
        }
        other => other.into(),
    }
}

/// Map the order's customer foreign key violation to a missing customer.
fn unknown_customer(e: DieselError) -> DomainError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info)
            if info
                .constraint_name()
                .is_some_and(|name| name.contains("customer")) =>
        {
            DomainError::CustomerNotFound
        }
        other => other.into(),
    }
}

/// Postgres-backed implementation of every storage port.
#[derive(Clone)]
pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}
