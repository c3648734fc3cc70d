use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::order::Role;

#[derive(Debug, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CustomerRegistration {
    pub name: String,
    pub email: String,
    pub credential: String,
    pub phone: Option<String>,
}

impl CustomerRegistration {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.credential.is_empty()
        {
            return Err(DomainError::Validation(
                "name, email and credential are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated {
    pub account_id: Uuid,
    pub role: Role,
}
