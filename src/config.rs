use std::env;

use thiserror::Error;

use crate::domain::activation::{DEFAULT_ACTIVATION_WINDOW_SECS, MAX_ACTIVATION_WINDOW_SECS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    /// Only required for `StorageBackend::Postgres`.
    pub database_url: Option<String>,
    pub activation_window_secs: i64,
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env` has
    /// been loaded by the caller).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let storage = get("STORAGE").map(|s| s.trim().to_ascii_lowercase());
        let storage = match storage.as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE",
                    value: other.to_string(),
                })
            }
        };

        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let activation_window_secs = match get("ACTIVATION_WINDOW_SECS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(secs) if (0..=MAX_ACTIVATION_WINDOW_SECS).contains(&secs) => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ACTIVATION_WINDOW_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_ACTIVATION_WINDOW_SECS,
        };

        Ok(Self {
            host,
            port,
            storage,
            database_url,
            activation_window_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/laundry")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.storage, StorageBackend::Postgres);
        assert_eq!(cfg.activation_window_secs, 60);
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn memory_storage_needs_no_database() {
        let cfg = config(&[("STORAGE", "Memory"), ("PORT", "9000")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert_eq!(cfg.port, 9000);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let err = config(&[("STORAGE", "memory"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value 'eighty'");

        let err = config(&[("STORAGE", "memory"), ("ACTIVATION_WINDOW_SECS", "-5")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ACTIVATION_WINDOW_SECS", .. }));

        let err = config(&[("STORAGE", "memory"), ("ACTIVATION_WINDOW_SECS", "9223372036854775807")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ACTIVATION_WINDOW_SECS", .. }));

        let cfg = config(&[("STORAGE", "memory"), ("ACTIVATION_WINDOW_SECS", "2592000")]).unwrap();
        assert_eq!(cfg.activation_window_secs, MAX_ACTIVATION_WINDOW_SECS);

        let err = config(&[("STORAGE", "redis")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "STORAGE", .. }));
    }
}
