//! Environment configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `FOOTPRINT_PORT` | `3000` |
//! | `FOOTPRINT_SERVICE_URL` | `http://localhost:8080` |
//! | `FOOTPRINT_USER_ID` | `user-001` |
//!
//! Log filtering follows `RUST_LOG`.

use std::env;

use crate::service::DEFAULT_SERVICE_URL;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// User the session starts with.
pub const DEFAULT_USER_ID: &str = "user-001";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("FOOTPRINT_PORT must be a port number, got '{0}'")]
    InvalidPort(String),

    #[error("FOOTPRINT_USER_ID must not be empty")]
    EmptyUserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub service_url: String,
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("FOOTPRINT_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let service_url = lookup("FOOTPRINT_SERVICE_URL").unwrap_or(defaults.service_url);

        let user_id = match lookup("FOOTPRINT_USER_ID") {
            Some(id) if id.trim().is_empty() => return Err(ConfigError::EmptyUserId),
            Some(id) => id,
            None => defaults.user_id,
        };

        Ok(Self {
            port,
            service_url,
            user_id,
        })
    }
}
