//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub cors_origins: Vec<String>,
    pub system_api_key: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Token Settings ---
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        let jwt_expiry_hours = match std::env::var("JWT_EXPIRY_HOURS") {
            Ok(raw) => raw.parse::<i64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "JWT_EXPIRY_HOURS".to_string(),
                    format!("'{raw}' is not a number of hours"),
                )
            })?,
            Err(_) => 24,
        };

        // --- Identity Provider (optional; Google login is disabled without it) ---
        let google_client_id = std::env::var("GOOGLE_CLIENT_ID").ok();
        let google_client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok();
        let google_redirect_uri = std::env::var("GOOGLE_REDIRECT_URI").ok();

        // --- CORS allow-list ---
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| parse_origin_list(&raw))
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        // --- Capability key for the system notification endpoint ---
        let system_api_key = std::env::var("SYSTEM_API_KEY").ok();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            jwt_expiry_hours,
            google_client_id,
            google_client_secret,
            google_redirect_uri,
            cors_origins,
            system_api_key,
        })
    }
}

/// Splits the comma-separated `CORS_ORIGINS` value, dropping empty entries.
fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_origin_list;

    #[test]
    fn origin_list_splits_and_trims() {
        let origins = parse_origin_list("http://localhost:5173, https://near-serve.example ,");
        assert_eq!(
            origins,
            vec![
                "http://localhost:5173".to_string(),
                "https://near-serve.example".to_string()
            ]
        );
    }

    #[test]
    fn empty_origin_list_is_empty() {
        assert!(parse_origin_list("").is_empty());
    }
}
