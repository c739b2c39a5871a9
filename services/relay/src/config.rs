use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Raised when a session needs the upstream credential and none is configured.
///
/// Deliberately not a startup failure: the relay comes up without a key and
/// reports the problem to each connecting client as a structured error frame.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
#[error("XAI_API_KEY is not set")]
pub struct MissingCredential;

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub upstream_url: String,
    pub xai_api_key: Option<String>,
    pub allowed_origin: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let upstream_url = std::env::var("UPSTREAM_URL")
            .unwrap_or_else(|_| "wss://api.x.ai/v1/realtime".to_string());

        let xai_api_key = std::env::var("XAI_API_KEY").ok();

        let allowed_origin = std::env::var("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3030".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            upstream_url,
            xai_api_key,
            allowed_origin,
            log_level,
        })
    }

    /// Resolves the upstream API credential for a new session.
    pub fn api_key(&self) -> Result<&str, MissingCredential> {
        self.xai_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(MissingCredential)
    }
}
