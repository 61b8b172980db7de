//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATA_DIR` - Directory holding one JSON file per storage key (default: ./data)
//! - `STORE_NAME` - Shop name used in emails (default: Binder TCG)
//! - `RELAY_URL` - Email relay base URL; when set, emails go through the relay
//!   regardless of the stored delivery mode
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0-1.0 (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory for persisted state
    pub data_dir: PathBuf,
    /// Shop name shown in emails
    pub store_name: String,
    /// Relay base URL overriding the stored delivery mode
    pub relay_url: Option<Url>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parse_or("STOREFRONT_PORT", "3000")?;
        let data_dir = PathBuf::from(env.get_or_default("STOREFRONT_DATA_DIR", "./data"));
        let store_name = env.get_or_default("STORE_NAME", "Binder TCG");
        let relay_url = env
            .get_optional("RELAY_URL")
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("RELAY_URL".to_string(), e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            data_dir,
            store_name,
            relay_url,
            sentry_dsn: env.get_optional("SENTRY_DSN"),
            sentry_environment: env.get_optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.sample_rate("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.sample_rate("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank counts as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a rate between 0.0 and 1.0.
    fn sample_rate(&self, key: &str, default: &str) -> Result<f32, ConfigError> {
        let rate: f32 = self.parse_or(key, default)?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(rate)
    }
}
