//! Relay configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Provider
//! - `EMAIL_PROVIDER` - `gmail`, `smtp` or `sendgrid` (default: gmail)
//! - `GMAIL_USER`, `GMAIL_APP_PASSWORD` - required for gmail
//! - `SMTP_HOST`, `SMTP_USER`, `SMTP_PASSWORD` - required for smtp
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_SECURE` - `true` for implicit TLS instead of STARTTLS (default: false)
//! - `SENDGRID_API_KEY` - required for sendgrid
//! - `EMAIL_FROM` - Sender address (default: provider user, `noreply@localhost` for sendgrid)
//! - `EMAIL_FROM_NAME` - Sender display name
//!
//! ## Server
//! - `RELAY_HOST` - Bind address (default: 127.0.0.1)
//! - `RELAY_PORT` - Listen port (default: 3001)
//! - `RELAY_ENV` - `development` enables `/api/test-email` (default: production)
//! - `FRONTEND_URL` - Origin allowed by CORS
//! - `TRUST_PROXY_HEADERS` - Rate limit by `X-Forwarded-For`/`X-Real-IP` instead of the peer address (default: false)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use binder_core::EmailProvider;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnv {
    Development,
    Production,
}

/// Credentials for the configured provider.
///
/// Implements `Debug` manually to redact secrets.
#[derive(Clone)]
pub enum ProviderConfig {
    Gmail {
        user: String,
        app_password: SecretString,
    },
    Smtp {
        host: String,
        port: u16,
        user: String,
        password: SecretString,
        /// Implicit TLS rather than STARTTLS.
        secure: bool,
    },
    SendGrid {
        api_key: SecretString,
    },
}

impl ProviderConfig {
    /// Provider selector for this configuration.
    #[must_use]
    pub const fn provider(&self) -> EmailProvider {
        match self {
            Self::Gmail { .. } => EmailProvider::Gmail,
            Self::Smtp { .. } => EmailProvider::Smtp,
            Self::SendGrid { .. } => EmailProvider::Sendgrid,
        }
    }

    /// Sender used when `EMAIL_FROM` is unset.
    fn default_from(&self) -> String {
        match self {
            Self::Gmail { user, .. } | Self::Smtp { user, .. } => user.clone(),
            Self::SendGrid { .. } => "noreply@localhost".to_string(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gmail { user, .. } => f
                .debug_struct("Gmail")
                .field("user", user)
                .field("app_password", &"[REDACTED]")
                .finish(),
            Self::Smtp {
                host,
                port,
                user,
                secure,
                ..
            } => f
                .debug_struct("Smtp")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"[REDACTED]")
                .field("secure", secure)
                .finish(),
            Self::SendGrid { .. } => f
                .debug_struct("SendGrid")
                .field("api_key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Relay application configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment
    pub environment: RelayEnv,
    /// Provider credentials
    pub provider: ProviderConfig,
    /// Sender address
    pub from_address: String,
    /// Sender display name
    pub from_name: Option<String>,
    /// Origin allowed by CORS
    pub frontend_url: Option<Url>,
    /// Key rate limits on proxy headers rather than the peer address
    pub trust_proxy_headers: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if provider credentials are missing, invalid, or
    /// look like placeholders.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if provider credentials are missing, invalid, or
    /// look like placeholders.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let provider = match env.parse_or::<EmailProvider>("EMAIL_PROVIDER", "gmail")? {
            EmailProvider::Gmail => ProviderConfig::Gmail {
                user: env.get_required("GMAIL_USER")?,
                app_password: env.get_validated_secret("GMAIL_APP_PASSWORD")?,
            },
            EmailProvider::Smtp => ProviderConfig::Smtp {
                host: env.get_required("SMTP_HOST")?,
                port: env.parse_or("SMTP_PORT", "587")?,
                user: env.get_required("SMTP_USER")?,
                password: env.get_validated_secret("SMTP_PASSWORD")?,
                secure: env.parse_or("SMTP_SECURE", "false")?,
            },
            EmailProvider::Sendgrid => ProviderConfig::SendGrid {
                api_key: env.get_validated_secret("SENDGRID_API_KEY")?,
            },
        };

        let environment = match env.get_or_default("RELAY_ENV", "production").as_str() {
            "development" | "dev" => RelayEnv::Development,
            _ => RelayEnv::Production,
        };

        let frontend_url = env
            .get_optional("FRONTEND_URL")
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("FRONTEND_URL".to_string(), e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            host: env.parse_or("RELAY_HOST", "127.0.0.1")?,
            port: env.parse_or("RELAY_PORT", "3001")?,
            environment,
            from_address: env
                .get_optional("EMAIL_FROM")
                .unwrap_or_else(|| provider.default_from()),
            from_name: env.get_optional("EMAIL_FROM_NAME"),
            provider,
            frontend_url,
            trust_proxy_headers: env.parse_or("TRUST_PROXY_HEADERS", "false")?,
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

    /// Whether development-only endpoints are enabled.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment == RelayEnv::Development
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

    /// Get a required variable.
    fn get_required(&self, key: &str) -> Result<String, ConfigError> {
        self.get_optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
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
            .trim()
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

    /// Load a required secret and reject obvious placeholders.
    fn get_validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.get_required(key)?;
        validate_not_placeholder(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Reject values copied verbatim from an example `.env`.
fn validate_not_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}
