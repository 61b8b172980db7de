//! Email delivery settings edited from the admin panel.
//!
//! Stored in plaintext under `emailSettings`. `Debug` output redacts the
//! credential fields so they never reach the logs.

use serde::{Deserialize, Serialize};

use binder_core::EmailProvider;

/// How outgoing messages leave the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Log the message and keep it in the local outbox.
    #[default]
    Simulated,
    /// POST the message to the email relay service.
    Relay,
}

/// Gmail credentials (app password, not the account password).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GmailSettings {
    pub user: String,
    pub app_password: String,
}

/// Generic SMTP server credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub secure: bool,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            user: String::new(),
            password: String::new(),
            secure: false,
        }
    }
}

/// `SendGrid` API credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendGridSettings {
    pub api_key: String,
}

/// Notification settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailSettings {
    /// Master switch; disabled settings skip every send.
    pub enabled: bool,
    pub mode: DeliveryMode,
    /// Base URL of the relay service, e.g. `http://localhost:3001`.
    pub relay_url: String,
    pub provider: EmailProvider,
    pub from_name: String,
    pub from_address: String,
    /// Copy of every order confirmation goes here when set.
    pub admin_email: Option<String>,
    pub gmail: GmailSettings,
    pub smtp: SmtpSettings,
    pub sendgrid: SendGridSettings,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: DeliveryMode::Simulated,
            relay_url: "http://localhost:3001".to_owned(),
            provider: EmailProvider::Gmail,
            from_name: "Binder TCG".to_owned(),
            from_address: "orders@binder-tcg.example".to_owned(),
            admin_email: None,
            gmail: GmailSettings::default(),
            smtp: SmtpSettings::default(),
            sendgrid: SendGridSettings::default(),
        }
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "[REDACTED]" }
}

impl std::fmt::Debug for GmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailSettings")
            .field("user", &self.user)
            .field("app_password", &redacted(&self.app_password))
            .finish()
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redacted(&self.password))
            .field("secure", &self.secure)
            .finish()
    }
}

impl std::fmt::Debug for SendGridSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridSettings")
            .field("api_key", &redacted(&self.api_key))
            .finish()
    }
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("enabled", &self.enabled)
            .field("mode", &self.mode)
            .field("relay_url", &self.relay_url)
            .field("provider", &self.provider)
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .field("admin_email", &self.admin_email)
            .field("gmail", &self.gmail)
            .field("smtp", &self.smtp)
            .field("sendgrid", &self.sendgrid)
            .finish()
    }
}
