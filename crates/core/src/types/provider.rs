//! Email provider selector shared by the storefront settings and the relay.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::status::ParseStatusError;

/// Which upstream service delivers email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Gmail over SMTP with an app password.
    #[default]
    Gmail,
    /// Any SMTP server.
    Smtp,
    /// `SendGrid` v3 HTTP API.
    Sendgrid,
}

impl EmailProvider {
    /// Lowercase name as used by `EMAIL_PROVIDER`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Smtp => "smtp",
            Self::Sendgrid => "sendgrid",
        }
    }
}

impl fmt::Display for EmailProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmailProvider {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" => Ok(Self::Gmail),
            "smtp" => Ok(Self::Smtp),
            "sendgrid" => Ok(Self::Sendgrid),
            _ => Err(ParseStatusError::new("email provider", s)),
        }
    }
}
