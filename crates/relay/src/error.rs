//! Relay error responses.
//!
//! Every failure answers `{success: false, error, details?}` so callers can
//! handle the relay uniformly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::mailer::MailerError;

/// Application-level error type for the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// `to`, `subject` or `htmlContent` is absent or blank.
    #[error("Missing required fields: to, subject, htmlContent")]
    MissingFields,

    /// Recipient is not a valid address.
    #[error("Invalid email address")]
    InvalidEmail,

    /// The provider refused or could not be reached.
    #[error("Failed to send email")]
    SendFailed(#[from] MailerError),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Endpoint disabled in this environment.
    #[error("Not found")]
    NotFound,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingFields | Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::SendFailed(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        };

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                details = ?std::error::Error::source(&self).map(ToString::to_string),
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let details = match &self {
            Self::SendFailed(err) => Some(err.to_string()),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_of(err: RelayError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_fields_body() {
        let (status, body) = body_of(RelayError::MissingFields).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields: to, subject, htmlContent");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_send_failure_includes_details() {
        let err = RelayError::SendFailed(MailerError::SendGrid {
            status: 401,
            message: "bad key".to_string(),
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to send email");
        assert_eq!(body["details"], "SendGrid error: 401 - bad key");
    }
}
