//! HTTP route handlers for the relay.
//!
//! # Route Structure
//!
//! ```text
//! POST /api/send-email  - Forward {to, subject, htmlContent, textContent?}
//! GET  /api/health      - Liveness and configured provider
//! POST /api/test-email  - Send a canned message {to} (development only)
//! ```

use askama::Template;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use binder_core::Email;

use crate::error::{RelayError, Result};
use crate::mailer::{Mailer, OutgoingEmail};
use crate::state::AppState;

/// HTML body of the test message.
#[derive(Template)]
#[template(path = "email/test_email.html")]
struct TestEmailHtml<'a> {
    provider: &'a str,
    from: &'a str,
    sent_at: &'a str,
}

/// Plain text body of the test message.
#[derive(Template)]
#[template(path = "email/test_email.txt")]
struct TestEmailText<'a> {
    provider: &'a str,
    from: &'a str,
    sent_at: &'a str,
}

/// Send request body. Fields are optional so absence is reported in the
/// relay's own error format.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html_content: Option<String>,
    pub text_content: Option<String>,
}

/// Successful send.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub message_id: String,
}

/// Health check body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub email_provider: String,
}

/// Test send body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestEmailRequest {
    pub to: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SendEmailRequest {
    /// Check required fields and the recipient address.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::MissingFields` or `RelayError::InvalidEmail`.
    pub fn validate(self) -> Result<OutgoingEmail> {
        let (Some(to), Some(subject), Some(html)) = (
            required(self.to),
            required(self.subject),
            required(self.html_content),
        ) else {
            return Err(RelayError::MissingFields);
        };
        let to = Email::parse(&to).map_err(|_| RelayError::InvalidEmail)?;
        Ok(OutgoingEmail {
            to,
            subject,
            html,
            text: required(self.text_content),
        })
    }
}

/// Create the `/api` routes.
pub fn routes<M: Mailer>() -> Router<AppState<M>> {
    Router::new()
        .route("/send-email", post(send_email::<M>))
        .route("/health", get(health::<M>))
        .route("/test-email", post(test_email::<M>))
}

/// Forward a message to the configured provider.
#[instrument(skip_all)]
pub async fn send_email<M: Mailer>(
    State(state): State<AppState<M>>,
    payload: std::result::Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable send-email body");
            return Err(RelayError::MissingFields);
        }
    };
    let email = request.validate()?;
    let message_id = state.mailer().send(&email).await?;

    tracing::info!(message_id = %message_id, "Email relayed");
    Ok(Json(SendEmailResponse {
        success: true,
        message_id,
    }))
}

/// Liveness check reporting the configured provider.
pub async fn health<M: Mailer>(State(state): State<AppState<M>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        email_provider: state.mailer().provider().to_string(),
    })
}

/// Send a canned message. Only available when `RELAY_ENV=development`.
#[instrument(skip_all)]
pub async fn test_email<M: Mailer>(
    State(state): State<AppState<M>>,
    payload: std::result::Result<Json<TestEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>> {
    if !state.config().is_development() {
        return Err(RelayError::NotFound);
    }

    let to = payload
        .ok()
        .and_then(|Json(body)| required(body.to))
        .ok_or(RelayError::InvalidEmail)?;
    let to = Email::parse(&to).map_err(|_| RelayError::InvalidEmail)?;

    let provider = state.mailer().provider().to_string();
    let from = state.config().from_address.as_str();
    let sent_at = Utc::now().to_rfc2822();
    let html = TestEmailHtml {
        provider: &provider,
        from,
        sent_at: &sent_at,
    }
    .render()?;
    let text = TestEmailText {
        provider: &provider,
        from,
        sent_at: &sent_at,
    }
    .render()?;

    let message_id = state
        .mailer()
        .send(&OutgoingEmail {
            to,
            subject: "Binder TCG email relay test".to_string(),
            html,
            text: Some(text),
        })
        .await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message_id,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use binder_core::EmailProvider;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::RelayConfig;
    use crate::mailer::MailerError;

    #[derive(Clone, Default)]
    pub(crate) struct RecordingMailer {
        pub(crate) sent: Arc<Mutex<Vec<OutgoingEmail>>>,
        pub(crate) fail: bool,
    }

    impl Mailer for RecordingMailer {
        fn provider(&self) -> EmailProvider {
            EmailProvider::Smtp
        }

        async fn send(&self, email: &OutgoingEmail) -> std::result::Result<String, MailerError> {
            if self.fail {
                return Err(MailerError::SendGrid {
                    status: 503,
                    message: "upstream down".to_string(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok("msg-1".to_string())
        }
    }

    pub(crate) fn config_with(vars: &[(&str, &str)]) -> RelayConfig {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayConfig::from_lookup(move |key| match key {
            "EMAIL_PROVIDER" => Some("sendgrid".to_string()),
            "SENDGRID_API_KEY" => Some("SG.a8f3k2m9q1".to_string()),
            _ => vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()),
        })
        .unwrap()
    }

    fn config(env: &str) -> RelayConfig {
        config_with(&[("RELAY_ENV", env)])
    }

    fn app(mailer: RecordingMailer, env: &str) -> Router {
        Router::new()
            .nest("/api", routes())
            .with_state(AppState::new(config(env), mailer))
    }

    async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_send_email_success() {
        let mailer = RecordingMailer::default();
        let (status, body) = post(
            app(mailer.clone(), "production"),
            "/api/send-email",
            json!({"to": "misty@cerulean.gym", "subject": "Hi", "htmlContent": "<p>Hi</p>"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "messageId": "msg-1"}));
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to.as_str(), "misty@cerulean.gym");
        assert!(sent[0].text.is_none());
    }

    #[tokio::test]
    async fn test_send_email_missing_to() {
        let (status, body) = post(
            app(RecordingMailer::default(), "production"),
            "/api/send-email",
            json!({"subject": "Hi", "htmlContent": "<p>Hi</p>"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields: to, subject, htmlContent");
    }

    #[tokio::test]
    async fn test_send_email_invalid_address() {
        let (status, body) = post(
            app(RecordingMailer::default(), "production"),
            "/api/send-email",
            json!({"to": "not-an-email", "subject": "Hi", "htmlContent": "<p>Hi</p>"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email address");
    }

    #[tokio::test]
    async fn test_send_email_provider_failure() {
        let mailer = RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        };
        let (status, body) = post(
            app(mailer, "production"),
            "/api/send-email",
            json!({"to": "misty@cerulean.gym", "subject": "Hi", "htmlContent": "<p>Hi</p>"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to send email");
        assert!(body["details"].as_str().unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_test_email_hidden_outside_development() {
        let (status, _) = post(
            app(RecordingMailer::default(), "production"),
            "/api/test-email",
            json!({"to": "misty@cerulean.gym"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_test_email_renders_templates() {
        let mailer = RecordingMailer::default();
        let (status, body) = post(
            app(mailer.clone(), "development"),
            "/api/test-email",
            json!({"to": "misty@cerulean.gym"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].html.contains("<strong>smtp</strong>"));
        assert!(sent[0].text.as_deref().unwrap().contains("noreply@localhost"));
    }

    #[tokio::test]
    async fn test_health_reports_provider() {
        let response = app(RecordingMailer::default(), "production")
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["emailProvider"], "smtp");
        assert!(body["timestamp"].is_string());
    }
}
