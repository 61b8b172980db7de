//! Message transports: a simulated outbox and the HTTP relay client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use binder_core::Email;

use super::NotifyError;

/// Relay endpoint path, appended to the configured base URL.
const SEND_PATH: &str = "/api/send-email";

/// Messages kept by the simulated outbox; older ones are dropped.
pub const OUTBOX_CAPACITY: usize = 200;

/// A fully rendered outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub to: Email,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Proof that a transport accepted a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub message_id: String,
}

/// A message captured by the simulated transport.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
    #[serde(flatten)]
    pub message: EmailMessage,
}

/// Logs messages and keeps the most recent ones in memory instead of
/// delivering them.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    outbox: Arc<Mutex<VecDeque<SentEmail>>>,
    capacity: usize,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::with_capacity(OUTBOX_CAPACITY)
    }
}

impl SimulatedTransport {
    /// Create a transport with an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that keeps at most `capacity` messages (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outbox: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    /// "Send" a message.
    pub fn send(&self, message: EmailMessage) -> DeliveryReceipt {
        let message_id = format!("simulated-{}", uuid::Uuid::new_v4());
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            message_id = %message_id,
            "Simulated email send"
        );
        let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        while outbox.len() >= self.capacity.max(1) {
            outbox.pop_front();
        }
        outbox.push_back(SentEmail {
            message_id: message_id.clone(),
            sent_at: Utc::now(),
            message,
        });
        DeliveryReceipt { message_id }
    }

    /// Snapshot of the retained messages, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Payload accepted by the relay's `/api/send-email`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest<'a> {
    to: &'a str,
    subject: &'a str,
    html_content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<&'a str>,
}

/// Relay response body, for both success and failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    success: bool,
    message_id: Option<String>,
    error: Option<String>,
}

/// HTTP client for the email relay service.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
}

impl RelayClient {
    /// Create a relay client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new() -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client })
    }

    /// POST a message to `<base_url>/api/send-email`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Http` if the relay is unreachable and
    /// `NotifyError::Relay` if it answers with `success: false`.
    pub async fn send(&self, base_url: &str, message: &EmailMessage) -> Result<DeliveryReceipt, NotifyError> {
        let url = format!("{}{SEND_PATH}", base_url.trim_end_matches('/'));
        let body = RelayRequest {
            to: message.to.as_str(),
            subject: &message.subject,
            html_content: &message.html,
            text_content: message.text.as_deref(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed: Option<RelayResponse> = serde_json::from_str(&text).ok();
        match parsed {
            Some(RelayResponse {
                success: true,
                message_id,
                ..
            }) if status.is_success() => Ok(DeliveryReceipt {
                message_id: message_id.unwrap_or_default(),
            }),
            Some(RelayResponse { error, .. }) => Err(NotifyError::Relay {
                status: status.as_u16(),
                message: error.unwrap_or_else(|| "relay rejected the message".to_owned()),
            }),
            None => Err(NotifyError::Relay {
                status: status.as_u16(),
                message: text,
            }),
        }
    }
}
