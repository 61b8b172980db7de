//! Email settings, template and test-send route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use binder_core::{Email, TemplateId};

use crate::error::Result;
use crate::services::notify::{EmailSettings, EmailTemplate, SentEmail};
use crate::services::{EmailOutcome, NotifyError};
use crate::state::AppState;

/// A saved value plus whether it reached storage.
#[derive(Debug, Serialize)]
pub struct Saved<T> {
    #[serde(flatten)]
    pub value: T,
    pub saved: bool,
}

/// Template edit body; the id comes from the path.
#[derive(Debug, Deserialize)]
pub struct TemplateBody {
    pub name: String,
    pub subject: String,
    pub body: String,
}

/// Test send body.
#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub to: String,
}

/// Outcome of a test send.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailResponse {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Current delivery settings.
pub async fn settings(State(state): State<AppState>) -> Json<EmailSettings> {
    Json(state.shop().await.email.settings().clone())
}

/// Replace delivery settings.
#[instrument(skip_all)]
pub async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<EmailSettings>,
) -> Json<Saved<EmailSettings>> {
    let mut shop = state.shop().await;
    let saved = shop.email.save_settings(settings);
    Json(Saved {
        value: shop.email.settings().clone(),
        saved,
    })
}

/// All templates.
pub async fn templates(State(state): State<AppState>) -> Json<Vec<EmailTemplate>> {
    Json(state.shop().await.email.templates().to_vec())
}

/// Create or replace a template.
#[instrument(skip(state, body))]
pub async fn save_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TemplateBody>,
) -> Result<Json<Saved<EmailTemplate>>> {
    let id = TemplateId::new(id);
    let mut shop = state.shop().await;
    let saved = shop
        .email
        .save_template(EmailTemplate::new(id.clone(), body.name, body.subject, body.body));
    let template = shop
        .email
        .template(&id)
        .cloned()
        .ok_or(NotifyError::TemplateNotFound(id))?;
    Ok(Json(Saved {
        value: template,
        saved,
    }))
}

/// Delete a template.
#[instrument(skip(state))]
pub async fn delete_template(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    let id = TemplateId::new(id);
    if state.shop().await.email.delete_template(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(NotifyError::TemplateNotFound(id).into())
    }
}

/// Restore the default templates.
pub async fn reset_templates(State(state): State<AppState>) -> Json<Vec<EmailTemplate>> {
    let mut shop = state.shop().await;
    shop.email.reset_templates();
    Json(shop.email.templates().to_vec())
}

/// Send the test template to an address.
#[instrument(skip_all)]
pub async fn send_test(
    State(state): State<AppState>,
    Json(body): Json<TestEmailRequest>,
) -> Result<Json<TestEmailResponse>> {
    let to = Email::parse(&body.to).map_err(NotifyError::from)?;
    let shop = state.shop().await;
    let outcome = shop.email.send_test_email(&to).await?;

    let message_id = match outcome {
        EmailOutcome::Sent(receipt) => Some(receipt.message_id),
        EmailOutcome::Disabled | EmailOutcome::NoTemplate => None,
    };
    Ok(Json(TestEmailResponse {
        sent: message_id.is_some(),
        message_id,
    }))
}

/// Messages captured by the simulated transport.
pub async fn outbox(State(state): State<AppState>) -> Json<Vec<SentEmail>> {
    Json(state.shop().await.email.outbox().sent())
}
