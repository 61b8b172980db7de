//! Email notification service.
//!
//! Owns the delivery settings, the editable template table and both
//! transports. Every send renders a template with order variables and hands
//! the result to the transport picked by [`DeliveryMode`]:
//!
//! - `Simulated` - logged and kept in an in-memory outbox
//! - `Relay` - POSTed to the relay service's `/api/send-email`

pub mod settings;
pub mod templates;
pub mod transport;

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use binder_core::{Email, EmailError, OrderStatus, TemplateId};

use crate::models::Order;
use crate::storage::{self, SharedStore, keys};

pub use settings::{DeliveryMode, EmailSettings};
pub use templates::{EmailTemplate, RenderedEmail, default_templates};
pub use transport::{DeliveryReceipt, EmailMessage, RelayClient, SentEmail, SimulatedTransport};

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The relay could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with a failure.
    #[error("relay error: {status} - {message}")]
    Relay { status: u16, message: String },

    /// No template with this id.
    #[error("email template not found: {0}")]
    TemplateNotFound(TemplateId),

    /// Recipient address is malformed.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(#[from] EmailError),
}

/// What happened to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    /// Accepted by the transport.
    Sent(DeliveryReceipt),
    /// Notifications are switched off in settings.
    Disabled,
    /// No template exists for this notification; nothing was sent.
    NoTemplate,
}

impl EmailOutcome {
    /// Whether a message actually went out.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Settings, templates and transports for outgoing email.
pub struct EmailService {
    store: SharedStore,
    settings: EmailSettings,
    templates: Vec<EmailTemplate>,
    simulated: SimulatedTransport,
    relay: RelayClient,
    store_name: String,
}

impl EmailService {
    /// Load settings and templates from `store`, installing defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns error if the relay HTTP client fails to build.
    pub fn open(store: SharedStore, store_name: impl Into<String>) -> Result<Self, NotifyError> {
        let settings = storage::load_or_else(store.as_ref(), keys::EMAIL_SETTINGS, EmailSettings::default);
        let templates = storage::load_or_else(store.as_ref(), keys::EMAIL_TEMPLATES, default_templates);
        Ok(Self {
            store,
            settings,
            templates,
            simulated: SimulatedTransport::new(),
            relay: RelayClient::new()?,
            store_name: store_name.into(),
        })
    }

    /// Force relay mode towards `relay_url`, overriding stored settings.
    #[must_use]
    pub fn with_relay(mut self, relay_url: impl Into<String>) -> Self {
        self.settings.mode = DeliveryMode::Relay;
        self.settings.relay_url = relay_url.into();
        self
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &EmailSettings {
        &self.settings
    }

    /// Replace the settings. Returns whether they were persisted; the new
    /// settings take effect either way.
    pub fn save_settings(&mut self, settings: EmailSettings) -> bool {
        tracing::info!(mode = ?settings.mode, provider = %settings.provider, "Email settings updated");
        self.settings = settings;
        storage::persist(self.store.as_ref(), keys::EMAIL_SETTINGS, &self.settings)
    }

    /// All templates.
    #[must_use]
    pub fn templates(&self) -> &[EmailTemplate] {
        &self.templates
    }

    /// Look up a template.
    #[must_use]
    pub fn template(&self, id: &TemplateId) -> Option<&EmailTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    /// Insert or replace a template (matched by id). Returns whether it was
    /// persisted.
    pub fn save_template(&mut self, mut template: EmailTemplate) -> bool {
        template.refresh_variables();
        if let Some(existing) = self.templates.iter_mut().find(|t| t.id == template.id) {
            *existing = template;
        } else {
            self.templates.push(template);
        }
        self.persist_templates()
    }

    /// Remove a template. Returns whether it existed.
    pub fn delete_template(&mut self, id: &TemplateId) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| &t.id != id);
        let removed = self.templates.len() != before;
        if removed {
            self.persist_templates();
        }
        removed
    }

    /// Restore the default template set.
    pub fn reset_templates(&mut self) {
        self.templates = default_templates();
        self.persist_templates();
    }

    fn persist_templates(&self) -> bool {
        storage::persist(self.store.as_ref(), keys::EMAIL_TEMPLATES, &self.templates)
    }

    /// The simulated transport's outbox.
    #[must_use]
    pub const fn outbox(&self) -> &SimulatedTransport {
        &self.simulated
    }

    /// Hand a rendered message to the configured transport.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the relay is unreachable or rejects the message.
    pub async fn deliver(&self, message: EmailMessage) -> Result<DeliveryReceipt, NotifyError> {
        match self.settings.mode {
            DeliveryMode::Simulated => Ok(self.simulated.send(message)),
            DeliveryMode::Relay => self.relay.send(&self.settings.relay_url, &message).await,
        }
    }

    /// Render template `id` with `variables` and send it to `to`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::TemplateNotFound` if the template is missing, or
    /// a transport error.
    #[instrument(skip(self, variables), fields(template = %id, to = %to))]
    pub async fn send_template(
        &self,
        id: &TemplateId,
        to: &Email,
        variables: &HashMap<String, String>,
    ) -> Result<EmailOutcome, NotifyError> {
        let template = self
            .template(id)
            .ok_or_else(|| NotifyError::TemplateNotFound(id.clone()))?;
        if !self.settings.enabled {
            tracing::debug!("Email disabled, skipping");
            return Ok(EmailOutcome::Disabled);
        }

        let rendered = template.render(variables);
        let receipt = self
            .deliver(EmailMessage {
                to: to.clone(),
                subject: rendered.subject,
                html: rendered.html,
                text: None,
            })
            .await?;
        Ok(EmailOutcome::Sent(receipt))
    }

    /// Send the order confirmation to the customer, and a copy to the admin
    /// address when one is configured.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the confirmation template is missing or the
    /// customer copy fails. A failed admin copy is only logged.
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<EmailOutcome, NotifyError> {
        let id = TemplateId::new(TemplateId::ORDER_CONFIRMATION);
        let variables = self.order_variables(order, None);
        let outcome = self
            .send_template(&id, &order.customer_email, &variables)
            .await?;

        if outcome.is_sent()
            && let Some(admin) = self.settings.admin_email.as_deref()
        {
            match Email::parse(admin) {
                Ok(admin) => {
                    if let Err(e) = self.send_template(&id, &admin, &variables).await {
                        tracing::warn!(order_id = %order.id, error = %e, "Admin order copy failed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring malformed admin email"),
            }
        }

        Ok(outcome)
    }

    /// Notify the customer that `order` entered `status`.
    ///
    /// A missing `order_<status>` template is not an error: nothing is sent
    /// and [`EmailOutcome::NoTemplate`] is returned.
    ///
    /// # Errors
    ///
    /// Returns a transport error if sending fails.
    pub async fn send_status_update(
        &self,
        order: &Order,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<EmailOutcome, NotifyError> {
        let id = TemplateId::for_status(status);
        if self.template(&id).is_none() {
            tracing::debug!(order_id = %order.id, template = %id, "No status template, skipping email");
            return Ok(EmailOutcome::NoTemplate);
        }
        let variables = self.order_variables(order, note);
        self.send_template(&id, &order.customer_email, &variables)
            .await
    }

    /// Send the `test_email` template to `to`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the template is missing or sending fails.
    pub async fn send_test_email(&self, to: &Email) -> Result<EmailOutcome, NotifyError> {
        let variables = HashMap::from([
            ("storeName".to_owned(), self.store_name.clone()),
            ("sentAt".to_owned(), Utc::now().to_rfc2822()),
        ]);
        self.send_template(&TemplateId::new(TemplateId::TEST_EMAIL), to, &variables)
            .await
    }

    /// Variables available to order templates.
    #[must_use]
    pub fn order_variables(&self, order: &Order, note: Option<&str>) -> HashMap<String, String> {
        let items_list = order
            .items
            .iter()
            .map(|item| {
                format!(
                    "<tr><td>{}</td><td>x{}</td><td>{}</td></tr>",
                    item.title,
                    item.quantity,
                    item.line_total()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        [
            ("customerName", order.customer_name.clone()),
            ("customerEmail", order.customer_email.to_string()),
            ("orderId", order.id.to_string()),
            ("orderDate", order.created_at.format("%B %-d, %Y").to_string()),
            ("orderTotal", order.total.to_string()),
            ("subtotal", order.subtotal.to_string()),
            ("shipping", order.shipping.to_string()),
            ("tax", order.tax.to_string()),
            ("itemCount", order.item_count().to_string()),
            ("itemsList", items_list),
            ("shippingAddress", order.shipping_address.to_lines()),
            ("status", order.status.label().to_owned()),
            ("note", note.unwrap_or_default().to_owned()),
            ("storeName", self.store_name.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::order::tests::sample_order;
    use crate::storage::MemoryStore;

    fn service() -> EmailService {
        EmailService::open(Arc::new(MemoryStore::new()), "Binder TCG").unwrap()
    }

    #[tokio::test]
    async fn test_confirmation_renders_order_details() {
        let email = service();
        let order = sample_order(OrderStatus::Paid);

        let outcome = email.send_order_confirmation(&order).await.unwrap();
        assert!(outcome.is_sent());

        let sent = email.outbox().sent();
        assert_eq!(sent.len(), 1);
        let message = &sent[0].message;
        assert_eq!(message.to, order.customer_email);
        assert_eq!(message.subject, format!("Order Confirmation - {}", order.id));
        assert!(message.html.contains("Ash Ketchum"));
        assert!(message.html.contains("Charizard"));
        assert!(message.html.contains(&order.total.to_string()));
        assert!(!message.html.contains("{{"));
    }

    #[tokio::test]
    async fn test_admin_copy() {
        let mut email = service();
        email.save_settings(EmailSettings {
            admin_email: Some("owner@binder-tcg.example".to_owned()),
            ..EmailSettings::default()
        });
        email
            .send_order_confirmation(&sample_order(OrderStatus::Paid))
            .await
            .unwrap();
        let recipients: Vec<_> = email
            .outbox()
            .sent()
            .into_iter()
            .map(|s| s.message.to.to_string())
            .collect();
        assert_eq!(recipients, vec!["ash@pallet.town", "owner@binder-tcg.example"]);
    }

    #[tokio::test]
    async fn test_missing_status_template_is_silent() {
        let mut email = service();
        assert!(email.delete_template(&TemplateId::for_status(OrderStatus::Delivered)));

        let outcome = email
            .send_status_update(&sample_order(OrderStatus::Shipped), OrderStatus::Delivered, None)
            .await
            .unwrap();
        assert_eq!(outcome, EmailOutcome::NoTemplate);
        assert!(email.outbox().sent().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_settings_skip_send() {
        let mut email = service();
        email.save_settings(EmailSettings {
            enabled: false,
            ..EmailSettings::default()
        });
        let outcome = email
            .send_test_email(&Email::parse("misty@cerulean.gym").unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, EmailOutcome::Disabled);
        assert!(email.outbox().sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_template_unknown_id_errors() {
        let email = service();
        let err = email
            .send_template(
                &TemplateId::new("nope"),
                &Email::parse("a@b.co").unwrap(),
                &HashMap::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::TemplateNotFound(_)));
    }

    #[test]
    fn test_template_crud_persists() {
        let shared: SharedStore = Arc::new(MemoryStore::new());
        let mut email = EmailService::open(shared.clone(), "Binder").unwrap();
        let mut edited = email
            .template(&TemplateId::new(TemplateId::ORDER_CONFIRMATION))
            .unwrap()
            .clone();
        edited.subject = "Got it, {{customerName}}!".to_owned();
        assert!(email.save_template(edited));

        let reopened = EmailService::open(shared, "Binder").unwrap();
        let template = reopened
            .template(&TemplateId::new(TemplateId::ORDER_CONFIRMATION))
            .unwrap();
        assert_eq!(template.subject, "Got it, {{customerName}}!");
        assert!(template.variables.contains(&"customerName".to_owned()));
    }

    #[test]
    fn test_reset_restores_deleted_templates() {
        let mut email = service();
        let id = TemplateId::for_status(OrderStatus::Shipped);
        email.delete_template(&id);
        assert!(email.template(&id).is_none());
        email.reset_templates();
        assert!(email.template(&id).is_some());
    }
}
