//! Editable email templates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use binder_core::template::{placeholders, render};
use binder_core::{OrderStatus, TemplateId};

/// A subject/body pair with `{{token}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: TemplateId,
    pub name: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// Placeholder names found in the subject and body. Informational only.
    #[serde(default)]
    pub variables: Vec<String>,
}

/// A template with its tokens substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

impl EmailTemplate {
    /// Build a template, deriving `variables` from its text.
    #[must_use]
    pub fn new(
        id: impl Into<TemplateId>,
        name: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let mut template = Self {
            id: id.into(),
            name: name.into(),
            subject: subject.into(),
            body: body.into(),
            variables: Vec::new(),
        };
        template.refresh_variables();
        template
    }

    /// Recompute `variables` after the subject or body changed.
    pub fn refresh_variables(&mut self) {
        let mut names = placeholders(&self.subject);
        for name in placeholders(&self.body) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        self.variables = names;
    }

    /// Substitute `variables` into subject and body.
    #[must_use]
    pub fn render(&self, variables: &HashMap<String, String>) -> RenderedEmail {
        RenderedEmail {
            subject: render(&self.subject, variables),
            html: render(&self.body, variables),
        }
    }
}

const CONFIRMATION_BODY: &str = r#"<h1>Thanks for your order, {{customerName}}!</h1>
<p>We've received order <strong>{{orderId}}</strong> placed on {{orderDate}}.</p>
<table>{{itemsList}}</table>
<p>Subtotal: {{subtotal}}<br>Shipping: {{shipping}}<br>Tax: {{tax}}<br><strong>Total: {{orderTotal}}</strong></p>
<p>Shipping to:<br><pre>{{shippingAddress}}</pre></p>
<p>{{storeName}}</p>"#;

fn status_body(headline: &str, detail: &str) -> String {
    format!(
        "<h1>{headline}</h1>\n<p>Hi {{{{customerName}}}},</p>\n<p>{detail}</p>\n\
         <p>Order <strong>{{{{orderId}}}}</strong> ({{{{itemCount}}}} items, {{{{orderTotal}}}}) is now <strong>{{{{status}}}}</strong>.</p>\n\
         <p>{{{{note}}}}</p>\n<p>{{{{storeName}}}}</p>"
    )
}

/// Templates installed on first run and by "reset to defaults".
#[must_use]
pub fn default_templates() -> Vec<EmailTemplate> {
    let status = |status: OrderStatus, name: &str, subject: &str, headline: &str, detail: &str| {
        EmailTemplate::new(
            TemplateId::for_status(status),
            name,
            subject,
            status_body(headline, detail),
        )
    };

    vec![
        EmailTemplate::new(
            TemplateId::ORDER_CONFIRMATION,
            "Order Confirmation",
            "Order Confirmation - {{orderId}}",
            CONFIRMATION_BODY,
        ),
        status(
            OrderStatus::Processing,
            "Order Processing",
            "Your order {{orderId}} is being prepared",
            "We're pulling your cards",
            "Your cards are being pulled, checked and sleeved.",
        ),
        status(
            OrderStatus::Shipped,
            "Order Shipped",
            "Your order {{orderId}} has shipped",
            "Your order is on its way",
            "Your package has left our shop.",
        ),
        status(
            OrderStatus::Delivered,
            "Order Delivered",
            "Your order {{orderId}} was delivered",
            "Delivered!",
            "Your package has been delivered. Enjoy your cards!",
        ),
        status(
            OrderStatus::Cancelled,
            "Order Cancelled",
            "Your order {{orderId}} was cancelled",
            "Order cancelled",
            "Your order has been cancelled. Any payment will be refunded.",
        ),
        EmailTemplate::new(
            TemplateId::TEST_EMAIL,
            "Test Email",
            "Test email from {{storeName}}",
            "<p>This is a test message from {{storeName}} sent at {{sentAt}}.</p>\n<p>If you can read this, email delivery works.</p>",
        ),
    ]
}
