//! Order domain types and the status-history log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use binder_core::pricing::Totals;
use binder_core::{Email, Money, OrderId, OrderStatus, ProductId};

/// A rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// A purchased line with the price charged at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub price_at_purchase: Money,
}

impl OrderItem {
    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price_at_purchase * self.quantity
    }
}

/// One entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Multi-line postal form used in emails.
    #[must_use]
    pub fn to_lines(&self) -> String {
        let mut lines = vec![self.line1.clone()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.trim().is_empty()) {
            lines.push(line2.to_owned());
        }
        lines.push(format!("{}, {} {}", self.city, self.state, self.postal_code));
        lines.push(self.country.clone());
        lines.join("\n")
    }
}

/// Everything needed to record a new order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_email: Email,
    pub items: Vec<OrderItem>,
    pub totals: Totals,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_id: String,
    pub status: OrderStatus,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_email: Email,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub status_history: Vec<StatusChange>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Record a new order; the history starts with its initial status.
    #[must_use]
    pub fn from_draft(draft: OrderDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::generate(),
            customer_name: draft.customer_name,
            customer_email: draft.customer_email,
            items: draft.items,
            subtotal: draft.totals.subtotal,
            shipping: draft.totals.shipping,
            tax: draft.totals.tax,
            total: draft.totals.total,
            status: draft.status,
            status_history: vec![StatusChange {
                status: draft.status,
                timestamp: now,
                note: Some("Order placed".to_owned()),
            }],
            shipping_address: draft.shipping_address,
            payment_method: draft.payment_method,
            payment_id: draft.payment_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `to`, appending to the history.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` and leaves the order untouched if the move is
    /// not allowed by [`OrderStatus::can_transition_to`].
    pub fn transition(
        &mut self,
        to: OrderStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = now;
        self.status_history.push(StatusChange {
            status: to,
            timestamp: now,
            note,
        });
        Ok(())
    }

    /// Total copies across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
