//! User-facing notices.
//!
//! Every error a shopper or admin can see collapses to a short title and a
//! sentence, ready for a toast.

use serde::{Deserialize, Serialize};

use crate::services::{CartError, CatalogError, CheckoutError, NotifyError, OrderError};

/// A `{title, message}` pair shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&CheckoutError> for Notice {
    fn from(err: &CheckoutError) -> Self {
        match err {
            CheckoutError::MissingFields(fields) => Self::new(
                "Missing information",
                format!("Please fill in: {}.", fields.join(", ")),
            ),
            CheckoutError::InvalidEmail(_) => {
                Self::new("Invalid email", "Please enter a valid email address.")
            }
            CheckoutError::EmptyCart => {
                Self::new("Your cart is empty", "Add some cards before checking out.")
            }
            CheckoutError::PaymentFailed { .. } => Self::new(
                "Payment failed",
                "Your payment could not be completed. Your cart has been kept.",
            ),
            CheckoutError::AmountOverflow => Self::new(
                "Order too large",
                "This order's total is too large to process. Please reduce the quantities.",
            ),
            CheckoutError::Order(err) => err.into(),
        }
    }
}

impl From<&OrderError> for Notice {
    fn from(err: &OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => Self::new("Order not found", format!("No order {id}.")),
            OrderError::InvalidTransition(t) => Self::new(
                "Status not changed",
                format!("An order cannot move from {} to {}.", t.from.label(), t.to.label()),
            ),
            OrderError::Storage(_) => {
                Self::new("Order not saved", "The order could not be saved. Please try again.")
            }
        }
    }
}

impl From<&CatalogError> for Notice {
    fn from(err: &CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => {
                Self::new("Product not found", format!("No product {id}."))
            }
            CatalogError::DuplicateSku(sku) => {
                Self::new("Duplicate SKU", format!("SKU {sku} is already in use."))
            }
            CatalogError::MissingField(field) => {
                Self::new("Missing information", format!("{field} is required."))
            }
            CatalogError::NegativePrice => {
                Self::new("Invalid price", "Price cannot be negative.")
            }
            CatalogError::PriceTooHigh => Self::new(
                "Invalid price",
                format!("Price cannot exceed ${}.", crate::services::catalog::MAX_PRICE_DOLLARS),
            ),
        }
    }
}

impl From<&CartError> for Notice {
    fn from(err: &CartError) -> Self {
        match err {
            CartError::UnknownProduct(_) => {
                Self::new("Product unavailable", "That card is no longer listed.")
            }
            CartError::NotInCart(_) => {
                Self::new("Not in cart", "That card is not in your cart.")
            }
        }
    }
}

impl From<&NotifyError> for Notice {
    fn from(err: &NotifyError) -> Self {
        match err {
            NotifyError::TemplateNotFound(id) => {
                Self::new("Template not found", format!("No email template {id}."))
            }
            NotifyError::InvalidRecipient(_) => {
                Self::new("Invalid email", "Please enter a valid email address.")
            }
            NotifyError::Http(_) | NotifyError::Relay { .. } => Self::new(
                "Email not sent",
                "The email service could not deliver the message.",
            ),
        }
    }
}
