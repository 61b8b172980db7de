//! Checkout: turns the cart plus an approved payment into an order.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use binder_core::pricing::PricingRules;
use binder_core::{Email, EmailError, PaymentStatus};

use crate::models::{OrderDraft, OrderItem, ShippingAddress};

use super::cart::CartStore;
use super::catalog::ProductStore;
use super::notify::EmailService;
use super::orders::{OrderError, OrderRegistry, OrderRepository, PlacedOrder};

/// Errors that stop a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Required fields are blank. Lists every missing field.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Customer email is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Nothing purchasable in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Line or order totals exceed what `Money` can represent.
    #[error("order total is too large")]
    AmountOverflow,

    /// The payment provider declined the capture.
    #[error("payment {payment_id} failed")]
    PaymentFailed { payment_id: String },

    /// The order could not be recorded.
    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Who is buying.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Approval reported by the payment widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentApproval {
    pub payment_id: String,
    pub status: PaymentStatus,
    #[serde(default = "default_payment_method")]
    pub method: String,
}

fn default_payment_method() -> String {
    "paypal".to_owned()
}

/// Checkout form submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer: CustomerDetails,
    pub shipping_address: ShippingAddress,
    pub payment: PaymentApproval,
}

impl CheckoutRequest {
    /// Check required fields and return the parsed customer email.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingFields` naming every blank field, or
    /// `CheckoutError::InvalidEmail`.
    pub fn validate(&self) -> Result<Email, CheckoutError> {
        let address = &self.shipping_address;
        let missing: Vec<&'static str> = [
            ("name", self.customer.name.as_str()),
            ("email", self.customer.email.as_str()),
            ("address", address.line1.as_str()),
            ("city", address.city.as_str()),
            ("state", address.state.as_str()),
            ("postalCode", address.postal_code.as_str()),
            ("country", address.country.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(CheckoutError::MissingFields(missing));
        }
        Ok(Email::parse(&self.customer.email)?)
    }
}

/// Everything a checkout touches.
pub struct CheckoutContext<'a, R> {
    pub cart: &'a mut CartStore,
    pub products: &'a ProductStore,
    pub pricing: &'a PricingRules,
    pub orders: &'a mut OrderRegistry<R>,
    pub email: &'a EmailService,
}

/// Place an order for the current cart.
///
/// Line prices are snapshotted from the live catalog. On success the cart is
/// cleared whether or not the confirmation email went out; on any error it is
/// left as it was.
///
/// # Errors
///
/// Returns `CheckoutError` for invalid input, an empty cart, a failed payment,
/// totals that overflow, or a storage failure.
#[instrument(skip_all, fields(payment_id = %request.payment.payment_id))]
pub async fn complete_checkout<R: OrderRepository>(
    request: CheckoutRequest,
    ctx: CheckoutContext<'_, R>,
) -> Result<PlacedOrder, CheckoutError> {
    let customer_email = request.validate()?;

    let lines = ctx.cart.lines(ctx.products);
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    if request.payment.status == PaymentStatus::Failed {
        tracing::warn!("Payment failed, keeping cart");
        return Err(CheckoutError::PaymentFailed {
            payment_id: request.payment.payment_id,
        });
    }

    let items: Vec<OrderItem> = lines
        .iter()
        .map(|line| OrderItem {
            product_id: line.product.id.clone(),
            title: line.product.title.clone(),
            quantity: line.quantity,
            price_at_purchase: line.product.price,
        })
        .collect();
    let totals = ctx
        .pricing
        .checked_price_lines(items.iter().map(|i| (i.price_at_purchase, i.quantity)))
        .ok_or(CheckoutError::AmountOverflow)?;

    let draft = OrderDraft {
        customer_name: request.customer.name.trim().to_owned(),
        customer_email,
        items,
        totals,
        shipping_address: request.shipping_address,
        payment_method: request.payment.method,
        payment_id: request.payment.payment_id,
        status: request.payment.status.initial_order_status(),
    };

    let placed = ctx.orders.place(draft, ctx.email).await?;
    ctx.cart.clear();
    Ok(placed)
}
