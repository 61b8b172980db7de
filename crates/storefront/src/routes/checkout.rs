//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::models::Order;
use crate::services::{CheckoutContext, CheckoutRequest, complete_checkout};
use crate::state::AppState;

/// Checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order: Order,
    pub confirmation_sent: bool,
}

/// Place an order for the current cart.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let mut shop = state.shop().await;
    let shop = &mut *shop;

    let placed = complete_checkout(
        request,
        CheckoutContext {
            cart: &mut shop.cart,
            products: &shop.products,
            pricing: &shop.pricing,
            orders: &mut shop.orders,
            email: &shop.email,
        },
    )
    .await?;

    add_breadcrumb("checkout", "Order placed", &[("order_id", placed.order.id.as_str())]);

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order: placed.order,
            confirmation_sent: placed.confirmation_sent,
        }),
    ))
}
