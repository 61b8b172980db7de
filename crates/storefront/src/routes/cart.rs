//! Cart route handlers.
//!
//! Every mutation answers with the fresh cart summary so the client can
//! re-render totals without a second request.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use binder_core::ProductId;

use crate::error::Result;
use crate::models::CartSummary;
use crate::state::{AppState, Shop};

/// Add to cart body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update quantity body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: u32,
}

fn summary(shop: &Shop) -> Json<CartSummary> {
    Json(shop.cart.summary(&shop.products, &shop.pricing))
}

/// Current cart with totals.
pub async fn show(State(state): State<AppState>) -> Json<CartSummary> {
    summary(&*state.shop().await)
}

/// Add copies of a product (default one).
#[instrument(skip(state))]
pub async fn add(State(state): State<AppState>, Json(body): Json<AddToCart>) -> Result<Json<CartSummary>> {
    let mut shop = state.shop().await;
    let shop = &mut *shop;
    shop.cart.add_product(
        &shop.products,
        &ProductId::new(body.product_id),
        body.quantity.unwrap_or(1),
    )?;
    Ok(summary(shop))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartSummary>> {
    let mut shop = state.shop().await;
    shop.cart
        .set_quantity(&ProductId::new(product_id), body.quantity)?;
    Ok(summary(&shop))
}

/// Remove a line.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(product_id): Path<String>) -> Json<CartSummary> {
    let mut shop = state.shop().await;
    shop.cart.remove_item(&ProductId::new(product_id));
    summary(&shop)
}

/// Empty the cart.
pub async fn clear(State(state): State<AppState>) -> Json<CartSummary> {
    let mut shop = state.shop().await;
    shop.cart.clear();
    summary(&shop)
}
