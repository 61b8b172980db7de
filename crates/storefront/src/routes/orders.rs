//! Order admin route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use binder_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::models::Order;
use crate::services::OrderError;
use crate::state::AppState;

/// Listing filter.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Status change response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub order: Order,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

/// Orders, newest first, optionally filtered by status.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<OrderQuery>) -> Result<Json<Vec<Order>>> {
    let shop = state.shop().await;
    let orders = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => {
            let status: OrderStatus = raw
                .parse()
                .map_err(|e: binder_core::ParseStatusError| AppError::BadRequest(e.to_string()))?;
            shop.orders.list_by_status(status)
        }
        None => shop.orders.list(),
    };
    Ok(Json(orders.into_iter().cloned().collect()))
}

/// Order detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    let id = OrderId::new(id);
    let shop = state.shop().await;
    let order = shop
        .orders
        .get(&id)
        .cloned()
        .ok_or(OrderError::NotFound(id))?;
    Ok(Json(order))
}

/// Move an order to a new status and notify the customer.
#[instrument(skip(state, body), fields(status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<StatusChangeResponse>> {
    let mut shop = state.shop().await;
    let shop = &mut *shop;
    let update = shop
        .orders
        .update_status(&OrderId::new(id), body.status, body.note, &shop.email)
        .await?;

    Ok(Json(StatusChangeResponse {
        order: update.order,
        email_sent: update.email_sent,
        email_error: update.email_error,
    }))
}

/// Delete an order.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.shop().await.orders.delete(&OrderId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}
