//! Product and category route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use binder_core::{CategoryId, ProductId};

use crate::error::Result;
use crate::models::{Category, NewProduct, Product, ProductUpdate};
use crate::services::CatalogError;
use crate::state::AppState;

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Free-text search over title, SKU, description and tags.
    pub q: Option<String>,
    /// Restrict to one category.
    pub category: Option<String>,
}

/// List products, optionally filtered.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<ProductQuery>) -> Json<Vec<Product>> {
    let shop = state.shop().await;
    let category = query.category.filter(|c| !c.is_empty()).map(CategoryId::new);
    let products = shop
        .products
        .search(query.q.as_deref().unwrap_or_default())
        .into_iter()
        .filter(|p| category.as_ref().is_none_or(|c| &p.category_id == c))
        .cloned()
        .collect();
    Json(products)
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    let shop = state.shop().await;
    let product = shop
        .products
        .get(&id)
        .cloned()
        .ok_or(CatalogError::NotFound(id))?;
    Ok(Json(product))
}

/// List a new product.
#[instrument(skip(state, new))]
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.shop().await.products.create(new)?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update a product.
#[instrument(skip(state, update))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    let product = state
        .shop()
        .await
        .products
        .update(&ProductId::new(id), update)?;
    Ok(Json(product))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.shop().await.products.delete(&ProductId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// All categories.
pub async fn categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.shop().await.products.categories().to_vec())
}
