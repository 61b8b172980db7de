//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Catalog
//! GET    /api/products?q=&category=     - Product listing / search
//! POST   /api/products                  - Create product
//! GET    /api/products/{id}             - Product detail
//! PATCH  /api/products/{id}             - Partial update
//! DELETE /api/products/{id}             - Delete product
//! GET    /api/categories                - Category listing
//!
//! # Cart
//! GET    /api/cart                      - Cart with totals
//! DELETE /api/cart                      - Empty cart
//! POST   /api/cart/items                - Add {productId, quantity?}
//! PATCH  /api/cart/items/{productId}    - Set {quantity}
//! DELETE /api/cart/items/{productId}    - Remove line
//!
//! # Checkout
//! POST   /api/checkout                  - Place order for the cart
//!
//! # Orders
//! GET    /api/orders?status=            - Order listing
//! GET    /api/orders/{id}               - Order detail
//! DELETE /api/orders/{id}               - Delete order
//! POST   /api/orders/{id}/status        - Change status {status, note?}
//!
//! # Email
//! GET    /api/settings/email            - Delivery settings
//! PUT    /api/settings/email            - Replace settings
//! GET    /api/email/templates           - Template listing
//! POST   /api/email/templates/reset     - Restore defaults
//! PUT    /api/email/templates/{id}      - Upsert template
//! DELETE /api/email/templates/{id}      - Delete template
//! POST   /api/email/test                - Send test email {to}
//! GET    /api/email/outbox              - Simulated outbox
//! ```

pub mod cart;
pub mod checkout;
pub mod email;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show).delete(orders::delete))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the email routes router.
pub fn email_routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(email::templates))
        .route("/templates/reset", post(email::reset_templates))
        .route(
            "/templates/{id}",
            put(email::save_template).delete(email::delete_template),
        )
        .route("/test", post(email::send_test))
        .route("/outbox", get(email::outbox))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/products", product_routes())
        .route("/api/categories", get(products::categories))
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(checkout::checkout))
        .nest("/api/orders", order_routes())
        .route(
            "/api/settings/email",
            get(email::settings).put(email::save_settings),
        )
        .nest("/api/email", email_routes())
}

/// Liveness health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
