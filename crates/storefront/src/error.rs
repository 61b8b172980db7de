//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. Every error leaves as a JSON [`Notice`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::notice::Notice;
use crate::services::{CartError, CatalogError, CheckoutError, NotifyError, OrderError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout was rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Email could not be sent.
    #[error("Email error: {0}")]
    Notify(#[from] NotifyError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(CatalogError::NotFound(_))
            | Self::Cart(CartError::UnknownProduct(_) | CartError::NotInCart(_))
            | Self::Order(OrderError::NotFound(_))
            | Self::Notify(NotifyError::TemplateNotFound(_))
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Catalog(CatalogError::DuplicateSku(_))
            | Self::Order(OrderError::InvalidTransition(_)) => StatusCode::CONFLICT,
            Self::Checkout(CheckoutError::PaymentFailed { .. }) => StatusCode::PAYMENT_REQUIRED,
            Self::Checkout(CheckoutError::Order(OrderError::Storage(_)))
            | Self::Order(OrderError::Storage(_))
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Notify(NotifyError::Http(_) | NotifyError::Relay { .. }) => StatusCode::BAD_GATEWAY,
            Self::Catalog(_) | Self::Checkout(_) | Self::Notify(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn notice(&self) -> Notice {
        match self {
            Self::Catalog(err) => err.into(),
            Self::Cart(err) => err.into(),
            Self::Checkout(err) => err.into(),
            Self::Order(err) => err.into(),
            Self::Notify(err) => err.into(),
            Self::NotFound(what) => Notice::new("Not found", what.clone()),
            Self::BadRequest(msg) => Notice::new("Invalid request", msg.clone()),
            // Don't expose internal error details to clients
            Self::Internal(_) => Notice::new("Something went wrong", "Internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(self.notice())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shop actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use binder_core::{OrderId, OrderStatus, ProductId};

    use super::*;
    use crate::models::TransitionError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(CatalogError::NotFound(ProductId::new("x")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(OrderError::NotFound(OrderId::new("ORD-1")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(
                OrderError::InvalidTransition(TransitionError {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Pending,
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                CheckoutError::PaymentFailed {
                    payment_id: "PAY-1".to_owned()
                }
                .into()
            ),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let notice = AppError::Internal("disk on fire".to_owned()).notice();
        assert!(!notice.message.contains("disk"));
    }
}
