//! Order inspection and status changes.

use std::path::PathBuf;

use tracing::{info, warn};

use binder_core::{OrderId, OrderStatus};

use super::open_shop;

/// List orders newest first, optionally filtered by `status`.
///
/// # Errors
///
/// Returns an error if `status` is not a known order status.
pub fn list(data_dir: Option<PathBuf>, status: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let shop = open_shop(data_dir)?;
    let orders = match status {
        Some(status) => shop.orders.list_by_status(status.parse::<OrderStatus>()?),
        None => shop.orders.list(),
    };

    info!("Orders: {}", orders.len());
    for order in orders {
        info!(
            "  {}  {:<10}  {}  {} <{}>  {} items",
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status.as_str(),
            order.id,
            order.customer_name,
            order.customer_email,
            order.item_count(),
        );
        info!("      total {}", order.total);
    }
    Ok(())
}

/// Move order `id` to `status`, emailing the customer when that status
/// notifies.
///
/// # Errors
///
/// Returns an error for an unknown order or status, a transition the order
/// lifecycle does not allow, or a storage failure. Email failures are
/// reported but do not fail the command.
pub async fn set_status(
    data_dir: Option<PathBuf>,
    id: &str,
    status: &str,
    note: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut shop = open_shop(data_dir)?;
    let status: OrderStatus = status.parse()?;
    let id = OrderId::new(id);

    let update = shop.orders.update_status(&id, status, note, &shop.email).await?;

    info!(order_id = %update.order.id, status = %update.order.status, "Order updated");
    if update.email_sent {
        info!(to = %update.order.customer_email, "Customer notified");
    } else if let Some(error) = &update.email_error {
        warn!(error = %error, "Customer email failed");
    }
    Ok(())
}
