//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use binder_core::pricing::Totals;
use binder_core::{Money, ProductId};

use super::product::Product;

/// One cart line: a product and how many copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

/// A cart line joined against the live catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Money,
    pub added_at: DateTime<Utc>,
}

/// Everything the cart drawer and checkout page display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    #[serde(flatten)]
    pub totals: Totals,
}
