//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use binder_core::{CardCondition, CategoryId, Money, ProductId};

/// A single card (or sealed product) listed for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub title: String,
    pub category_id: CategoryId,
    pub rarity: String,
    pub condition: CardCondition,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether any copies are available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Case-insensitive match on title, SKU, description and tags.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.sku.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// Fields supplied when listing a new product.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub title: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub condition: CardCondition,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A partial product update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub title: Option<String>,
    pub category_id: Option<CategoryId>,
    pub rarity: Option<String>,
    pub condition: Option<CardCondition>,
    pub images: Option<Vec<String>>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ProductUpdate {
    /// Trim `sku` and `title` the way new products are stored.
    pub fn trim_text(&mut self) {
        for field in [&mut self.sku, &mut self.title].into_iter().flatten() {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_owned();
            }
        }
    }

    /// Apply the present fields to `product` and bump `updated_at`.
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(sku) = self.sku {
            product.sku = sku;
        }
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(rarity) = self.rarity {
            product.rarity = rarity;
        }
        if let Some(condition) = self.condition {
            product.condition = condition;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(tags) = self.tags {
            product.tags = tags;
        }
        product.updated_at = now;
    }
}

/// A browsing category (set, game, sealed product...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}
