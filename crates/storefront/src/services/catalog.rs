//! Product catalog store.
//!
//! Holds products and categories in memory and writes the whole catalog to
//! the `product-store` key after every change. A missing or unreadable blob
//! rehydrates from the seed catalog.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use binder_core::{CategoryId, Money, ProductId};

use crate::models::{Category, NewProduct, Product, ProductUpdate};
use crate::storage::{self, SharedStore, keys};

use super::seed;

/// Errors from catalog mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No product with this id.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// Another product already uses this SKU.
    #[error("SKU already in use: {0}")]
    DuplicateSku(String),

    /// A required text field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    NegativePrice,

    /// Prices are capped at [`MAX_PRICE_DOLLARS`].
    #[error("price cannot exceed ${}", MAX_PRICE_DOLLARS)]
    PriceTooHigh,
}

/// Highest accepted unit price, in whole dollars.
pub const MAX_PRICE_DOLLARS: i64 = 1_000_000;

/// Persisted catalog shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogSnapshot {
    products: Vec<Product>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl CatalogSnapshot {
    fn seeded() -> Self {
        Self {
            products: seed::products(Utc::now()),
            categories: seed::categories(),
        }
    }
}

/// In-memory catalog backed by a key/value store.
pub struct ProductStore {
    store: SharedStore,
    products: Vec<Product>,
    categories: Vec<Category>,
}

impl ProductStore {
    /// Load the catalog from `store`, seeding it when absent.
    #[must_use]
    pub fn open(store: SharedStore) -> Self {
        let snapshot = storage::load_or_else(store.as_ref(), keys::PRODUCTS, || {
            tracing::info!("No stored catalog, loading seed data");
            CatalogSnapshot::seeded()
        });
        Self {
            store,
            products: snapshot.products,
            categories: snapshot.categories,
        }
    }

    fn persist(&self) -> bool {
        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            products: &'a [Product],
            categories: &'a [Category],
        }

        storage::persist(
            self.store.as_ref(),
            keys::PRODUCTS,
            &SnapshotRef {
                products: &self.products,
                categories: &self.categories,
            },
        )
    }

    /// All products, in listing order.
    #[must_use]
    pub fn list(&self) -> &[Product] {
        &self.products
    }

    /// All categories.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Products whose title, SKU, description or tags contain `query`.
    ///
    /// A blank query returns the whole catalog.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products
            .iter()
            .filter(|p| needle.is_empty() || p.matches(&needle))
            .collect()
    }

    /// Products in a category.
    #[must_use]
    pub fn by_category(&self, category_id: &CategoryId) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| &p.category_id == category_id)
            .collect()
    }

    /// List a new product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a required field is blank, the price is
    /// out of range, or the SKU is already taken.
    #[instrument(skip(self, new), fields(sku = %new.sku))]
    pub fn create(&mut self, new: NewProduct) -> Result<Product, CatalogError> {
        validate_text("sku", &new.sku)?;
        validate_text("title", &new.title)?;
        validate_price(new.price)?;
        self.ensure_unique_sku(&new.sku, None)?;

        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            sku: new.sku.trim().to_owned(),
            title: new.title.trim().to_owned(),
            category_id: new.category_id,
            rarity: new.rarity,
            condition: new.condition,
            images: new.images,
            price: new.price,
            stock: new.stock,
            description: new.description,
            tags: new.tags,
            created_at: now,
            updated_at: now,
        };
        self.products.push(product.clone());
        self.persist();

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id, or a validation
    /// error for the changed fields.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub fn update(&mut self, id: &ProductId, mut update: ProductUpdate) -> Result<Product, CatalogError> {
        update.trim_text();
        if let Some(sku) = &update.sku {
            validate_text("sku", sku)?;
            self.ensure_unique_sku(sku, Some(id))?;
        }
        if let Some(title) = &update.title {
            validate_text("title", title)?;
        }
        if let Some(price) = update.price {
            validate_price(price)?;
        }

        let product = self
            .products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        update.apply(product, Utc::now());
        let updated = product.clone();
        self.persist();

        tracing::info!("Product updated");
        Ok(updated)
    }

    /// Delete a product. Cart lines and orders that reference it are left alone.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn delete(&mut self, id: &ProductId) -> Result<Product, CatalogError> {
        let index = self
            .products
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        let removed = self.products.remove(index);
        self.persist();

        tracing::info!("Product deleted");
        Ok(removed)
    }

    /// Replace the catalog with the seed data.
    pub fn reset_to_seed(&mut self) {
        let snapshot = CatalogSnapshot::seeded();
        self.products = snapshot.products;
        self.categories = snapshot.categories;
        self.persist();
    }

    /// Replace the catalog with imported products, keeping categories.
    pub fn replace_products(&mut self, products: Vec<Product>) {
        self.products = products;
        self.persist();
    }

    fn ensure_unique_sku(&self, sku: &str, except: Option<&ProductId>) -> Result<(), CatalogError> {
        let sku = sku.trim();
        let taken = self
            .products
            .iter()
            .any(|p| p.sku.eq_ignore_ascii_case(sku) && Some(&p.id) != except);
        if taken {
            return Err(CatalogError::DuplicateSku(sku.to_owned()));
        }
        Ok(())
    }
}

fn validate_text(field: &'static str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::MissingField(field));
    }
    Ok(())
}

fn validate_price(price: Money) -> Result<(), CatalogError> {
    if price.is_negative() {
        return Err(CatalogError::NegativePrice);
    }
    if price.amount() > Decimal::from(MAX_PRICE_DOLLARS) {
        return Err(CatalogError::PriceTooHigh);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use binder_core::CardCondition;

    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> SharedStore {
        Arc::new(MemoryStore::new())
    }

    fn new_product(sku: &str) -> NewProduct {
        NewProduct {
            sku: sku.to_owned(),
            title: "Blastoise".to_owned(),
            category_id: CategoryId::new("base-set"),
            rarity: "Holo Rare".to_owned(),
            condition: CardCondition::LightlyPlayed,
            images: vec![],
            price: Money::from_cents(25_000),
            stock: 1,
            description: "Water starter evolution".to_owned(),
            tags: vec!["holo".to_owned()],
        }
    }

    #[test]
    fn test_open_seeds_empty_store() {
        let catalog = ProductStore::open(store());
        assert!(!catalog.list().is_empty());
        assert!(!catalog.categories().is_empty());
    }

    #[test]
    fn test_create_persists_across_reopen() {
        let shared = store();
        let mut catalog = ProductStore::open(shared.clone());
        let created = catalog.create(new_product("BS-002")).unwrap();

        let reopened = ProductStore::open(shared);
        assert_eq!(reopened.get(&created.id), Some(&created));
    }

    #[test]
    fn test_duplicate_sku_rejected() {
        let mut catalog = ProductStore::open(store());
        catalog.create(new_product("DUP-1")).unwrap();
        assert_eq!(
            catalog.create(new_product("dup-1")).unwrap_err(),
            CatalogError::DuplicateSku("dup-1".to_owned())
        );
    }

    #[test]
    fn test_validation() {
        let mut catalog = ProductStore::open(store());
        let mut blank = new_product("X-1");
        blank.title = "  ".to_owned();
        assert_eq!(
            catalog.create(blank).unwrap_err(),
            CatalogError::MissingField("title")
        );

        let mut negative = new_product("X-2");
        negative.price = Money::from_cents(-1);
        assert_eq!(catalog.create(negative).unwrap_err(), CatalogError::NegativePrice);

        let mut at_cap = new_product("X-3");
        at_cap.price = Money::new(Decimal::from(MAX_PRICE_DOLLARS));
        assert!(catalog.create(at_cap).is_ok());
    }

    #[test]
    fn test_price_above_cap_rejected() {
        let mut catalog = ProductStore::open(store());
        let mut unbounded = new_product("MAX-1");
        unbounded.price = Money::new(Decimal::MAX);
        assert_eq!(catalog.create(unbounded).unwrap_err(), CatalogError::PriceTooHigh);

        let created = catalog.create(new_product("MAX-2")).unwrap();
        let err = catalog
            .update(
                &created.id,
                ProductUpdate {
                    price: Some(Money::from_cents(100_000_001)),
                    ..ProductUpdate::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, CatalogError::PriceTooHigh);
        assert_eq!(catalog.get(&created.id).unwrap().price, created.price);
    }

    #[test]
    fn test_update_trims_text_like_create() {
        let mut catalog = ProductStore::open(store());
        let created = catalog.create(new_product("  BS-1 ")).unwrap();
        assert_eq!(created.sku, "BS-1");

        let updated = catalog
            .update(
                &created.id,
                ProductUpdate {
                    sku: Some(" BS-1A ".to_owned()),
                    title: Some("  Dark Blastoise ".to_owned()),
                    ..ProductUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.sku, "BS-1A");
        assert_eq!(updated.title, "Dark Blastoise");
        assert_eq!(catalog.search("bs-1a").len(), 1);
    }

    #[test]
    fn test_partial_update_only_touches_given_fields() {
        let mut catalog = ProductStore::open(store());
        let created = catalog.create(new_product("BS-009")).unwrap();

        let updated = catalog
            .update(
                &created.id,
                ProductUpdate {
                    price: Some(Money::from_cents(19_999)),
                    ..ProductUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.price, Money::from_cents(19_999));
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.sku, created.sku);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_update_and_delete_unknown() {
        let mut catalog = ProductStore::open(store());
        let ghost = ProductId::new("ghost");
        assert_eq!(
            catalog.update(&ghost, ProductUpdate::default()).unwrap_err(),
            CatalogError::NotFound(ghost.clone())
        );
        assert_eq!(
            catalog.delete(&ghost).unwrap_err(),
            CatalogError::NotFound(ghost)
        );
    }

    #[test]
    fn test_search_is_case_insensitive_over_fields() {
        let mut catalog = ProductStore::open(store());
        catalog.replace_products(vec![]);
        let created = catalog.create(new_product("BS-002")).unwrap();

        assert_eq!(catalog.search("blast").len(), 1);
        assert_eq!(catalog.search("bs-002").len(), 1);
        assert_eq!(catalog.search("WATER").len(), 1);
        assert_eq!(catalog.search("HOLO").len(), 1);
        assert!(catalog.search("pikachu").is_empty());
        assert_eq!(catalog.search("  ").len(), 1);

        assert_eq!(
            catalog.by_category(&CategoryId::new("base-set"))[0].id,
            created.id
        );
    }

    #[test]
    fn test_delete_removes() {
        let mut catalog = ProductStore::open(store());
        let created = catalog.create(new_product("DEL-1")).unwrap();
        catalog.delete(&created.id).unwrap();
        assert!(catalog.get(&created.id).is_none());
    }
}
