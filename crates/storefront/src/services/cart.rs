//! Cart store.
//!
//! Maps product ids to quantities. Prices are never stored on the cart: totals
//! join against the live catalog when read, so a price change after adding an
//! item is reflected immediately.

use chrono::Utc;
use thiserror::Error;

use binder_core::pricing::PricingRules;
use binder_core::{Money, ProductId};

use crate::models::{CartItem, CartLine, CartSummary};
use crate::storage::{self, SharedStore, keys};

use super::catalog::ProductStore;

/// Errors from cart operations that consult the catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The product is not in the catalog.
    #[error("product not found: {0}")]
    UnknownProduct(ProductId),

    /// The line is not in the cart.
    #[error("product not in cart: {0}")]
    NotInCart(ProductId),
}

/// The shopper's cart, persisted under `cart-storage`.
pub struct CartStore {
    store: SharedStore,
    items: Vec<CartItem>,
}

impl CartStore {
    /// Load the cart from `store` (empty when absent).
    #[must_use]
    pub fn open(store: SharedStore) -> Self {
        let items = storage::load_or_else(store.as_ref(), keys::CART, Vec::new);
        Self { store, items }
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), keys::CART, &self.items);
    }

    /// Cart lines in the order they were added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Quantity of a product currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|i| &i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Total copies across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` copies, accumulating onto an existing line.
    ///
    /// Adding zero copies does nothing.
    pub fn add_item(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product_id: product_id.clone(),
                quantity,
                added_at: Utc::now(),
            });
        }
        tracing::debug!(product_id = %product_id, quantity, "Added to cart");
        self.persist();
    }

    /// Add copies of a product that must exist in `products`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` if the id is not in the catalog.
    pub fn add_product(
        &mut self,
        products: &ProductStore,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if products.get(product_id).is_none() {
            return Err(CartError::UnknownProduct(product_id.clone()));
        }
        self.add_item(product_id, quantity);
        Ok(())
    }

    /// Set the quantity of a line that must already be in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if there is no such line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        if self.quantity_of(product_id) == 0 {
            return Err(CartError::NotInCart(product_id.clone()));
        }
        self.update_quantity(product_id, quantity);
        Ok(())
    }

    /// Set a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = quantity;
            self.persist();
        }
    }

    /// Drop a line. Returns whether it was present.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Lines joined against the live catalog.
    ///
    /// Lines whose product no longer exists are skipped.
    #[must_use]
    pub fn lines(&self, products: &ProductStore) -> Vec<CartLine> {
        self.items
            .iter()
            .filter_map(|item| {
                let Some(product) = products.get(&item.product_id) else {
                    tracing::debug!(product_id = %item.product_id, "Cart line references missing product");
                    return None;
                };
                Some(CartLine {
                    line_total: product.price * item.quantity,
                    product: product.clone(),
                    quantity: item.quantity,
                    added_at: item.added_at,
                })
            })
            .collect()
    }

    /// Sum of current price × quantity.
    #[must_use]
    pub fn total(&self, products: &ProductStore) -> Money {
        self.lines(products).iter().map(|l| l.line_total).sum()
    }

    /// Lines, item count and priced totals.
    #[must_use]
    pub fn summary(&self, products: &ProductStore, rules: &PricingRules) -> CartSummary {
        let lines = self.lines(products);
        let totals = rules.totals(lines.iter().map(|l| l.line_total).sum());
        CartSummary {
            item_count: lines.iter().map(|l| l.quantity).sum(),
            lines,
            totals,
        }
    }
}
