//! Seed the catalog.
//!
//! Without a file the catalog is restored to the built-in seed data. With a
//! file, the YAML list of products replaces every product (categories are
//! kept):
//!
//! ```yaml
//! - sku: EMB-001-NM
//!   title: Ember Drake
//!   categoryId: holo-rares
//!   rarity: Holo Rare
//!   condition: NM
//!   price: "129.99"
//!   stock: 2
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use binder_storefront::models::NewProduct;
use binder_storefront::services::{CatalogError, ProductStore};

use super::open_shop;

/// Restore the seed catalog, or import products from `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a product fails
/// validation. A failed import leaves the catalog unchanged.
pub fn catalog(data_dir: Option<PathBuf>, file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut shop = open_shop(data_dir)?;

    let Some(path) = file else {
        shop.products.reset_to_seed();
        info!(products = shop.products.list().len(), "Catalog reset to seed data");
        return Ok(());
    };

    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading products from file");
    let content = std::fs::read_to_string(path)?;
    let products: Vec<NewProduct> = serde_yaml::from_str(&content)?;
    info!(products = products.len(), "Parsed product file");

    let imported = import(&mut shop.products, products)?;
    info!(imported, "Catalog import complete");
    Ok(())
}

/// Replace every product with `products`, all or nothing.
fn import(store: &mut ProductStore, products: Vec<NewProduct>) -> Result<usize, CatalogError> {
    let previous = store.list().to_vec();
    store.replace_products(Vec::new());

    for product in products {
        let sku = product.sku.clone();
        if let Err(e) = store.create(product) {
            tracing::error!(sku = %sku, error = %e, "Product rejected, restoring previous catalog");
            store.replace_products(previous);
            return Err(e);
        }
    }
    Ok(store.list().len())
}
