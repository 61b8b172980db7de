//! CLI command implementations.

pub mod orders;
pub mod render;
pub mod seed;

use std::path::PathBuf;
use std::sync::Arc;

use binder_storefront::config::StorefrontConfig;
use binder_storefront::state::Shop;
use binder_storefront::storage::FileStore;

/// Open the shop stored in `data_dir`, or in the configured data directory.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the directory cannot be
/// created.
pub fn open_shop(data_dir: Option<PathBuf>) -> Result<Shop, Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let dir = data_dir.unwrap_or_else(|| config.data_dir.clone());

    let store = FileStore::open(&dir)?;
    tracing::debug!(data_dir = %dir.display(), "Data directory opened");

    let mut shop = Shop::open(Arc::new(store), &config.store_name)?;
    if let Some(relay_url) = &config.relay_url {
        shop.email = shop.email.with_relay(relay_url.as_str().trim_end_matches('/'));
    }
    Ok(shop)
}
