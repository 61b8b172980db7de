//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use binder_core::pricing::PricingRules;

use crate::config::StorefrontConfig;
use crate::services::{CartStore, EmailService, NotifyError, OrderRegistry, ProductStore, StoredOrders};
use crate::storage::SharedStore;

/// Everything the shop keeps: catalog, cart, orders and email.
pub struct Shop {
    pub products: ProductStore,
    pub cart: CartStore,
    pub orders: OrderRegistry<StoredOrders>,
    pub email: EmailService,
    pub pricing: PricingRules,
}

impl Shop {
    /// Load every store from `store`.
    ///
    /// # Errors
    ///
    /// Returns error if the relay HTTP client fails to build.
    pub fn open(store: SharedStore, store_name: &str) -> Result<Self, NotifyError> {
        Ok(Self {
            products: ProductStore::open(store.clone()),
            cart: CartStore::open(store.clone()),
            orders: OrderRegistry::open(StoredOrders::new(store.clone())),
            email: EmailService::open(store, store_name)?,
            pricing: PricingRules::default(),
        })
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The shop sits behind a single
/// async mutex; each request holds it for its whole duration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    shop: Mutex<Shop>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Applies `RELAY_URL` from the configuration, if set.
    ///
    /// # Errors
    ///
    /// Returns error if the relay HTTP client fails to build.
    pub fn new(config: StorefrontConfig, store: SharedStore) -> Result<Self, NotifyError> {
        let mut shop = Shop::open(store, &config.store_name)?;
        if let Some(relay_url) = &config.relay_url {
            shop.email = shop.email.with_relay(relay_url.as_str().trim_end_matches('/'));
            tracing::info!(relay_url = %relay_url, "Email relay configured");
        }
        Ok(Self::from_shop(config, shop))
    }

    /// Wrap an already opened shop.
    #[must_use]
    pub fn from_shop(config: StorefrontConfig, shop: Shop) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shop: Mutex::new(shop),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Lock the shop for the rest of the request.
    pub async fn shop(&self) -> MutexGuard<'_, Shop> {
        self.inner.shop.lock().await
    }
}
