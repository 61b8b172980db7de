//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::mailer::Mailer;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; generic over the mailer so tests can stand in
/// for a real provider.
pub struct AppState<M> {
    inner: Arc<AppStateInner<M>>,
}

struct AppStateInner<M> {
    config: RelayConfig,
    mailer: M,
}

impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Mailer> AppState<M> {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: RelayConfig, mailer: M) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, mailer }),
        }
    }

    /// Get a reference to the relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Get a reference to the mailer.
    #[must_use]
    pub fn mailer(&self) -> &M {
        &self.inner.mailer
    }
}
