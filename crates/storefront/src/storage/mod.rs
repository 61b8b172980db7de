//! Key/value persistence for storefront state.
//!
//! Every store serializes its whole state as one JSON blob under a fixed key,
//! the same shape a browser would keep in local storage:
//!
//! | Key | Contents |
//! |-----|----------|
//! | `product-store` | products and categories |
//! | `cart-storage` | cart lines |
//! | `orders` | every order with its status history |
//! | `emailSettings` | delivery settings |
//! | `emailTemplates` | editable email templates |
//!
//! Writes are last-writer-wins. Two backends are provided:
//! [`MemoryStore`] for tests and [`FileStore`] (one `<key>.json` file per key)
//! for the server and CLI.

mod file;
mod memory;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Well-known storage keys.
pub mod keys {
    pub const PRODUCTS: &str = "product-store";
    pub const CART: &str = "cart-storage";
    pub const ORDERS: &str = "orders";
    pub const EMAIL_SETTINGS: &str = "emailSettings";
    pub const EMAIL_TEMPLATES: &str = "emailTemplates";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored blob is not valid JSON for the expected shape.
    #[error("stored value for key {key} is malformed: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The key contains characters the backend cannot store.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// A string-keyed blob store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value for `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the raw value for `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A store shared between the storefront components.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read and deserialize the JSON value stored under `key`.
///
/// # Errors
///
/// Returns `StorageError` if the backend fails or the blob is malformed.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    store
        .get(key)?
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|source| StorageError::Serialization {
                key: key.to_owned(),
                source,
            })
        })
        .transpose()
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the backend fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, &raw)
}

/// Load a value, falling back to `default` when it is missing or unreadable.
///
/// A corrupt blob is logged and replaced on the next save, mirroring how a
/// browser store rehydrates from defaults.
pub fn load_or_else<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    default: impl FnOnce() -> T,
) -> T {
    match load_json(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable stored state");
            default()
        }
    }
}

/// Save a value, logging and swallowing failures.
///
/// Returns whether the write succeeded.
pub fn persist<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    match save_json(store, key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to persist state");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        save_json(&store, "numbers", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<i32>> = load_json(&store, "numbers").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = load_json(&store, "nothing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_malformed_blob_is_reported() {
        let store = MemoryStore::new();
        store.set("orders", "{not json").unwrap();
        let err = load_json::<Vec<i32>>(&store, "orders").unwrap_err();
        assert!(matches!(err, StorageError::Serialization { .. }));
    }

    #[test]
    fn test_load_or_else_falls_back() {
        let store = MemoryStore::new();
        store.set("cart-storage", "[oops").unwrap();
        let value: Vec<i32> = load_or_else(&store, "cart-storage", || vec![7]);
        assert_eq!(value, vec![7]);
    }
}
