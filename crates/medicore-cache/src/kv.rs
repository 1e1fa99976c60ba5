//! Key-value store contract.
//!
//! A thin abstraction over the remote cache: get, set-with-expiry, bulk
//! delete, and pattern scan. Backends must be thread-safe; the trait is
//! object-safe so callers hold a `DynKeyValueStore`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Errors that can occur against the key-value store.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A store operation failed.
    #[error("Store operation failed: {0}")]
    Operation(String),
}

impl KvError {
    /// Create a new `Unavailable` error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a new `Operation` error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

/// The key-value store contract consumed by the caching layer.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value at a key.
    ///
    /// Returns `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Set a value with a time-to-live.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Delete keys, returning how many existed.
    ///
    /// Deleting absent keys is a no-op, never an error.
    async fn delete(&self, keys: &[String]) -> Result<u64, KvError>;

    /// Find all keys matching a glob pattern.
    ///
    /// Patterns are used exclusively for bulk invalidation scans, never as
    /// storage keys.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, KvError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared key-value store trait object.
pub type DynKeyValueStore = Arc<dyn KeyValueStore>;
