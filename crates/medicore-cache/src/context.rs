//! Cache context: the injected key-value client plus the TTL policy.
//!
//! The client is constructed explicitly with defined init (connect before
//! first use) and teardown boundaries; nothing in this crate holds ambient
//! global state.

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::kv::{DynKeyValueStore, KvError};
use crate::memory::MemoryStore;
use crate::redis::RedisStore;
use crate::ttl::TtlPolicy;

/// Configuration for the cache layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub url: String,
    /// Per-query TTL policy.
    pub ttl: TtlPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            ttl: TtlPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Build a configuration from the environment (`REDIS_URL`), falling
    /// back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("REDIS_URL") {
            config.url = url;
        }
        config
    }
}

/// Shared context handed to every read-through accessor.
#[derive(Clone)]
pub struct CacheContext {
    kv: DynKeyValueStore,
    ttl: TtlPolicy,
}

impl CacheContext {
    /// Connect to the configured Redis instance.
    ///
    /// # Errors
    ///
    /// Returns `KvError::Unavailable` if the connection cannot be
    /// established; callers decide whether to fail startup or fall back to
    /// an in-memory store.
    pub async fn connect(config: CacheConfig) -> Result<Self, KvError> {
        let store = RedisStore::connect(&config.url).await?;
        info!(url = %config.url, "cache context connected");
        Ok(Self {
            kv: Arc::new(store),
            ttl: config.ttl,
        })
    }

    /// Build a context over an already constructed store.
    pub fn with_store(kv: DynKeyValueStore, ttl: TtlPolicy) -> Self {
        Self { kv, ttl }
    }

    /// Build a context over an in-memory store (tests, single-process use).
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), TtlPolicy::default())
    }

    /// The key-value store.
    pub fn kv(&self) -> &DynKeyValueStore {
        &self.kv
    }

    /// The TTL policy.
    pub fn ttl(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// Tear down the context.
    ///
    /// The redis connection is multiplexed and closes when the last clone
    /// drops; this is the explicit shutdown boundary for callers that want
    /// one.
    pub fn close(self) {
        info!(backend = self.kv.backend_name(), "cache context closed");
        drop(self.kv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.url, "redis://127.0.0.1:6379");
        assert_eq!(config.ttl.patient.as_secs(), 86400);
    }

    #[tokio::test]
    async fn in_memory_context_round_trips() {
        let ctx = CacheContext::in_memory();
        ctx.kv()
            .set_ex("patient:p1", "{}", std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert!(ctx.kv().get("patient:p1").await.unwrap().is_some());
        ctx.close();
    }
}
