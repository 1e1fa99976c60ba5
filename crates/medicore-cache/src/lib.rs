//! # medicore-cache
//!
//! Read-through caching and invalidation for the Medicore records service.
//!
//! The crate has three pillars:
//!
//! - [`reads`]: one accessor per logical query. Each computes its key from
//!   the scheme in [`keys`], consults the key-value store, falls back to
//!   the source-of-record on a miss and repopulates with the TTL from
//!   [`TtlPolicy`]. Negative results are cached; a corrupt entry is
//!   dropped and treated as a miss; a store outage degrades to direct
//!   source reads.
//! - [`invalidation`]: a rule table mapping each write event to the exact
//!   keys and glob patterns it makes stale, and a dispatcher that purges
//!   them. [`CacheInvalidationHook`] plugs the dispatcher into the write
//!   interceptor in `medicore-storage`.
//! - Backends: [`RedisStore`] for deployments, [`MemoryStore`] for tests
//!   and single-process use, both behind the [`KeyValueStore`] contract.

mod context;
mod envelope;
mod invalidation;
pub mod keys;
mod kv;
mod memory;
mod redis;
pub mod reads;
mod ttl;

pub use context::{CacheConfig, CacheContext};
pub use envelope::Envelope;
pub use invalidation::{CacheInvalidationHook, InvalidationDispatcher, KeyTarget, rules_for};
pub use kv::{DynKeyValueStore, KeyValueStore, KvError};
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use ttl::TtlPolicy;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use medicore_cache::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::{CacheConfig, CacheContext};
    pub use crate::envelope::Envelope;
    pub use crate::invalidation::{CacheInvalidationHook, InvalidationDispatcher};
    pub use crate::kv::{DynKeyValueStore, KeyValueStore, KvError};
    pub use crate::reads::ListParams;
    pub use crate::ttl::TtlPolicy;
}
