//! # medicore-storage
//!
//! Source-of-record abstraction for the Medicore records service.
//!
//! The main trait is [`RecordStore`], the narrow contract every backend
//! implements: `find_one`, `find_many`, `count`, `create`, `update`,
//! `delete`. Implementations live in separate crates.
//!
//! [`InterceptedStore`] is the write interceptor: a decorator every
//! mutating call site passes through. It emits a `WriteEvent` to registered
//! hooks after each successful write, so downstream cache invalidation has
//! completed before the mutating call returns.

mod error;
mod intercepted;
mod traits;
mod types;

pub use error::StorageError;
pub use intercepted::InterceptedStore;
pub use traits::RecordStore;
pub use types::{Filter, Page, SearchTerm, Sort, StoredRecord};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared record store trait object.
pub type DynRecordStore = std::sync::Arc<dyn RecordStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use medicore_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::StorageError;
    pub use crate::intercepted::InterceptedStore;
    pub use crate::traits::RecordStore;
    pub use crate::types::{Filter, Page, SearchTerm, Sort, StoredRecord};
    pub use crate::{DynRecordStore, StorageResult};
}
