//! # medicore-core
//!
//! Shared domain vocabulary for the Medicore records service: the tracked
//! entity models, the mutating actions observed on the source-of-record, and
//! the write-event system that downstream layers (cache invalidation first
//! and foremost) subscribe to.

pub mod error;
pub mod events;
pub mod model;

pub use error::{CoreError, Result};
pub use events::{AffectedIds, HookError, WriteEvent, WriteHook};
pub use model::{Model, WriteAction};
