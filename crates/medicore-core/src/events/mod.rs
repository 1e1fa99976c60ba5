//! Write-event system connecting the source-of-record to its observers.

mod hooks;
mod types;

pub use hooks::{HookError, WriteHook};
pub use types::{AffectedIds, WriteEvent};
