//! Hook trait for reacting to write events.
//!
//! Hooks are awaited by the write interceptor after the underlying write has
//! been durably applied, so side effects (cache purges above all) are
//! complete before the mutating call returns to its caller. Hook failures
//! are logged by the interceptor and never fail the write itself.

use async_trait::async_trait;

use super::types::WriteEvent;
use crate::model::Model;

/// Error type for hook execution.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Hook execution failed with a message.
    #[error("Hook execution failed: {0}")]
    Execution(String),

    /// Hook failed against a remote store.
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error with source.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    /// Create an execution error from a string.
    pub fn execution(msg: impl Into<String>) -> Self {
        HookError::Execution(msg.into())
    }

    /// Create a store error from a string.
    pub fn store(msg: impl Into<String>) -> Self {
        HookError::Store(msg.into())
    }
}

/// Trait for write-event hooks.
///
/// Implementations must be quick and must not assume exclusive access: the
/// same event may fan out to several hooks. Errors do not propagate to the
/// write path.
#[async_trait]
pub trait WriteHook: Send + Sync {
    /// Unique name for this hook (for logging).
    fn name(&self) -> &str;

    /// Models this hook is interested in.
    ///
    /// Return an empty slice to match all models.
    fn models(&self) -> &[Model] {
        &[]
    }

    /// Handle a write event.
    async fn handle(&self, event: &WriteEvent) -> Result<(), HookError>;

    /// Check whether this hook should handle the given event.
    fn matches(&self, event: &WriteEvent) -> bool {
        let models = self.models();
        models.is_empty() || models.contains(&event.model)
    }
}
