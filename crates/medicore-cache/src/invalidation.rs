//! Invalidation rules and dispatcher.
//!
//! Invalidation is rule-driven: `rules_for` maps a write event to the exact
//! keys and scan patterns that are now stale, so adding a new cached query
//! only means adding entries here, not auditing every write path. Rules are
//! conservative: over-invalidation costs a recomputation, under-invalidation
//! serves stale health records.

use std::sync::Arc;

use async_trait::async_trait;
use medicore_core::{HookError, Model, WriteEvent, WriteHook};
use tracing::{debug, warn};

use crate::keys::{self, patterns};
use crate::kv::{DynKeyValueStore, KvError};

/// A key to purge: either an exact storage key or a glob pattern resolved
/// by a store scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTarget {
    /// An exact storage key.
    Exact(String),
    /// A glob pattern; every matching key is purged.
    Pattern(String),
}

/// Resolve the purge targets for a write event.
///
/// Staff and Organization have no cached queries and resolve to an empty
/// set. For every other model, all three actions share one rule set:
/// deleting an absent key is a no-op, so uniform rules are the conservative
/// choice (a create has no identity keys yet but already changes lists).
pub fn rules_for(event: &WriteEvent) -> Vec<KeyTarget> {
    use KeyTarget::{Exact, Pattern};

    let ids = &event.ids;
    let mut targets = Vec::new();

    match event.model {
        Model::Patient => {
            if let Some(id) = ids.record_id.as_deref().or(ids.patient_id.as_deref()) {
                targets.push(Exact(keys::patient(id)));
                targets.push(Exact(keys::patient_full(id)));
                targets.push(Exact(keys::patient_dashboard(id)));
                targets.push(Pattern(patterns::medical_for_patient(id)));
                targets.push(Pattern(patterns::appointments_lists_for(id)));
            }
            targets.push(Pattern(patterns::patients_lists()));
        }
        Model::Doctor => {
            if let Some(id) = ids.record_id.as_deref().or(ids.doctor_id.as_deref()) {
                targets.push(Exact(keys::doctor(id)));
                targets.push(Exact(keys::doctor_dashboard(id)));
                targets.push(Exact(keys::doctor_ratings(id)));
            }
            targets.push(Exact(keys::doctors()));
            targets.push(Pattern(patterns::doctors_lists()));
        }
        Model::Appointment => {
            if let Some(id) = ids.record_id.as_deref().or(ids.appointment_id.as_deref()) {
                targets.push(Exact(keys::appointment(id)));
                targets.push(Exact(keys::appointment_medical(id)));
            }
            if let Some(pid) = ids.patient_id.as_deref() {
                targets.push(Exact(keys::patient_dashboard(pid)));
                targets.push(Exact(keys::patient_full(pid)));
            }
            if let Some(did) = ids.doctor_id.as_deref() {
                targets.push(Exact(keys::doctor_dashboard(did)));
            }
            // Appointment rows are list content; purge every list variant.
            targets.push(Pattern(patterns::appointments_lists()));
        }
        Model::Rating => {
            // Identity and list keys of the doctor stay untouched; only the
            // rating-derived aggregates change.
            if let Some(did) = ids.doctor_id.as_deref() {
                targets.push(Exact(keys::doctor_ratings(did)));
                targets.push(Exact(keys::doctor_dashboard(did)));
            }
        }
        Model::MedicalRecord => {
            if let Some(aid) = ids.appointment_id.as_deref() {
                targets.push(Exact(keys::appointment(aid)));
                targets.push(Exact(keys::appointment_medical(aid)));
            }
            if let Some(pid) = ids.patient_id.as_deref() {
                targets.push(Pattern(patterns::medical_for_patient(pid)));
            }
        }
        Model::Staff | Model::Organization => {}
    }

    targets
}

/// Deletes every cache key a write event made stale.
///
/// Exact targets are collected directly; patterns go through a store scan
/// first. All resulting keys are bulk-deleted. Deletes of absent keys are
/// no-ops, so dispatch is idempotent.
pub struct InvalidationDispatcher {
    kv: DynKeyValueStore,
}

impl InvalidationDispatcher {
    /// Create a dispatcher over a key-value store.
    pub fn new(kv: DynKeyValueStore) -> Self {
        Self { kv }
    }

    /// Purge everything the event made stale.
    ///
    /// Returns the number of keys actually deleted. Scan or delete failures
    /// are logged and surfaced as an error, but partial progress is kept:
    /// whatever could be resolved is still deleted.
    pub async fn invalidate(&self, event: &WriteEvent) -> Result<u64, KvError> {
        let targets = rules_for(event);
        if targets.is_empty() {
            debug!(model = %event.model, action = %event.action, "no cached queries for model; skipping");
            return Ok(0);
        }

        let mut stale_keys = Vec::new();
        let mut first_error = None;
        for target in &targets {
            match target {
                KeyTarget::Exact(key) => stale_keys.push(key.clone()),
                KeyTarget::Pattern(pattern) => match self.kv.scan_keys(pattern).await {
                    Ok(found) => stale_keys.extend(found),
                    Err(e) => {
                        warn!(pattern = %pattern, error = %e, "invalidation scan failed");
                        first_error.get_or_insert(e);
                    }
                },
            }
        }

        stale_keys.sort();
        stale_keys.dedup();

        let mut deleted = 0;
        if !stale_keys.is_empty() {
            match self.kv.delete(&stale_keys).await {
                Ok(n) => deleted = n,
                Err(e) => {
                    warn!(model = %event.model, error = %e, "invalidation delete failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!(
                    model = %event.model,
                    action = %event.action,
                    keys = stale_keys.len(),
                    deleted,
                    "cache invalidated"
                );
                Ok(deleted)
            }
        }
    }
}

/// Adapter wiring the dispatcher into the write interceptor.
pub struct CacheInvalidationHook {
    dispatcher: InvalidationDispatcher,
}

impl CacheInvalidationHook {
    /// Create the hook over a key-value store.
    pub fn new(kv: DynKeyValueStore) -> Arc<Self> {
        Arc::new(Self {
            dispatcher: InvalidationDispatcher::new(kv),
        })
    }
}

#[async_trait]
impl WriteHook for CacheInvalidationHook {
    fn name(&self) -> &str {
        "cache_invalidation"
    }

    async fn handle(&self, event: &WriteEvent) -> Result<(), HookError> {
        self.dispatcher
            .invalidate(event)
            .await
            .map(|_| ())
            .map_err(|e| HookError::store(e.to_string()))
    }
}
