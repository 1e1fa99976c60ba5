//! Read-through accessors, one per logical query.
//!
//! Each accessor validates its parameters, looks up the computed key in the
//! store, falls back to the source-of-record on a miss, repopulates the
//! store, and returns an envelope. Negative results are cached too, to
//! absorb repeated-miss load.
//!
//! Failure policy: a store failure degrades to a direct source read with
//! population skipped; a source failure after a miss falls back to any
//! stale value still at the key, else a 500 envelope. Nothing propagates as
//! an uncaught fault.

mod appointment;
mod doctor;
mod patient;

pub use appointment::{
    get_appointment_by_id, get_appointment_with_medical_records_by_id, get_patient_appointments,
};
pub use doctor::{
    get_all_doctors, get_doctor_by_id, get_doctor_dashboard_stats, get_doctors, get_rating_by_id,
};
pub use patient::{
    get_all_patients, get_patient_by_id, get_patient_dashboard_statistics,
    get_patient_full_data_by_id,
};

use std::future::Future;
use std::time::Duration;

use medicore_storage::{StorageError, StoredRecord};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::context::CacheContext;
use crate::envelope::Envelope;

/// Pagination and search parameters accepted by every list accessor.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// 1-based page number; values below 1 resolve to 1.
    pub page: Option<u32>,
    /// Records per page; defaults to 10.
    pub limit: Option<u32>,
    /// Case-insensitive search term.
    pub search: Option<String>,
}

impl ListParams {
    /// Params for a specific page at the default limit.
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    /// Set the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the search term.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub(crate) fn resolve(&self) -> (u32, u32, Option<&str>) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = self.limit.filter(|l| *l > 0).unwrap_or(10);
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        (page, limit, search)
    }
}

/// The read-through core shared by every accessor.
///
/// `load` is only polled on a miss; on a hit the future is dropped
/// unpolled and the source-of-record is never touched.
pub(crate) async fn read_through<F>(
    ctx: &CacheContext,
    key: &str,
    ttl: Duration,
    load: F,
) -> Envelope
where
    F: Future<Output = Result<Envelope, StorageError>>,
{
    let kv = ctx.kv();
    let mut store_available = true;

    match kv.get(key).await {
        Ok(Some(raw)) => match Envelope::from_cache_value(&raw) {
            Ok(envelope) => {
                debug!(key = %key, "cache hit");
                return envelope;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "corrupt cache entry; treating as miss");
                if let Err(e) = kv.delete(&[key.to_string()]).await {
                    warn!(key = %key, error = %e, "failed to drop corrupt entry");
                }
            }
        },
        Ok(None) => debug!(key = %key, "cache miss"),
        Err(e) => {
            warn!(key = %key, error = %e, "store unavailable; reading source directly");
            store_available = false;
        }
    }

    match load.await {
        Ok(envelope) => {
            if store_available {
                match envelope.to_cache_value() {
                    Ok(raw) => {
                        if let Err(e) = kv.set_ex(key, &raw, ttl).await {
                            warn!(key = %key, error = %e, "cache populate failed");
                        } else {
                            debug!(key = %key, ttl_secs = ttl.as_secs(), "cache populated");
                        }
                    }
                    Err(e) => warn!(key = %key, error = %e, "envelope serialization failed"),
                }
            }
            envelope
        }
        Err(e) => {
            warn!(key = %key, error = %e, "source-of-record query failed");
            if store_available
                && let Ok(Some(raw)) = kv.get(key).await
                && let Ok(envelope) = Envelope::from_cache_value(&raw)
            {
                warn!(key = %key, "serving stale cache entry after source failure");
                return envelope;
            }
            Envelope::server_error()
        }
    }
}

/// Project a record down to the given fields (plus its id).
pub(crate) fn project(record: &StoredRecord, fields: &[&str]) -> Value {
    let mut out = Map::new();
    out.insert("id".to_string(), Value::String(record.id.clone()));
    for field in fields {
        if *field == "id" {
            continue;
        }
        if let Some(value) = record.field(field) {
            out.insert((*field).to_string(), value.clone());
        }
    }
    Value::Object(out)
}
