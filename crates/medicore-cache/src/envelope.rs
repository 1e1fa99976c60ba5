//! The uniform response envelope returned by every accessor.
//!
//! Envelopes are the only values stored in the cache. They are typed rather
//! than opaque blobs: a cached payload that no longer deserializes is
//! detected at read time and treated as a miss instead of surfacing a
//! runtime fault.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uniform success/data/status/message response shape.
///
/// Accessor-specific aggregate fields (dashboard counts, rating averages)
/// travel in the flattened `extra` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the query succeeded.
    pub success: bool,
    /// HTTP-style status code.
    pub status: u16,
    /// Query result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable message on failure paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Total pages, on paginated queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    /// Total records, on paginated queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u64>,
    /// Current page, on paginated queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    /// Accessor-specific aggregate fields.
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Successful envelope carrying data.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            status: 200,
            data: Some(data),
            message: None,
            total_pages: None,
            total_records: None,
            current_page: None,
            extra: Map::new(),
        }
    }

    /// Successful paginated envelope.
    pub fn paginated(data: Value, total_records: u64, total_pages: u64, current_page: u32) -> Self {
        Self {
            total_pages: Some(total_pages),
            total_records: Some(total_records),
            current_page: Some(current_page),
            ..Self::ok(data)
        }
    }

    /// Negative envelope for a missing record; cached like any other result.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: 404,
            data: None,
            message: Some(message.into()),
            total_pages: None,
            total_records: None,
            current_page: None,
            extra: Map::new(),
        }
    }

    /// Failure envelope for an unreachable source-of-record.
    pub fn server_error() -> Self {
        Self {
            success: false,
            status: 500,
            data: None,
            message: Some("Internal Server Error".to_string()),
            total_pages: None,
            total_records: None,
            current_page: None,
            extra: Map::new(),
        }
    }

    /// Attach an accessor-specific aggregate field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Serialize for cache storage.
    pub fn to_cache_value(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a cached payload.
    ///
    /// An error here means the entry is corrupt or schema-mismatched and
    /// must be treated as a miss.
    pub fn from_cache_value(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
