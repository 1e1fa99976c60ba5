//! Data types used by the source-of-record traits.

use medicore_core::Model;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A record as stored in the source-of-record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The record id.
    pub id: String,
    /// The model this record belongs to.
    pub model: Model,
    /// The full record content as JSON.
    pub record: Value,
    /// When the record was originally created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl StoredRecord {
    /// Creates a new `StoredRecord`.
    #[must_use]
    pub fn new(id: impl Into<String>, model: Model, record: Value) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            model,
            record,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a field of the record content, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    /// Returns a string field of the record content, if present.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.record.get(name).and_then(Value::as_str)
    }
}

/// A case-insensitive substring search over a set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    /// The term to match.
    pub term: String,
    /// Record fields the term is matched against (any may match).
    pub fields: Vec<String>,
}

/// Filter over records of a model.
///
/// Conditions combine as: all `eq` pairs must hold, at least one `any_eq`
/// pair must hold (when present), and the search term must match at least
/// one of its fields (when present).
#[derive(Debug, Clone, Default)]
pub struct Filter {
    eq: Vec<(String, String)>,
    any_eq: Vec<(String, String)>,
    search: Option<SearchTerm>,
}

impl Filter {
    /// Creates an empty filter matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter matching a single record by id.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq("id", id)
    }

    /// Adds an equality condition (conjunctive).
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq.push((field.into(), value.into()));
        self
    }

    /// Adds an equality condition to the disjunctive group.
    #[must_use]
    pub fn or_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.any_eq.push((field.into(), value.into()));
        self
    }

    /// Sets a case-insensitive substring search over the given fields.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>, fields: &[&str]) -> Self {
        self.search = Some(SearchTerm {
            term: term.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        });
        self
    }

    /// Returns the id condition, if one was set via `eq("id", …)`.
    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    /// Returns the first conjunctive equality value for a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.eq
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Conjunctive equality conditions.
    pub fn eq_conditions(&self) -> &[(String, String)] {
        &self.eq
    }

    /// Disjunctive equality conditions.
    pub fn any_eq_conditions(&self) -> &[(String, String)] {
        &self.any_eq
    }

    /// The search term, if any.
    pub fn search_term(&self) -> Option<&SearchTerm> {
        self.search.as_ref()
    }

    /// Returns true if the filter has no conditions at all.
    pub fn is_empty(&self) -> bool {
        self.eq.is_empty() && self.any_eq.is_empty() && self.search.is_none()
    }
}

/// Sort order for `find_many`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Record field to sort by.
    pub field: String,
    /// True for descending order.
    pub descending: bool,
}

impl Sort {
    /// Ascending sort on a field.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending sort on a field.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Pagination window for `find_many`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    /// Records per page.
    pub limit: u32,
}

impl Page {
    /// Creates a page, clamping the page number to at least 1 and the limit
    /// to at least 1.
    #[must_use]
    pub fn new(number: u32, limit: u32) -> Self {
        Self {
            number: number.max(1),
            limit: limit.max(1),
        }
    }

    /// Number of records to skip before this page.
    #[must_use]
    pub fn skip(&self) -> usize {
        ((self.number - 1) as usize) * self.limit as usize
    }

    /// Total number of pages for a given record count.
    #[must_use]
    pub fn total_pages(&self, total_records: u64) -> u64 {
        total_records.div_ceil(u64::from(self.limit))
    }
}
