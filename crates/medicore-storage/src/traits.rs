//! Source-of-record traits.
//!
//! `RecordStore` is the narrow contract the caching layer depends on. All
//! backends must be thread-safe (`Send + Sync`) and the trait is object-safe
//! so callers can hold a `DynRecordStore`.

use async_trait::async_trait;
use medicore_core::Model;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{Filter, Page, Sort, StoredRecord};

/// The source-of-record contract consumed by the caching layer.
///
/// # Example
///
/// ```ignore
/// use medicore_storage::{Filter, RecordStore, StorageError, StoredRecord};
///
/// async fn get_patient(db: &dyn RecordStore, id: &str) -> Result<StoredRecord, StorageError> {
///     db.find_one(Model::Patient, &Filter::by_id(id))
///         .await?
///         .ok_or_else(|| StorageError::not_found("Patient", id))
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Finds the first record matching the filter.
    ///
    /// Returns `None` if no record matches.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// records.
    async fn find_one(
        &self,
        model: Model,
        filter: &Filter,
    ) -> Result<Option<StoredRecord>, StorageError>;

    /// Finds all records matching the filter, optionally sorted and paged.
    async fn find_many(
        &self,
        model: Model,
        filter: &Filter,
        sort: Option<&Sort>,
        page: Option<&Page>,
    ) -> Result<Vec<StoredRecord>, StorageError>;

    /// Counts records matching the filter.
    async fn count(&self, model: Model, filter: &Filter) -> Result<u64, StorageError>;

    /// Creates a new record.
    ///
    /// If the payload carries no `id` field the backend generates one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` if the payload is not a JSON
    /// object.
    async fn create(&self, model: Model, data: Value) -> Result<StoredRecord, StorageError>;

    /// Updates the first record matching the filter, merging the payload
    /// into the existing record content.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record matches.
    async fn update(
        &self,
        model: Model,
        filter: &Filter,
        data: Value,
    ) -> Result<StoredRecord, StorageError>;

    /// Deletes the first record matching the filter.
    ///
    /// Returns the deleted record so identifiers remain available to
    /// observers after the row is gone.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record matches.
    async fn delete(&self, model: Model, filter: &Filter) -> Result<StoredRecord, StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
