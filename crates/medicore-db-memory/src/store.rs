use async_trait::async_trait;
use dashmap::DashMap;
use medicore_core::Model;
use medicore_storage::{Filter, Page, RecordStore, Sort, StorageError, StoredRecord};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

pub(crate) type StorageKey = String; // Format: "Model/id"

pub(crate) fn make_storage_key(model: Model, id: &str) -> StorageKey {
    format!("{model}/{id}")
}

/// In-memory source-of-record backend.
///
/// Stores records in a concurrent map keyed `Model/id` and evaluates
/// filters, sorting, and pagination in process. Intended for tests and
/// development; a relational backend implements the same trait in
/// production.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    data: Arc<DashMap<StorageKey, StoredRecord>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all models.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn field_as_string(record: &StoredRecord, field: &str) -> Option<String> {
        if field == "id" {
            return Some(record.id.clone());
        }
        match record.field(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn matches(record: &StoredRecord, filter: &Filter) -> bool {
        for (field, value) in filter.eq_conditions() {
            match Self::field_as_string(record, field) {
                Some(v) if v == *value => {}
                _ => return false,
            }
        }

        let any = filter.any_eq_conditions();
        if !any.is_empty() {
            let hit = any.iter().any(|(field, value)| {
                Self::field_as_string(record, field).as_deref() == Some(value)
            });
            if !hit {
                return false;
            }
        }

        if let Some(search) = filter.search_term() {
            let term = search.term.to_lowercase();
            let hit = search.fields.iter().any(|field| {
                Self::field_as_string(record, field)
                    .map(|v| v.to_lowercase().contains(&term))
                    .unwrap_or(false)
            });
            if !hit {
                return false;
            }
        }

        true
    }

    fn compare(a: &StoredRecord, b: &StoredRecord, sort: &Sort) -> Ordering {
        let va = Self::field_as_string(a, &sort.field);
        let vb = Self::field_as_string(b, &sort.field);
        let ord = match (va, vb) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if sort.descending { ord.reverse() } else { ord }
    }

    fn collect(&self, model: Model, filter: &Filter) -> Vec<StoredRecord> {
        let prefix = format!("{model}/");
        self.data
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .filter(|entry| Self::matches(entry.value(), filter))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_one(
        &self,
        model: Model,
        filter: &Filter,
    ) -> Result<Option<StoredRecord>, StorageError> {
        // Fast path for pure id lookups.
        if let Some(id) = filter.id()
            && filter.eq_conditions().len() == 1
            && filter.any_eq_conditions().is_empty()
            && filter.search_term().is_none()
        {
            return Ok(self
                .data
                .get(&make_storage_key(model, id))
                .map(|entry| entry.value().clone()));
        }

        let mut matches = self.collect(model, filter);
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches.into_iter().next())
    }

    async fn find_many(
        &self,
        model: Model,
        filter: &Filter,
        sort: Option<&Sort>,
        page: Option<&Page>,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let mut matches = self.collect(model, filter);
        match sort {
            Some(sort) => matches.sort_by(|a, b| Self::compare(a, b, sort)),
            None => matches.sort_by(|a, b| a.id.cmp(&b.id)),
        }
        if let Some(page) = page {
            matches = matches
                .into_iter()
                .skip(page.skip())
                .take(page.limit as usize)
                .collect();
        }
        Ok(matches)
    }

    async fn count(&self, model: Model, filter: &Filter) -> Result<u64, StorageError> {
        Ok(self.collect(model, filter).len() as u64)
    }

    async fn create(&self, model: Model, data: Value) -> Result<StoredRecord, StorageError> {
        let mut object = match data {
            Value::Object(map) => map,
            _ => return Err(StorageError::invalid_record("record payload must be an object")),
        };
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                object.insert("id".into(), Value::String(id.clone()));
                id
            }
        };
        let stored = StoredRecord::new(id.clone(), model, Value::Object(object));
        self.data.insert(make_storage_key(model, &id), stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        model: Model,
        filter: &Filter,
        data: Value,
    ) -> Result<StoredRecord, StorageError> {
        let existing = self.find_one(model, filter).await?.ok_or_else(|| {
            StorageError::not_found(model.as_str(), filter.id().unwrap_or("?"))
        })?;

        let patch = match data {
            Value::Object(map) => map,
            _ => return Err(StorageError::invalid_record("update payload must be an object")),
        };

        let mut record = existing.record.clone();
        if let Value::Object(target) = &mut record {
            for (k, v) in patch {
                target.insert(k, v);
            }
        }

        let stored = StoredRecord {
            record,
            updated_at: OffsetDateTime::now_utc(),
            ..existing
        };
        self.data
            .insert(make_storage_key(model, &stored.id), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, model: Model, filter: &Filter) -> Result<StoredRecord, StorageError> {
        let existing = self.find_one(model, filter).await?.ok_or_else(|| {
            StorageError::not_found(model.as_str(), filter.id().unwrap_or("?"))
        })?;
        self.data.remove(&make_storage_key(model, &existing.id));
        Ok(existing)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
