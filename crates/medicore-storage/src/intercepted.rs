//! InterceptedStore - a record store decorator that observes every write.
//!
//! The decorator delegates all operations to an inner `RecordStore` and,
//! after each **successful** mutating operation, builds a `WriteEvent` and
//! awaits every registered `WriteHook` exactly once. Hooks therefore run
//! before the mutating call returns to its caller, but their failures are
//! logged and never fail the underlying write.
//!
//! Identifiers are extracted preferring the write payload, then the filter
//! clause, then the returned record.
//!
//! # Example
//!
//! ```ignore
//! use medicore_storage::InterceptedStore;
//!
//! let db = InterceptedStore::new(memory_store).with_hook(invalidation_hook);
//!
//! // Every hook has completed by the time this returns.
//! db.update(Model::Patient, &Filter::by_id("p1"), payload).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use medicore_core::{AffectedIds, Model, WriteAction, WriteEvent, WriteHook};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::traits::RecordStore;
use crate::types::{Filter, Page, Sort, StoredRecord};

/// A record store decorator that notifies write hooks after each mutation.
pub struct InterceptedStore<S: RecordStore> {
    /// The inner store implementation.
    inner: S,
    /// Hooks awaited after each successful write.
    hooks: Vec<Arc<dyn WriteHook>>,
}

impl<S: RecordStore> InterceptedStore<S> {
    /// Create a new interceptor with no hooks.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            hooks: Vec::new(),
        }
    }

    /// Register a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn WriteHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Get a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn notify(&self, event: WriteEvent) {
        for hook in &self.hooks {
            if !hook.matches(&event) {
                continue;
            }
            if let Err(e) = hook.handle(&event).await {
                warn!(
                    hook = hook.name(),
                    model = %event.model,
                    action = %event.action,
                    error = %e,
                    "write hook failed; continuing"
                );
            }
        }
        debug!(
            model = %event.model,
            action = %event.action,
            hooks = self.hooks.len(),
            "write event dispatched"
        );
    }

    fn extract_ids(
        model: Model,
        payload: Option<&Value>,
        filter: Option<&Filter>,
        stored: &StoredRecord,
    ) -> AffectedIds {
        let payload_str = |name: &str| {
            payload
                .and_then(|p| p.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let filter_str =
            |name: &str| filter.and_then(|f| f.get(name)).map(str::to_string);
        let pick = |name: &str| {
            payload_str(name)
                .or_else(|| filter_str(name))
                .or_else(|| stored.field_str(name).map(str::to_string))
        };

        let mut ids = AffectedIds {
            record_id: payload_str("id")
                .or_else(|| filter.and_then(|f| f.id()).map(str::to_string))
                .or_else(|| Some(stored.id.clone())),
            patient_id: pick("patient_id"),
            doctor_id: pick("doctor_id"),
            appointment_id: pick("appointment_id"),
        };

        // Ratings reference their doctor through the staff_id column.
        if model == Model::Rating && ids.doctor_id.is_none() {
            ids.doctor_id = pick("staff_id");
        }

        ids
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for InterceptedStore<S> {
    async fn find_one(
        &self,
        model: Model,
        filter: &Filter,
    ) -> Result<Option<StoredRecord>, StorageError> {
        // Reads are not observed.
        self.inner.find_one(model, filter).await
    }

    async fn find_many(
        &self,
        model: Model,
        filter: &Filter,
        sort: Option<&Sort>,
        page: Option<&Page>,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        self.inner.find_many(model, filter, sort, page).await
    }

    async fn count(&self, model: Model, filter: &Filter) -> Result<u64, StorageError> {
        self.inner.count(model, filter).await
    }

    async fn create(&self, model: Model, data: Value) -> Result<StoredRecord, StorageError> {
        let stored = self.inner.create(model, data.clone()).await?;
        let ids = Self::extract_ids(model, Some(&data), None, &stored);
        self.notify(WriteEvent::new(model, WriteAction::Create, ids))
            .await;
        Ok(stored)
    }

    async fn update(
        &self,
        model: Model,
        filter: &Filter,
        data: Value,
    ) -> Result<StoredRecord, StorageError> {
        let stored = self.inner.update(model, filter, data.clone()).await?;
        let ids = Self::extract_ids(model, Some(&data), Some(filter), &stored);
        self.notify(WriteEvent::new(model, WriteAction::Update, ids))
            .await;
        Ok(stored)
    }

    async fn delete(&self, model: Model, filter: &Filter) -> Result<StoredRecord, StorageError> {
        let stored = self.inner.delete(model, filter).await?;
        let ids = Self::extract_ids(model, None, Some(filter), &stored);
        self.notify(WriteEvent::new(model, WriteAction::Delete, ids))
            .await;
        Ok(stored)
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medicore_core::HookError;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockStore;

    #[async_trait]
    impl RecordStore for MockStore {
        async fn find_one(
            &self,
            _model: Model,
            _filter: &Filter,
        ) -> Result<Option<StoredRecord>, StorageError> {
            Ok(None)
        }

        async fn find_many(
            &self,
            _model: Model,
            _filter: &Filter,
            _sort: Option<&Sort>,
            _page: Option<&Page>,
        ) -> Result<Vec<StoredRecord>, StorageError> {
            Ok(Vec::new())
        }

        async fn count(&self, _model: Model, _filter: &Filter) -> Result<u64, StorageError> {
            Ok(0)
        }

        async fn create(&self, model: Model, data: Value) -> Result<StoredRecord, StorageError> {
            let id = data
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("generated")
                .to_string();
            Ok(StoredRecord::new(id, model, data))
        }

        async fn update(
            &self,
            model: Model,
            filter: &Filter,
            data: Value,
        ) -> Result<StoredRecord, StorageError> {
            let id = filter.id().unwrap_or("generated").to_string();
            Ok(StoredRecord::new(id, model, data))
        }

        async fn delete(
            &self,
            model: Model,
            filter: &Filter,
        ) -> Result<StoredRecord, StorageError> {
            let id = filter.id().unwrap_or("generated").to_string();
            Ok(StoredRecord::new(id.clone(), model, json!({"id": id})))
        }

        fn backend_name(&self) -> &'static str {
            "mock"
        }
    }

    struct RecordingHook {
        events: Mutex<Vec<WriteEvent>>,
    }

    impl RecordingHook {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WriteHook for RecordingHook {
        fn name(&self) -> &str {
            "recording"
        }

        async fn handle(&self, event: &WriteEvent) -> Result<(), HookError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingHook;

    #[async_trait]
    impl WriteHook for FailingHook {
        fn name(&self) -> &str {
            "failing"
        }

        async fn handle(&self, _event: &WriteEvent) -> Result<(), HookError> {
            Err(HookError::execution("boom"))
        }
    }

    #[tokio::test]
    async fn create_emits_one_event_with_payload_ids() {
        let hook = RecordingHook::new();
        let db = InterceptedStore::new(MockStore).with_hook(hook.clone());

        db.create(
            Model::Appointment,
            json!({"id": "a1", "patient_id": "p1", "doctor_id": "d1"}),
        )
        .await
        .unwrap();

        let events = hook.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, WriteAction::Create);
        assert_eq!(events[0].ids.record_id.as_deref(), Some("a1"));
        assert_eq!(events[0].ids.patient_id.as_deref(), Some("p1"));
        assert_eq!(events[0].ids.doctor_id.as_deref(), Some("d1"));
    }

    #[tokio::test]
    async fn delete_falls_back_to_filter_ids() {
        let hook = RecordingHook::new();
        let db = InterceptedStore::new(MockStore).with_hook(hook.clone());

        db.delete(Model::Patient, &Filter::by_id("p9")).await.unwrap();

        let events = hook.events.lock().unwrap();
        assert_eq!(events[0].ids.record_id.as_deref(), Some("p9"));
    }

    #[tokio::test]
    async fn rating_doctor_id_comes_from_staff_id() {
        let hook = RecordingHook::new();
        let db = InterceptedStore::new(MockStore).with_hook(hook.clone());

        db.create(Model::Rating, json!({"staff_id": "d7", "patient_id": "p1", "rating": 4}))
            .await
            .unwrap();

        let events = hook.events.lock().unwrap();
        assert_eq!(events[0].ids.doctor_id.as_deref(), Some("d7"));
    }

    #[tokio::test]
    async fn failing_hook_does_not_fail_the_write() {
        let db = InterceptedStore::new(MockStore).with_hook(Arc::new(FailingHook));

        let result = db
            .update(Model::Doctor, &Filter::by_id("d1"), json!({"name": "Dr. X"}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn reads_are_not_observed() {
        let hook = RecordingHook::new();
        let db = InterceptedStore::new(MockStore).with_hook(hook.clone());

        db.find_one(Model::Patient, &Filter::by_id("p1")).await.unwrap();
        db.count(Model::Patient, &Filter::new()).await.unwrap();

        assert!(hook.events.lock().unwrap().is_empty());
    }
}
