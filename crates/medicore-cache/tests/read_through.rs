//! Read-through behavior over a real in-memory source-of-record.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use medicore_cache::reads::{
    ListParams, get_all_patients, get_appointment_by_id, get_patient_by_id,
    get_patient_full_data_by_id, get_rating_by_id,
};
use medicore_cache::{CacheContext, DynKeyValueStore, Envelope, KeyValueStore, KvError, MemoryStore};
use medicore_core::Model;
use medicore_db_memory::InMemoryRecordStore;
use medicore_storage::{Filter, Page, RecordStore, Sort, StorageError, StoredRecord};
use serde_json::{Value, json};

/// Wraps a record store and counts queries so tests can assert the source
/// was not touched on a cache hit.
struct CountingStore {
    inner: InMemoryRecordStore,
    queries: AtomicU64,
}

impl CountingStore {
    fn new(inner: InMemoryRecordStore) -> Self {
        Self {
            inner,
            queries: AtomicU64::new(0),
        }
    }

    fn queries(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn find_one(
        &self,
        model: Model,
        filter: &Filter,
    ) -> Result<Option<StoredRecord>, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.find_one(model, filter).await
    }

    async fn find_many(
        &self,
        model: Model,
        filter: &Filter,
        sort: Option<&Sort>,
        page: Option<&Page>,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.find_many(model, filter, sort, page).await
    }

    async fn count(&self, model: Model, filter: &Filter) -> Result<u64, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.count(model, filter).await
    }

    async fn create(&self, model: Model, data: Value) -> Result<StoredRecord, StorageError> {
        self.inner.create(model, data).await
    }

    async fn update(
        &self,
        model: Model,
        filter: &Filter,
        data: Value,
    ) -> Result<StoredRecord, StorageError> {
        self.inner.update(model, filter, data).await
    }

    async fn delete(&self, model: Model, filter: &Filter) -> Result<StoredRecord, StorageError> {
        self.inner.delete(model, filter).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// A key-value store that always fails, for outage tests.
struct DownStore;

#[async_trait]
impl KeyValueStore for DownStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::unavailable("connection refused"))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), KvError> {
        Err(KvError::unavailable("connection refused"))
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, KvError> {
        Err(KvError::unavailable("connection refused"))
    }

    async fn scan_keys(&self, _pattern: &str) -> Result<Vec<String>, KvError> {
        Err(KvError::unavailable("connection refused"))
    }

    fn backend_name(&self) -> &'static str {
        "down"
    }
}

/// Reports a miss on the first `get`, then delegates. Lets a test drive
/// the miss-then-source-failure path while a value already sits at the key.
struct MissOnceStore {
    inner: MemoryStore,
    missed: AtomicBool,
}

impl MissOnceStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            missed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl KeyValueStore for MissOnceStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        if !self.missed.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        self.inner.set_ex(key, value, ttl).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, KvError> {
        self.inner.delete(keys).await
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        self.inner.scan_keys(pattern).await
    }

    fn backend_name(&self) -> &'static str {
        "miss-once"
    }
}

/// A source-of-record that always fails, for stale-fallback tests.
struct BrokenSource;

#[async_trait]
impl RecordStore for BrokenSource {
    async fn find_one(
        &self,
        _model: Model,
        _filter: &Filter,
    ) -> Result<Option<StoredRecord>, StorageError> {
        Err(StorageError::connection_error("database is down"))
    }

    async fn find_many(
        &self,
        _model: Model,
        _filter: &Filter,
        _sort: Option<&Sort>,
        _page: Option<&Page>,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        Err(StorageError::connection_error("database is down"))
    }

    async fn count(&self, _model: Model, _filter: &Filter) -> Result<u64, StorageError> {
        Err(StorageError::connection_error("database is down"))
    }

    async fn create(&self, _model: Model, _data: Value) -> Result<StoredRecord, StorageError> {
        Err(StorageError::connection_error("database is down"))
    }

    async fn update(
        &self,
        _model: Model,
        _filter: &Filter,
        _data: Value,
    ) -> Result<StoredRecord, StorageError> {
        Err(StorageError::connection_error("database is down"))
    }

    async fn delete(
        &self,
        _model: Model,
        _filter: &Filter,
    ) -> Result<StoredRecord, StorageError> {
        Err(StorageError::connection_error("database is down"))
    }

    fn backend_name(&self) -> &'static str {
        "broken"
    }
}

async fn seeded_source() -> InMemoryRecordStore {
    let db = InMemoryRecordStore::new();
    db.create(
        Model::Patient,
        json!({"id": "p1", "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com", "gender": "FEMALE"}),
    )
    .await
    .unwrap();
    db.create(
        Model::Doctor,
        json!({"id": "d1", "name": "Dr. Grace Hopper", "specialization": "Cardiology"}),
    )
    .await
    .unwrap();
    db.create(
        Model::Appointment,
        json!({"id": "a1", "patient_id": "p1", "doctor_id": "d1", "status": "SCHEDULED", "appointment_date": "2026-08-20T09:00:00Z"}),
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn second_read_is_served_from_cache() {
    let db = CountingStore::new(seeded_source().await);
    let ctx = CacheContext::in_memory();

    let first = get_patient_by_id(&ctx, &db, "p1").await;
    assert!(first.success);
    assert_eq!(first.status, 200);
    let queries_after_first = db.queries();
    assert!(queries_after_first > 0);

    let second = get_patient_by_id(&ctx, &db, "p1").await;
    assert!(second.success);
    assert_eq!(second.data, first.data);
    assert_eq!(db.queries(), queries_after_first, "hit must not touch the source");
}

#[tokio::test]
async fn negative_results_are_cached() {
    let db = CountingStore::new(seeded_source().await);
    let ctx = CacheContext::in_memory();

    let first = get_patient_by_id(&ctx, &db, "missing").await;
    assert!(!first.success);
    assert_eq!(first.status, 404);
    let queries_after_first = db.queries();

    let second = get_patient_by_id(&ctx, &db, "missing").await;
    assert_eq!(second.status, 404);
    assert_eq!(db.queries(), queries_after_first, "repeated miss must be absorbed");
}

#[tokio::test]
async fn full_data_resolves_by_email_and_aggregates() {
    let db = seeded_source().await;
    let ctx = CacheContext::in_memory();

    let envelope = get_patient_full_data_by_id(&ctx, &db, "ada@example.com").await;
    assert!(envelope.success);
    let data = envelope.data.unwrap();
    assert_eq!(data["first_name"], "Ada");
    assert_eq!(data["total_appointments"], json!(1));
    assert_eq!(data["last_visit"], "2026-08-20T09:00:00Z");
}

#[tokio::test]
async fn appointment_read_joins_participants() {
    let db = seeded_source().await;
    let ctx = CacheContext::in_memory();

    let envelope = get_appointment_by_id(&ctx, &db, "a1").await;
    assert!(envelope.success);
    let data = envelope.data.unwrap();
    assert_eq!(data["patient"]["first_name"], "Ada");
    assert_eq!(data["doctor"]["name"], "Dr. Grace Hopper");
}

#[tokio::test]
async fn list_reads_paginate_and_search() {
    let db = seeded_source().await;
    for i in 0..14 {
        db.create(
            Model::Patient,
            json!({"first_name": format!("Pat{i:02}"), "last_name": "Smith", "email": format!("pat{i}@example.com")}),
        )
        .await
        .unwrap();
    }
    let ctx = CacheContext::in_memory();

    let page_two = get_all_patients(&ctx, &db, &ListParams::page(2)).await;
    assert!(page_two.success);
    assert_eq!(page_two.current_page, Some(2));
    assert_eq!(page_two.total_records, Some(15));
    assert_eq!(page_two.total_pages, Some(2));
    assert_eq!(page_two.data.unwrap().as_array().unwrap().len(), 5);

    let searched = get_all_patients(&ctx, &db, &ListParams::page(1).with_search("lovelace")).await;
    let data = searched.data.unwrap();
    assert_eq!(data.as_array().unwrap().len(), 1);
    assert_eq!(data[0]["first_name"], "Ada");
}

#[tokio::test]
async fn ratings_average_is_rounded() {
    let db = seeded_source().await;
    for (patient, rating) in [("p1", 4), ("p1", 5), ("p1", 5)] {
        db.create(
            Model::Rating,
            json!({"staff_id": "d1", "patient_id": patient, "rating": rating}),
        )
        .await
        .unwrap();
    }
    let ctx = CacheContext::in_memory();

    let envelope = get_rating_by_id(&ctx, &db, "d1").await;
    assert!(envelope.success);
    let data = envelope.data.unwrap();
    assert_eq!(data["total_ratings"], json!(3));
    assert_eq!(data["average_rating"], json!(4.7));
}

#[tokio::test]
async fn store_outage_degrades_to_direct_reads() {
    let db = CountingStore::new(seeded_source().await);
    let kv: DynKeyValueStore = Arc::new(DownStore);
    let ctx = CacheContext::with_store(kv, medicore_cache::TtlPolicy::default());

    let first = get_patient_by_id(&ctx, &db, "p1").await;
    assert!(first.success);
    let queries_after_first = db.queries();

    // With the store down every read goes to the source.
    let second = get_patient_by_id(&ctx, &db, "p1").await;
    assert!(second.success);
    assert!(db.queries() > queries_after_first);
}

#[tokio::test]
async fn source_failure_after_population_serves_stale() {
    let kv: DynKeyValueStore = Arc::new(MemoryStore::new());
    let ctx = CacheContext::with_store(kv.clone(), medicore_cache::TtlPolicy::default());

    // Populate through a healthy source, then break it.
    let healthy = seeded_source().await;
    let populated = get_patient_by_id(&ctx, &healthy, "p1").await;
    assert!(populated.success);

    // Hit path still works: entry is fresh.
    let from_cache = get_patient_by_id(&ctx, &BrokenSource, "p1").await;
    assert!(from_cache.success);
    assert_eq!(from_cache.data, populated.data);
}

#[tokio::test]
async fn miss_with_source_down_falls_back_to_stale_entry() {
    let stale = Envelope::ok(json!({"id": "p1", "first_name": "Ada"}));
    let inner = MemoryStore::new();
    inner
        .set_ex(
            "patient:p1",
            &stale.to_cache_value().unwrap(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let kv: DynKeyValueStore = Arc::new(MissOnceStore::new(inner));
    let ctx = CacheContext::with_store(kv, medicore_cache::TtlPolicy::default());

    // First get misses, the source fails, and the second get finds the
    // entry that was still sitting at the key.
    let envelope = get_patient_by_id(&ctx, &BrokenSource, "p1").await;
    assert!(envelope.success);
    assert_eq!(envelope.data.unwrap()["first_name"], "Ada");
}

#[tokio::test]
async fn source_failure_without_cache_is_a_500() {
    let ctx = CacheContext::in_memory();
    let envelope = get_patient_by_id(&ctx, &BrokenSource, "p1").await;
    assert!(!envelope.success);
    assert_eq!(envelope.status, 500);
}

#[tokio::test]
async fn corrupt_entry_is_dropped_and_reloaded() {
    let db = seeded_source().await;
    let kv: DynKeyValueStore = Arc::new(MemoryStore::new());
    let ctx = CacheContext::with_store(kv.clone(), medicore_cache::TtlPolicy::default());

    kv.set_ex("patient:p1", "{not json", Duration::from_secs(60))
        .await
        .unwrap();

    let envelope = get_patient_by_id(&ctx, &db, "p1").await;
    assert!(envelope.success);
    assert_eq!(envelope.data.as_ref().unwrap()["first_name"], "Ada");

    // The corrupt entry was replaced by a good one.
    let raw = kv.get("patient:p1").await.unwrap().unwrap();
    assert!(serde_json::from_str::<Value>(&raw).is_ok());
}
