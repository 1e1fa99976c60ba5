//! # medicore-db-memory
//!
//! In-memory [`RecordStore`](medicore_storage::RecordStore) backend.
//!
//! Records live in a concurrent map keyed `Model/id`; filters, sorting,
//! and pagination are evaluated in process. This backend is the default
//! source-of-record for tests and local development.

mod store;

pub use store::InMemoryRecordStore;
