//! In-memory storage backend implementation.
//!
//! This module provides [`MemoryBackend`], a bounded, process-local
//! implementation of [`StorageBackend`].
//!
//! # Features
//!
//! - **Thread-safe**: One [`parking_lot::RwLock`] guards the whole map. Reads run concurrently
//!   with each other; writes are exclusive.
//! - **Hard cap**: Inserting a new id into a full backend fails with
//!   [`StorageError::CapacityExceeded`]. Nothing is evicted.
//! - **Owned state**: Each backend owns its map. Clones share it; separately constructed backends
//!   never do.
//!
//! # Example
//!
//! ```
//! use todo_storage::{MemoryBackend, Record, StorageBackend, StorageError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new(1);
//!
//!     backend.create(Record::new("a", "first")).await.unwrap();
//!     let err = backend.create(Record::new("b", "second")).await.unwrap_err();
//!     assert!(matches!(err, StorageError::CapacityExceeded { max_entries: 1 }));
//! }
//! ```
//!
//! # Limitations
//!
//! - Data is not persisted; all records are lost when the process exits
//! - Not suitable when several service instances run concurrently

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    types::Record,
};

/// Default capacity, matching the service's `--max-entries` default.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// In-memory record store backed by a [`HashMap`].
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying map and capacity.
#[derive(Clone)]
pub struct MemoryBackend {
    records: Arc<RwLock<HashMap<String, Record>>>,
    max_entries: usize,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl MemoryBackend {
    /// Creates an empty backend that holds at most `max_entries` records.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        info!(max_entries, "Creating in-memory backend");
        Self { records: Arc::new(RwLock::new(HashMap::new())), max_entries }
    }

    /// Creates an empty backend without a practical capacity limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Upsert shared by `create` and `update`.
    ///
    /// The capacity check and the insert happen under the same write lock, so
    /// concurrent inserts of distinct new ids cannot overshoot the cap.
    fn upsert(&self, record: Record) -> StorageResult<Record> {
        let mut records = self.records.write();

        if !records.contains_key(&record.id) && records.len() >= self.max_entries {
            return Err(StorageError::capacity_exceeded(self.max_entries));
        }

        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    async fn create(&self, record: Record) -> StorageResult<Record> {
        info!(title = %record.title, "Creating record");
        self.upsert(record)
    }

    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    async fn update(&self, record: Record) -> StorageResult<Record> {
        info!(title = %record.title, "Updating record");
        self.upsert(record)
    }

    #[tracing::instrument(skip(self))]
    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        let records = self.records.read();
        debug!(count = records.len(), "Listing records");
        Ok(records.values().cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        Ok(self.records.read().get(id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str) -> StorageResult<String> {
        let removed = self.records.write().remove(id);
        info!(existed = removed.is_some(), "Deleted record");
        Ok(id.to_owned())
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<()> {
        // Acquiring the lock proves the map is not wedged.
        let _unused = self.records.read();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::Status;

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let backend = MemoryBackend::new(10);
        let record = Record::builder()
            .id("1")
            .title("Buy milk")
            .description("semi-skimmed")
            .status(Status::InProgress)
            .build();

        let stored = backend.create(record.clone()).await.unwrap();
        assert_eq!(stored, record);
        assert_eq!(backend.get("1").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_upsert_is_last_write_wins() {
        let backend = MemoryBackend::new(10);
        backend.create(Record::new("1", "first")).await.unwrap();
        backend.create(Record::new("1", "second")).await.unwrap();

        let all = backend.get_all().await.unwrap();
        assert_eq!(all, vec![Record::new("1", "second")]);
    }

    #[tokio::test]
    async fn test_update_of_missing_id_inserts() {
        let backend = MemoryBackend::new(10);
        backend.update(Record::new("new", "via update")).await.unwrap();
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_rejects_third_distinct_id() {
        let backend = MemoryBackend::new(2);
        backend.create(Record::new("1", "a")).await.unwrap();
        backend.create(Record::new("2", "b")).await.unwrap();

        let err = backend.create(Record::new("3", "c")).await.unwrap_err();
        assert!(matches!(err, StorageError::CapacityExceeded { max_entries: 2 }));

        let mut ids: Vec<String> =
            backend.get_all().await.unwrap().into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_full_backend_still_accepts_replacement() {
        let backend = MemoryBackend::new(1);
        backend.create(Record::new("1", "a")).await.unwrap();
        backend.update(Record::new("1", "b")).await.unwrap();
        assert_eq!(backend.get("1").await.unwrap().unwrap().title, "b");
    }

    #[tokio::test]
    async fn test_delete_frees_capacity() {
        let backend = MemoryBackend::new(1);
        backend.create(Record::new("1", "a")).await.unwrap();
        backend.delete("1").await.unwrap();
        backend.create(Record::new("2", "b")).await.unwrap();
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_rejects_everything() {
        let backend = MemoryBackend::new(0);
        let result = backend.create(Record::new("1", "a")).await;
        assert!(matches!(result, Err(StorageError::CapacityExceeded { max_entries: 0 })));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_returns_id() {
        let backend = MemoryBackend::new(10);
        assert_eq!(backend.delete("ghost").await.unwrap(), "ghost");
    }

    #[tokio::test]
    async fn test_separate_instances_do_not_share_state() {
        let a = MemoryBackend::new(10);
        let b = MemoryBackend::new(10);
        a.create(Record::new("1", "only in a")).await.unwrap();
        assert_eq!(b.get("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let a = MemoryBackend::new(10);
        let b = a.clone();
        a.create(Record::new("1", "shared")).await.unwrap();
        assert!(b.get("1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_respect_cap() {
        let backend = MemoryBackend::new(25);
        let mut handles = Vec::new();
        for i in 0..100 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.create(Record::new(format!("id-{i}"), "x")).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.expect("task panicked").is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 25);
        assert_eq!(backend.len(), 25);
    }
}
