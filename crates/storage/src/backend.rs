//! Storage backend trait definition.
//!
//! This module defines the [`StorageBackend`] trait, the capability every
//! record store implements. [`MemoryBackend`](crate::MemoryBackend) and the
//! Redis backend in `todo-storage-redis` are concrete variants;
//! [`ChangeNotifier`](crate::ChangeNotifier) and
//! [`MeteredBackend`](crate::MeteredBackend) are decorators that implement the
//! same trait by wrapping another backend.
//!
//! # Contract
//!
//! - `create` and `update` are both upserts keyed by `record.id`; the last write wins.
//! - `get` on an unknown id returns `Ok(None)`, not an error.
//! - `delete` on an unknown id is a successful no-op.
//! - `get_all` returns every record in unspecified order.
//!
//! The shared [`conformance`](crate::conformance) suite (behind the
//! `testutil` feature) checks these rules against any implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{error::StorageResult, types::Record};

/// Abstract record store.
///
/// Backends are expected to be thread-safe (`Send + Sync`) and support
/// concurrent operations from many request-handling tasks.
///
/// # Key Operations
///
/// | Method | Description |
/// |--------|-------------|
/// | [`create`](StorageBackend::create) | Insert or replace a record |
/// | [`update`](StorageBackend::update) | Insert or replace a record |
/// | [`get_all`](StorageBackend::get_all) | List every record |
/// | [`get`](StorageBackend::get) | Look up one record by id |
/// | [`delete`](StorageBackend::delete) | Remove a record by id |
/// | [`health_check`](StorageBackend::health_check) | Verify backend availability |
///
/// # Example
///
/// ```
/// use todo_storage::{MemoryBackend, Record, StorageBackend};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = MemoryBackend::new(10);
///
/// backend.create(Record::new("1", "Buy milk")).await.unwrap();
/// let record = backend.get("1").await.unwrap();
/// assert_eq!(record.map(|r| r.title), Some("Buy milk".to_owned()));
/// # });
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stores `record` under `record.id`, replacing any existing record.
    ///
    /// Returns the record as stored.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn create(&self, record: Record) -> StorageResult<Record>;

    /// Stores `record` under `record.id`, replacing any existing record.
    ///
    /// Storage semantics are identical to [`create`](StorageBackend::create);
    /// the distinction only matters to decorators that report the kind of
    /// change.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn update(&self, record: Record) -> StorageResult<Record>;

    /// Returns every stored record. Order is unspecified.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_all(&self) -> StorageResult<Vec<Record>>;

    /// Retrieves a record by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if the id exists
    /// - `Ok(None)` if the id doesn't exist
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, id: &str) -> StorageResult<Option<Record>>;

    /// Removes the record with the given id and returns the id.
    ///
    /// If the id doesn't exist, this is a no-op that still succeeds.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, id: &str) -> StorageResult<String>;

    /// Checks that the backend can serve traffic.
    #[must_use = "health check results indicate backend availability and must be inspected"]
    async fn health_check(&self) -> StorageResult<()>;
}

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    async fn create(&self, record: Record) -> StorageResult<Record> {
        (**self).create(record).await
    }

    async fn update(&self, record: Record) -> StorageResult<Record> {
        (**self).update(record).await
    }

    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        (**self).get_all().await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        (**self).get(id).await
    }

    async fn delete(&self, id: &str) -> StorageResult<String> {
        (**self).delete(id).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        (**self).health_check().await
    }
}

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    async fn create(&self, record: Record) -> StorageResult<Record> {
        (**self).create(record).await
    }

    async fn update(&self, record: Record) -> StorageResult<Record> {
        (**self).update(record).await
    }

    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        (**self).get_all().await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        (**self).get(id).await
    }

    async fn delete(&self, id: &str) -> StorageResult<String> {
        (**self).delete(id).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        (**self).health_check().await
    }
}
