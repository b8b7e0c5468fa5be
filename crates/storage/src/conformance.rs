//! Conformance test suite for [`StorageBackend`] implementations.
//!
//! This module provides async test functions that check whether a
//! [`StorageBackend`] implementation satisfies the trait contract. The
//! memory backend, the Redis backend and every decorator run the same suite.
//!
//! Each function expects a fresh, empty backend with room for at least
//! [`MIN_CAPACITY`] records.
//!
//! # Usage
//!
//! Enable the `testutil` feature and call each conformance function with
//! a fresh backend instance:
//!
//! ```no_run
//! use todo_storage::conformance;
//! use todo_storage::MemoryBackend;
//!
//! #[tokio::test]
//! async fn crud_get_returns_none_for_missing_id() {
//!     conformance::crud_get_returns_none_for_missing_id(&MemoryBackend::new(100)).await;
//! }
//! ```
//!
//! # Test Categories
//!
//! | Category | Contract aspect |
//! |----------|-----------------|
//! | CRUD | Round trip, upsert, delete semantics |
//! | Listing | `get_all` completeness |
//! | Concurrent | Thread-safety under parallel access |
//! | Health | `health_check` on a fresh backend |

use std::{collections::HashSet, sync::Arc};

use crate::{
    backend::StorageBackend,
    types::{Record, Status},
};

/// Smallest capacity the suite needs.
pub const MIN_CAPACITY: usize = 32;

fn full_record(id: &str) -> Record {
    Record::builder()
        .id(id)
        .title("Buy milk")
        .description("two litres, semi-skimmed")
        .status(Status::InProgress)
        .build()
}

async fn ids<B: StorageBackend + ?Sized>(backend: &B) -> Vec<String> {
    let mut ids: Vec<String> =
        backend.get_all().await.expect("get_all").into_iter().map(|r| r.id).collect();
    ids.sort();
    ids
}

// ============================================================================
// CRUD
// ============================================================================

/// `get` on an unknown id returns `Ok(None)`.
pub async fn crud_get_returns_none_for_missing_id<B: StorageBackend + ?Sized>(backend: &B) {
    let result = backend.get("nonexistent").await;
    assert!(result.is_ok(), "get should not error on missing id: {result:?}");
    assert_eq!(result.expect("checked above"), None, "missing id should return None");
}

/// `create` then `get` returns a record equal to the input, field for field.
pub async fn crud_create_then_get_round_trips<B: StorageBackend + ?Sized>(backend: &B) {
    let record = full_record("rt-1");
    let stored = backend.create(record.clone()).await.expect("create");
    assert_eq!(stored, record, "create should return the stored record");
    let fetched = backend.get("rt-1").await.expect("get");
    assert_eq!(fetched, Some(record));
}

/// A record with no status round-trips with no status.
pub async fn crud_unset_status_round_trips<B: StorageBackend + ?Sized>(backend: &B) {
    let record = Record::new("rt-2", "no status");
    backend.create(record.clone()).await.expect("create");
    assert_eq!(backend.get("rt-2").await.expect("get"), Some(record));
}

/// A second write to the same id replaces the first; the id is listed once.
pub async fn crud_create_is_last_write_wins<B: StorageBackend + ?Sized>(backend: &B) {
    backend.create(Record::new("lww", "first")).await.expect("first create");
    backend.create(Record::new("lww", "second")).await.expect("second create");

    let fetched = backend.get("lww").await.expect("get");
    assert_eq!(fetched.map(|r| r.title), Some("second".to_owned()));

    let listed = backend.get_all().await.expect("get_all");
    assert_eq!(listed.iter().filter(|r| r.id == "lww").count(), 1, "id must be listed once");
}

/// `update` of an id that was never created inserts it.
pub async fn crud_update_missing_id_inserts<B: StorageBackend + ?Sized>(backend: &B) {
    let record = Record::new("upd-new", "via update");
    let stored = backend.update(record.clone()).await.expect("update");
    assert_eq!(stored, record);
    assert_eq!(backend.get("upd-new").await.expect("get"), Some(record));
}

/// `update` replaces every field of an existing record.
pub async fn crud_update_replaces_all_fields<B: StorageBackend + ?Sized>(backend: &B) {
    backend.create(full_record("upd-1")).await.expect("create");
    let replacement = Record::builder().id("upd-1").title("renamed").status(Status::Completed).build();
    backend.update(replacement.clone()).await.expect("update");
    assert_eq!(backend.get("upd-1").await.expect("get"), Some(replacement));
}

/// `delete` removes a record and returns its id.
pub async fn crud_delete_removes_record<B: StorageBackend + ?Sized>(backend: &B) {
    backend.create(Record::new("del-1", "doomed")).await.expect("create");
    let deleted = backend.delete("del-1").await.expect("delete");
    assert_eq!(deleted, "del-1");
    assert_eq!(backend.get("del-1").await.expect("get after delete"), None);
}

/// `delete` on an unknown id succeeds, returns the id and leaves the
/// listing unchanged.
pub async fn crud_delete_missing_is_noop<B: StorageBackend + ?Sized>(backend: &B) {
    backend.create(Record::new("keep-1", "survivor")).await.expect("create");
    let mut before = backend.get_all().await.expect("get_all before");
    before.sort_by(|a, b| a.id.cmp(&b.id));

    let result = backend.delete("ghost").await;
    assert_eq!(result.expect("delete of missing id should succeed"), "ghost");

    let mut after = backend.get_all().await.expect("get_all after");
    after.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(after, before);
}

/// Deleting twice is idempotent.
pub async fn crud_idempotent_delete<B: StorageBackend + ?Sized>(backend: &B) {
    backend.create(Record::new("del-2", "v")).await.expect("create");
    backend.delete("del-2").await.expect("first delete");
    backend.delete("del-2").await.expect("second delete should be a no-op");
    assert_eq!(backend.get("del-2").await.expect("get"), None);
}

// ============================================================================
// Listing
// ============================================================================

/// `get_all` returns exactly the set of live ids after a mixed sequence.
pub async fn listing_reflects_live_ids<B: StorageBackend + ?Sized>(backend: &B) {
    for id in ["ls-a", "ls-b", "ls-c"] {
        backend.create(Record::new(id, id)).await.expect("create");
    }
    backend.update(Record::new("ls-b", "changed")).await.expect("update");
    backend.delete("ls-a").await.expect("delete");

    let listed: Vec<String> = ids(backend).await.into_iter().filter(|id| id.starts_with("ls-")).collect();
    assert_eq!(listed, vec!["ls-b".to_owned(), "ls-c".to_owned()]);
}

/// The end-to-end scenario: create 1 and 2, update 1, delete 2.
pub async fn listing_create_update_delete_scenario<B: StorageBackend + ?Sized>(backend: &B) {
    backend.create(Record::new("sc-1", "Buy milk")).await.expect("create 1");
    backend.create(Record::new("sc-2", "Walk dog")).await.expect("create 2");
    backend.update(Record::new("sc-1", "Buy oat milk")).await.expect("update 1");
    backend.delete("sc-2").await.expect("delete 2");

    let remaining: Vec<Record> = backend
        .get_all()
        .await
        .expect("get_all")
        .into_iter()
        .filter(|r| r.id.starts_with("sc-"))
        .collect();
    assert_eq!(remaining, vec![Record::new("sc-1", "Buy oat milk")]);
}

// ============================================================================
// Concurrent
// ============================================================================

/// Parallel creates of distinct ids all land.
pub async fn concurrent_creates_to_different_ids<B: StorageBackend + ?Sized + 'static>(
    backend: Arc<B>,
) {
    let mut handles = Vec::new();
    for task in 0..8 {
        let backend = Arc::clone(&backend);
        handles.push(tokio::spawn(async move {
            backend
                .create(Record::new(format!("cc-{task}"), format!("task {task}")))
                .await
                .expect("concurrent create");
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }

    let listed: HashSet<String> = ids(backend.as_ref()).await.into_iter().collect();
    for task in 0..8 {
        assert!(listed.contains(&format!("cc-{task}")), "cc-{task} missing after concurrent create");
    }
}

/// Parallel writers to one id leave exactly one of the written values.
pub async fn concurrent_writes_to_same_id<B: StorageBackend + ?Sized + 'static>(backend: Arc<B>) {
    let mut handles = Vec::new();
    for task in 0..8 {
        let backend = Arc::clone(&backend);
        handles.push(tokio::spawn(async move {
            backend.update(Record::new("cw", format!("writer {task}"))).await.expect("update");
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }

    let record = backend.get("cw").await.expect("get").expect("record should exist");
    let title = record.title.strip_prefix("writer ").expect("title written by a writer");
    assert!(title.parse::<u32>().is_ok_and(|n| n < 8), "unexpected title {}", record.title);
}

// ============================================================================
// Health
// ============================================================================

/// `health_check` succeeds on a fresh backend.
pub async fn health_check_succeeds<B: StorageBackend + ?Sized>(backend: &B) {
    let result = backend.health_check().await;
    assert!(result.is_ok(), "fresh backend should be healthy: {result:?}");
}

// ============================================================================
// Convenience runner
// ============================================================================

/// Run the full conformance suite against the given backend.
///
/// Test ids use distinct prefixes, so the checks can share one backend.
///
/// ```no_run
/// use std::sync::Arc;
/// use todo_storage::conformance;
/// use todo_storage::MemoryBackend;
///
/// #[tokio::test]
/// async fn memory_backend_conformance() {
///     conformance::run_all(Arc::new(MemoryBackend::new(100))).await;
/// }
/// ```
pub async fn run_all<B: StorageBackend + ?Sized + 'static>(backend: Arc<B>) {
    crud_get_returns_none_for_missing_id(backend.as_ref()).await;
    crud_create_then_get_round_trips(backend.as_ref()).await;
    crud_unset_status_round_trips(backend.as_ref()).await;
    crud_create_is_last_write_wins(backend.as_ref()).await;
    crud_update_missing_id_inserts(backend.as_ref()).await;
    crud_update_replaces_all_fields(backend.as_ref()).await;
    crud_delete_removes_record(backend.as_ref()).await;
    crud_delete_missing_is_noop(backend.as_ref()).await;
    crud_idempotent_delete(backend.as_ref()).await;

    listing_reflects_live_ids(backend.as_ref()).await;
    listing_create_update_delete_scenario(backend.as_ref()).await;

    concurrent_creates_to_different_ids(Arc::clone(&backend)).await;
    concurrent_writes_to_same_id(Arc::clone(&backend)).await;

    health_check_succeeds(backend.as_ref()).await;
}
