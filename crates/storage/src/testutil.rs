//! Shared test utilities for storage backend testing.
//!
//! This module provides helpers for generating records, wrapping backends
//! with fault injection, misbehaving publishers, and assertion macros for
//! [`StorageResult`] values. It is feature-gated behind `testutil` to prevent
//! leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! todo-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use todo_storage::testutil::{FaultyBackend, make_record, populated_backend};
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    StorageBackend,
    error::{StorageError, StorageResult},
    memory::MemoryBackend,
    publisher::{EventPublisher, PublishError},
    types::Record,
};

/// Create a deterministic test record from an index.
///
/// Produces ids like `"todo-007"` with title `"Task 7"`.
#[must_use]
pub fn make_record(idx: usize) -> Record {
    Record::new(format!("todo-{idx:03}"), format!("Task {idx}"))
}

/// Create a [`MemoryBackend`] pre-populated with `count` records.
///
/// Records are built with [`make_record`] and the backend capacity is
/// `max_entries`.
///
/// # Panics
///
/// Panics if any insert fails, e.g. when `count > max_entries`.
pub async fn populated_backend(count: usize, max_entries: usize) -> MemoryBackend {
    let backend = MemoryBackend::new(max_entries);
    for i in 0..count {
        backend.create(make_record(i)).await.expect("populate create failed");
    }
    backend
}

/// Backend wrapper that records every call and can be told to fail.
///
/// Reads (`get`, `get_all`) and writes (`create`, `update`, `delete`) fail
/// independently with [`StorageError::StoreUnavailable`]. A failed call is
/// still recorded, and is never forwarded to the inner backend.
#[derive(Debug)]
pub struct FaultyBackend<S> {
    inner: S,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
}

impl<S: StorageBackend> FaultyBackend<S> {
    /// Wraps `inner` with all faults disabled.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Makes `get` and `get_all` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `create`, `update` and `delete` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the names of the operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn enter(&self, op: &'static str, flag: &AtomicBool) -> StorageResult<()> {
        self.calls.lock().push(op);
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::store_unavailable(format!("injected {op} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: StorageBackend> StorageBackend for FaultyBackend<S> {
    async fn create(&self, record: Record) -> StorageResult<Record> {
        self.enter("create", &self.fail_writes)?;
        self.inner.create(record).await
    }

    async fn update(&self, record: Record) -> StorageResult<Record> {
        self.enter("update", &self.fail_writes)?;
        self.inner.update(record).await
    }

    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        self.enter("get_all", &self.fail_reads)?;
        self.inner.get_all().await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        self.enter("get", &self.fail_reads)?;
        self.inner.get(id).await
    }

    async fn delete(&self, id: &str) -> StorageResult<String> {
        self.enter("delete", &self.fail_writes)?;
        self.inner.delete(id).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}

/// Publisher that rejects every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, topic: &str, _payload: Vec<u8>) -> Result<(), PublishError> {
        Err(PublishError::rejected(topic, "broker unreachable"))
    }
}

/// Publisher that never completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledPublisher;

#[async_trait]
impl EventPublisher for StalledPublisher {
    async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), PublishError> {
        std::future::pending().await
    }
}

/// Assert that a [`StorageResult`] is a [`StorageError::CapacityExceeded`].
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use todo_storage::assert_capacity_exceeded;
/// use todo_storage::error::{StorageError, StorageResult};
///
/// let result: StorageResult<()> = Err(StorageError::capacity_exceeded(2));
/// assert_capacity_exceeded!(result);
/// ```
#[macro_export]
macro_rules! assert_capacity_exceeded {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::CapacityExceeded { .. })),
            "expected StorageError::CapacityExceeded, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::CapacityExceeded { .. })),
            "{}: expected StorageError::CapacityExceeded, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Assert that a [`StorageResult`] is a [`StorageError::StoreUnavailable`].
#[macro_export]
macro_rules! assert_store_unavailable {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::StoreUnavailable { .. })),
            "expected StorageError::StoreUnavailable, got: {:?}",
            $result,
        );
    };
}

/// Assert that a [`StorageResult`] is `Ok`.
///
/// Returns the inner value on success, panics with a descriptive message
/// on failure.
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

/// Assert that a [`StorageResult`] contains a [`StorageError::Timeout`].
#[macro_export]
macro_rules! assert_timeout {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::Timeout)),
            "expected StorageError::Timeout, got: {:?}",
            $result,
        );
    };
}
