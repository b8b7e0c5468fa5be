//! Shared test utilities for Redis backend testing.
//!
//! This module provides an in-process [`MockHashStore`] and helpers that
//! build a [`RedisBackend`] over it. It is feature-gated behind `testutil`
//! to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! todo-storage-redis = { path = "../storage-redis", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use todo_storage_redis::testutil::{MockHashStore, mock_backend};
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    backend::RedisBackend,
    config::RedisBackendConfig,
    error::{RedisStorageError, Result},
    store::HashStore,
};

#[derive(Default)]
struct MockState {
    hashes: BTreeMap<String, HashMap<String, String>>,
    fail: bool,
    delay: Option<Duration>,
    calls: Vec<&'static str>,
}

/// In-memory [`HashStore`] with failure injection.
///
/// Clones share state, so a test can keep a handle for inspection after
/// moving one into a backend. `SCAN` walks keys in sorted order and returns
/// at most `count` keys per call; the cursor is the offset of the next key.
#[derive(Clone, Default)]
pub struct MockHashStore {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockHashStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockHashStore")
            .field("keys", &state.hashes.len())
            .field("fail", &state.fail)
            .field("delay", &state.delay)
            .finish()
    }
}

impl MockHashStore {
    /// Creates an empty, healthy store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every command fail with a connection-refused client error.
    pub fn fail_all(&self, fail: bool) {
        self.state.lock().fail = fail;
    }

    /// Delays every command by `delay` before it runs.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().delay = delay;
    }

    /// Stores a hash directly, bypassing the backend.
    pub fn insert_hash(&self, key: &str, fields: &[(&str, &str)]) {
        let mut state = self.state.lock();
        let hash = state.hashes.entry(key.to_owned()).or_default();
        for (field, value) in fields {
            hash.insert((*field).to_owned(), (*value).to_owned());
        }
    }

    /// Returns a copy of the hash at `key`.
    #[must_use]
    pub fn hash(&self, key: &str) -> Option<HashMap<String, String>> {
        self.state.lock().hashes.get(key).cloned()
    }

    /// Returns the commands issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    /// Forgets recorded commands.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    async fn enter(&self, command: &'static str) -> Result<()> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.push(command);
            if state.fail {
                return Err(RedisStorageError::Client(redis::RedisError::from(
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
                )));
            }
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn matches_pattern(key: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl HashStore for MockHashStore {
    async fn ping(&self) -> Result<()> {
        self.enter("PING").await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.enter("EXISTS").await?;
        Ok(self.state.lock().hashes.contains_key(key))
    }

    async fn hget_fields(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        self.enter("HMGET").await?;
        let state = self.state.lock();
        let hash = state.hashes.get(key);
        Ok(fields.iter().map(|f| hash.and_then(|h| h.get(*f).cloned())).collect())
    }

    async fn hset_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        self.enter("HSET").await?;
        self.insert_hash(key, fields);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.enter("DEL").await?;
        self.state.lock().hashes.remove(key);
        Ok(())
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        self.enter("SCAN").await?;
        let state = self.state.lock();
        let matching: Vec<&String> =
            state.hashes.keys().filter(|k| matches_pattern(k, pattern)).collect();

        let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(matching.len());
        let end = start.saturating_add(count.max(1)).min(matching.len());
        let batch = matching[start..end].iter().map(|k| (*k).clone()).collect();
        let next = if end >= matching.len() { 0 } else { end as u64 };
        Ok((next, batch))
    }
}

/// Create a [`RedisBackend`] over `store` with default configuration.
///
/// # Panics
///
/// Panics if the initial ping fails.
pub async fn mock_backend(store: MockHashStore) -> RedisBackend<MockHashStore> {
    mock_backend_with(store, &RedisBackendConfig::default()).await
}

/// Create a [`RedisBackend`] over `store` with the given configuration.
///
/// # Panics
///
/// Panics if the initial ping fails.
pub async fn mock_backend_with(
    store: MockHashStore,
    config: &RedisBackendConfig,
) -> RedisBackend<MockHashStore> {
    RedisBackend::from_store(store, config).await.expect("mock backend creation should succeed")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("todo:1", "todo:*"));
        assert!(matches_pattern("anything", "*"));
        assert!(!matches_pattern("other:1", "todo:*"));
        assert!(matches_pattern("exact", "exact"));
    }

    #[tokio::test]
    async fn test_scan_terminates_with_zero_cursor() {
        let store = MockHashStore::new();
        for i in 0..3 {
            store.insert_hash(&format!("k{i}"), &[("title", "t")]);
        }

        let (next, first) = store.scan(0, "*", 2).await.unwrap();
        assert_eq!((next, first.len()), (2, 2));
        let (next, rest) = store.scan(next, "*", 2).await.unwrap();
        assert_eq!((next, rest), (0, vec!["k2".to_owned()]));
    }

    #[tokio::test]
    async fn test_scan_of_empty_store() {
        let (next, keys) = MockHashStore::new().scan(0, "*", 10).await.unwrap();
        assert_eq!(next, 0);
        assert!(keys.is_empty());
    }
}
