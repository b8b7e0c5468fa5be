//! Redis-backed storage backend implementation.
//!
//! This module provides [`RedisBackend`], which implements the
//! [`StorageBackend`] trait on top of any [`HashStore`].

use async_trait::async_trait;
use todo_storage::{Record, Status, StorageBackend, StorageError, StorageResult};
use tracing::{debug, info};

use crate::{
    client::RedisClient,
    config::RedisBackendConfig,
    error::{RedisStorageError, Result},
    store::HashStore,
};

const TITLE: &str = "title";
const DESCRIPTION: &str = "description";
const STATUS: &str = "status";
const FIELDS: [&str; 3] = [TITLE, DESCRIPTION, STATUS];

/// Redis-backed implementation of [`StorageBackend`].
///
/// Each record is a hash at `{key_prefix}{id}` with the fields `title`,
/// `description` and `status` (empty when unset). Writes replace those three
/// fields and leave any others on the hash alone.
///
/// # Consistency
///
/// Nothing here is transactional. `get` is `EXISTS` followed by `HMGET`, and
/// `get_all` reads each scanned key separately, so a concurrent delete can
/// make a key disappear between the two steps; `get_all` skips such keys.
/// Writes are a single `HSET` and return the record as written.
///
/// # Thread Safety
///
/// `RedisBackend` is `Send + Sync` whenever its store is. [`RedisClient`]
/// multiplexes one managed connection across all callers.
///
/// # Example
///
/// ```no_run
/// use todo_storage::StorageBackend;
/// use todo_storage_redis::{RedisBackend, RedisBackendConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = RedisBackend::new(RedisBackendConfig::default()).await?;
/// let all = backend.get_all().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend<C = RedisClient> {
    store: C,
    key_prefix: String,
    scan_batch_size: usize,
}

impl<C> std::fmt::Debug for RedisBackend<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("key_prefix", &self.key_prefix)
            .field("scan_batch_size", &self.scan_batch_size)
            .finish_non_exhaustive()
    }
}

impl RedisBackend<RedisClient> {
    /// Connects to Redis and verifies the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid
    /// - The server cannot be reached within the connect timeout
    /// - The server does not answer `PING`
    pub async fn new(config: RedisBackendConfig) -> Result<Self> {
        config.validate()?;
        info!(
            host = config.host(),
            port = config.port(),
            user = config.username(),
            "Creating new redis backend"
        );
        let client = RedisClient::connect(&config).await?;
        Self::from_store(client, &config).await
    }
}

impl<C: HashStore> RedisBackend<C> {
    /// Creates a backend over an existing store, verifying it answers `PING`
    /// within the configured connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RedisStorageError::ConnectionFailed`] on timeout, or the
    /// store's error if the ping fails.
    pub async fn from_store(store: C, config: &RedisBackendConfig) -> Result<Self> {
        let timeout = config.connect_timeout();
        tokio::time::timeout(timeout, store.ping())
            .await
            .map_err(|_| RedisStorageError::connect_timeout(config.address(), timeout))??;
        info!("Connected to redis");

        Ok(Self {
            store,
            key_prefix: config.key_prefix().to_owned(),
            scan_batch_size: config.scan_batch_size(),
        })
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Returns the Redis key for a record id.
    #[must_use]
    pub fn key_for(&self, id: &str) -> String {
        format!("{}{id}", self.key_prefix)
    }

    fn scan_pattern(&self) -> String {
        format!("{}*", self.key_prefix)
    }

    /// Reads a record by id: `EXISTS`, then `HMGET`.
    ///
    /// # Errors
    ///
    /// Returns an error if either command fails or the stored status is not
    /// a known value.
    pub async fn read_record(&self, id: &str) -> Result<Option<Record>> {
        let key = self.key_for(id);
        if !self.store.exists(&key).await? {
            return Ok(None);
        }
        self.fetch(&key, id).await.map(Some)
    }

    /// Writes `record` in a single `HSET` of its three fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the `HSET` fails.
    pub async fn write_record(&self, record: &Record) -> Result<()> {
        let status = record.status.map(Status::as_str).unwrap_or_default();
        self.store
            .hset_fields(
                &self.key_for(&record.id),
                &[
                    (TITLE, record.title.as_str()),
                    (DESCRIPTION, record.description.as_str()),
                    (STATUS, status),
                ],
            )
            .await
    }

    /// `HMGET` the record fields. Absent fields read as empty.
    async fn fetch(&self, key: &str, id: &str) -> Result<Record> {
        let values = self.store.hget_fields(key, &FIELDS).await?;
        decode(key, id, values)
    }
}

fn decode(key: &str, id: &str, values: Vec<Option<String>>) -> Result<Record> {
    let mut values = values.into_iter().map(Option::unwrap_or_default);
    let title = values.next().unwrap_or_default();
    let description = values.next().unwrap_or_default();
    let status = match values.next().unwrap_or_default().as_str() {
        "" => None,
        name => Some(name.parse::<Status>().map_err(|e| RedisStorageError::CorruptRecord {
            key: key.to_owned(),
            message: e.to_string(),
        })?),
    };

    Ok(Record { id: id.to_owned(), title, description, status })
}

#[async_trait]
impl<C: HashStore> StorageBackend for RedisBackend<C> {
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    async fn create(&self, record: Record) -> StorageResult<Record> {
        info!(title = %record.title, "Creating record");
        self.write_record(&record).await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    async fn update(&self, record: Record) -> StorageResult<Record> {
        info!(title = %record.title, "Updating record");
        self.write_record(&record).await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        let pattern = self.scan_pattern();
        let mut records = Vec::new();
        let mut cursor = 0;

        loop {
            let (next, keys) = self
                .store
                .scan(cursor, &pattern, self.scan_batch_size)
                .await
                .map_err(StorageError::from)?;
            for key in keys {
                let Some(id) = key.strip_prefix(&self.key_prefix) else {
                    continue;
                };
                debug!(key = %key, "Found key");
                let values = self.store.hget_fields(&key, &FIELDS).await?;
                if values.iter().all(Option::is_none) && !self.store.exists(&key).await? {
                    debug!(key = %key, "Key vanished during scan");
                    continue;
                }
                records.push(decode(&key, id, values)?);
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        Ok(self.read_record(id).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str) -> StorageResult<String> {
        info!("Deleting record");
        self.store.del(&self.key_for(id)).await?;
        Ok(id.to_owned())
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<()> {
        Ok(self.store.ping().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testutil::{MockHashStore, mock_backend, mock_backend_with};

    /// Store whose key is deleted by another client right after each `HSET`.
    #[derive(Clone)]
    struct DeletedAfterWrite(MockHashStore);

    #[async_trait]
    impl HashStore for DeletedAfterWrite {
        async fn ping(&self) -> Result<()> {
            self.0.ping().await
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            self.0.exists(key).await
        }

        async fn hget_fields(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
            self.0.hget_fields(key, fields).await
        }

        async fn hset_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
            self.0.hset_fields(key, fields).await?;
            self.0.del(key).await
        }

        async fn del(&self, key: &str) -> Result<()> {
            self.0.del(key).await
        }

        async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
            self.0.scan(cursor, pattern, count).await
        }
    }

    #[tokio::test]
    async fn test_write_is_a_single_hset() {
        let store = MockHashStore::new();
        let backend = mock_backend(store.clone()).await;
        store.clear_calls();

        let created = backend.create(Record::new("1", "first")).await.unwrap();
        let updated = backend.update(Record::new("1", "second")).await.unwrap();

        assert_eq!(created, Record::new("1", "first"));
        assert_eq!(updated, Record::new("1", "second"));
        assert_eq!(store.calls(), vec!["HSET", "HSET"]);
    }

    #[tokio::test]
    async fn test_concurrent_delete_after_write_does_not_fail_create() {
        let inner = MockHashStore::new();
        let store = DeletedAfterWrite(inner.clone());
        let backend =
            RedisBackend::from_store(store, &RedisBackendConfig::default()).await.unwrap();

        let created = backend.create(Record::new("1", "mine")).await.unwrap();

        assert_eq!(created, Record::new("1", "mine"));
        assert_eq!(backend.get("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_existing_hash_without_record_fields_reads_empty() {
        let store = MockHashStore::new();
        store.insert_hash("bare", &[("owner", "someone else")]);
        let backend = mock_backend(store).await;

        let record = backend.get("bare").await.unwrap().expect("key exists");

        assert_eq!(record, Record::builder().id("bare").build());
        assert_eq!(backend.get_all().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_record_stored_as_hash_fields() {
        let store = MockHashStore::new();
        let backend = mock_backend(store.clone()).await;
        let record =
            Record::builder().id("7").title("t").description("d").status(Status::Completed).build();

        backend.create(record).await.unwrap();

        let hash = store.hash("7").expect("hash stored");
        assert_eq!(hash.get("title").map(String::as_str), Some("t"));
        assert_eq!(hash.get("description").map(String::as_str), Some("d"));
        assert_eq!(hash.get("status").map(String::as_str), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn test_unset_status_stored_empty_and_read_back_unset() {
        let store = MockHashStore::new();
        let backend = mock_backend(store.clone()).await;

        backend.create(Record::new("1", "a")).await.unwrap();

        assert_eq!(store.hash("1").unwrap().get("status").map(String::as_str), Some(""));
        assert_eq!(backend.get("1").await.unwrap().unwrap().status, None);
    }

    #[tokio::test]
    async fn test_hash_without_status_field_reads() {
        let store = MockHashStore::new();
        store.insert_hash("legacy", &[("title", "old"), ("description", "from before status")]);
        let backend = mock_backend(store).await;

        let record = backend.get("legacy").await.unwrap().unwrap();
        assert_eq!(record.title, "old");
        assert_eq!(record.status, None);
    }

    #[tokio::test]
    async fn test_unknown_stored_status_is_serialization_error() {
        let store = MockHashStore::new();
        store.insert_hash("bad", &[("title", "x"), ("status", "ARCHIVED")]);
        let backend = mock_backend(store).await;

        let err = backend.get("bad").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization { .. }));
    }

    #[tokio::test]
    async fn test_get_uses_exists_then_hmget() {
        let store = MockHashStore::new();
        let backend = mock_backend(store.clone()).await;
        backend.get("missing").await.unwrap();
        backend.create(Record::new("1", "a")).await.unwrap();
        store.clear_calls();

        backend.get("1").await.unwrap();

        assert_eq!(store.calls(), vec!["EXISTS", "HMGET"]);
    }

    #[tokio::test]
    async fn test_get_all_pages_through_scan() {
        let store = MockHashStore::new();
        for i in 0..25 {
            store.insert_hash(&format!("id-{i:02}"), &[("title", "t")]);
        }
        let backend = mock_backend(store.clone()).await;
        store.clear_calls();

        let records = backend.get_all().await.unwrap();

        assert_eq!(records.len(), 25);
        let scans = store.calls().into_iter().filter(|c| *c == "SCAN").count();
        assert_eq!(scans, 3, "25 keys at COUNT 10 should take three SCAN round trips");
    }

    #[tokio::test]
    async fn test_key_prefix_scopes_keys_and_scan() {
        let store = MockHashStore::new();
        store.insert_hash("other:1", &[("title", "foreign")]);
        let config = RedisBackendConfig::builder().key_prefix("todo:").build().unwrap();
        let backend = mock_backend_with(store.clone(), &config).await;

        backend.create(Record::new("1", "mine")).await.unwrap();

        assert!(store.hash("todo:1").is_some());
        let all = backend.get_all().await.unwrap();
        assert_eq!(all, vec![Record::new("1", "mine")]);
        backend.delete("1").await.unwrap();
        assert!(store.hash("todo:1").is_none());
        assert!(store.hash("other:1").is_some());
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_store_unavailable() {
        let store = MockHashStore::new();
        let backend = mock_backend(store.clone()).await;
        store.fail_all(true);

        for result in [
            backend.create(Record::new("1", "a")).await.map(|_| ()),
            backend.get("1").await.map(|_| ()),
            backend.get_all().await.map(|_| ()),
            backend.delete("1").await.map(|_| ()),
            backend.health_check().await,
        ] {
            assert!(
                matches!(result, Err(StorageError::StoreUnavailable { .. })),
                "expected StoreUnavailable, got {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_from_store_fails_when_ping_fails() {
        let store = MockHashStore::new();
        store.fail_all(true);
        let result = RedisBackend::from_store(store, &RedisBackendConfig::default()).await;
        assert!(matches!(result, Err(RedisStorageError::Client(_))));
    }
}
