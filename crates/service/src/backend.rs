//! Runtime-selected storage backend.
//!
//! [`Backend`] wraps every concrete backend the service can run on, so the
//! choice can be made from configuration while calls stay statically
//! dispatched.
//!
//! | Variant | Use Case |
//! |---------|----------|
//! | [`Backend::Memory`] | Single instance, development, tests |
//! | [`Backend::Redis`] | Shared state across instances |

use async_trait::async_trait;
use todo_storage::{MemoryBackend, Record, StorageBackend, StorageResult};
use todo_storage_redis::RedisBackend;

/// Unified storage backend enum.
#[derive(Debug, Clone)]
pub enum Backend {
    /// In-process map with a capacity cap.
    Memory(MemoryBackend),
    /// Redis hash store.
    Redis(RedisBackend),
}

impl Backend {
    /// Creates a memory backend holding at most `max_entries` records.
    #[must_use]
    pub fn memory(max_entries: usize) -> Self {
        Self::Memory(MemoryBackend::new(max_entries))
    }

    /// Returns true if this is a memory backend.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// Returns true if this is a Redis backend.
    #[must_use]
    pub fn is_redis(&self) -> bool {
        matches!(self, Self::Redis(_))
    }
}

impl From<MemoryBackend> for Backend {
    fn from(backend: MemoryBackend) -> Self {
        Self::Memory(backend)
    }
}

impl From<RedisBackend> for Backend {
    fn from(backend: RedisBackend) -> Self {
        Self::Redis(backend)
    }
}

#[async_trait]
impl StorageBackend for Backend {
    async fn create(&self, record: Record) -> StorageResult<Record> {
        match self {
            Self::Memory(b) => b.create(record).await,
            Self::Redis(b) => b.create(record).await,
        }
    }

    async fn update(&self, record: Record) -> StorageResult<Record> {
        match self {
            Self::Memory(b) => b.update(record).await,
            Self::Redis(b) => b.update(record).await,
        }
    }

    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        match self {
            Self::Memory(b) => b.get_all().await,
            Self::Redis(b) => b.get_all().await,
        }
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        match self {
            Self::Memory(b) => b.get(id).await,
            Self::Redis(b) => b.get(id).await,
        }
    }

    async fn delete(&self, id: &str) -> StorageResult<String> {
        match self {
            Self::Memory(b) => b.delete(id).await,
            Self::Redis(b) => b.delete(id).await,
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        match self {
            Self::Memory(b) => b.health_check().await,
            Self::Redis(b) => b.health_check().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use todo_storage::conformance;

    use super::*;

    #[tokio::test]
    async fn test_memory_variant_delegates() {
        let backend = Backend::memory(2);
        assert!(backend.is_memory());
        assert!(!backend.is_redis());

        backend.create(Record::new("1", "a")).await.unwrap();
        assert_eq!(backend.get("1").await.unwrap().map(|r| r.title), Some("a".to_owned()));
    }

    #[tokio::test]
    async fn test_memory_variant_conformance() {
        conformance::run_all(Arc::new(Backend::memory(conformance::MIN_CAPACITY))).await;
    }
}
