//! The handful of Redis commands [`RedisBackend`](crate::RedisBackend) needs.
//!
//! [`RedisClient`](crate::RedisClient) implements this over a live server;
//! `testutil::MockHashStore` implements it in memory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Hash-valued key/value store.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// `PING`
    async fn ping(&self) -> Result<()>;

    /// `EXISTS key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// `HMGET key field...`; one entry per requested field, `None` if absent.
    async fn hget_fields(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>>;

    /// `HSET key field value [field value ...]`
    async fn hset_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()>;

    /// `DEL key`
    async fn del(&self, key: &str) -> Result<()>;

    /// `SCAN cursor MATCH pattern COUNT count`; returns the next cursor and a
    /// batch of keys. A returned cursor of `0` ends the iteration.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)>;
}

#[async_trait]
impl<H: HashStore + ?Sized> HashStore for Arc<H> {
    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key).await
    }

    async fn hget_fields(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        (**self).hget_fields(key, fields).await
    }

    async fn hset_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        (**self).hset_fields(key, fields).await
    }

    async fn del(&self, key: &str) -> Result<()> {
        (**self).del(key).await
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        (**self).scan(cursor, pattern, count).await
    }
}
