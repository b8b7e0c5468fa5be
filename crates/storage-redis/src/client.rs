//! [`HashStore`] over a live Redis server.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::{
    config::RedisBackendConfig,
    error::{RedisStorageError, Result},
    store::HashStore,
};

/// Redis client backed by a [`ConnectionManager`].
///
/// The manager multiplexes one connection and reconnects on failure; clones
/// share it.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
    address: String,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient").field("address", &self.address).finish_non_exhaustive()
    }
}

impl RedisClient {
    /// Opens a managed connection to the configured server.
    ///
    /// # Errors
    ///
    /// Returns [`RedisStorageError::ConnectionFailed`] if no connection is
    /// established within the configured connect timeout, or
    /// [`RedisStorageError::Client`] if the client rejects the connection.
    pub async fn connect(config: &RedisBackendConfig) -> Result<Self> {
        let address = config.address();
        info!(address = %address, user = config.username(), "Connecting to redis");

        let client = redis::Client::open(config.connection_info())?;
        let conn = tokio::time::timeout(config.connect_timeout(), ConnectionManager::new(client))
            .await
            .map_err(|_| RedisStorageError::connect_timeout(&address, config.connect_timeout()))??;

        Ok(Self { conn, address })
    }

    /// Returns `host:port` of the server.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl HashStore for RedisClient {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(exists)
    }

    async fn hget_fields(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("HMGET");
        cmd.arg(key);
        for field in fields {
            cmd.arg(*field);
        }
        let values: Vec<Option<String>> = cmd.query_async(&mut conn).await?;
        Ok(values)
    }

    async fn hset_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(*field).arg(*value);
        }
        let added: i64 = cmd.query_async(&mut conn).await?;
        debug!(key, added, "HSET");
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        debug!(key, removed, "DEL");
        Ok(())
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        let mut conn = self.conn.clone();
        let page: (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        Ok(page)
    }
}
