//! Error types for the Redis storage backend.
//!
//! This module provides error types that map between the Redis client's
//! errors and the generic [`StorageError`] type.

use std::time::Duration;

use thiserror::Error;
use todo_storage::StorageError;

/// Result type alias for Redis storage operations.
pub type Result<T> = std::result::Result<T, RedisStorageError>;

/// Errors specific to the Redis storage backend.
#[derive(Debug, Error)]
pub enum RedisStorageError {
    /// The initial connection or ping did not succeed in time.
    #[error("Failed to connect to redis at {address}: {message}")]
    ConnectionFailed {
        /// `host:port` that was dialled.
        address: String,
        /// Description of the failure.
        message: String,
    },

    /// Error returned by the Redis client.
    #[error("Redis client error: {0}")]
    Client(#[from] redis::RedisError),

    /// A stored hash could not be turned back into a record.
    #[error("Corrupt record {key}: {message}")]
    CorruptRecord {
        /// Redis key of the hash.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RedisStorageError {
    pub(crate) fn connect_timeout(address: impl Into<String>, timeout: Duration) -> Self {
        Self::ConnectionFailed {
            address: address.into(),
            message: format!("no response within {timeout:?}"),
        }
    }
}

impl From<RedisStorageError> for StorageError {
    fn from(err: RedisStorageError) -> Self {
        match err {
            RedisStorageError::ConnectionFailed { .. } => {
                StorageError::store_unavailable(err.to_string())
            },
            RedisStorageError::Client(source) => {
                StorageError::store_unavailable_with_source(source.to_string(), source)
            },
            RedisStorageError::CorruptRecord { .. } => StorageError::serialization(err.to_string()),
            RedisStorageError::Config(message) => {
                StorageError::internal(format!("Config: {message}"))
            },
        }
    }
}
