//! Redis-backed implementation of [`StorageBackend`](todo_storage::StorageBackend) for the todo
//! service.
//!
//! This crate provides [`RedisBackend`], which keeps every record as one Redis
//! hash so that several service instances can share state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   RedisBackend                              │
//! │         (implements StorageBackend trait)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HashStore trait                           │
//! │   RedisClient (ConnectionManager) │ MockHashStore (tests)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Redis server                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! // Requires a running Redis server.
//! use todo_storage::{Record, StorageBackend};
//! use todo_storage_redis::{RedisBackend, RedisBackendConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisBackendConfig::builder().host("localhost").port(6379).build()?;
//!     let backend = RedisBackend::new(config).await?;
//!
//!     backend.create(Record::new("1", "Buy milk")).await?;
//!     let record = backend.get("1").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Record Mapping
//!
//! | StorageBackend     | Redis                                         |
//! | ------------------ | --------------------------------------------- |
//! | `create`/`update`  | `HSET {prefix}{id} title .. description .. status ..` |
//! | `get`              | `EXISTS`, then `HMGET title description status` |
//! | `get_all`          | `SCAN 0 MATCH {prefix}* COUNT n` until cursor 0, `HMGET` per key |
//! | `delete`           | `DEL {prefix}{id}`                            |
//! | `health_check`     | `PING`                                        |
//!
//! Nothing in this crate retries or applies a per-call timeout. Callers bound
//! latency by dropping the future, e.g. with `tokio::time::timeout`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod client;
mod config;
mod error;
/// Minimal hash-store capability the backend is written against.
pub mod store;

/// Shared test utilities for Redis backend testing.
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;

/// Redis-backed storage backend.
pub use backend::RedisBackend;
/// Connection-managed Redis client.
pub use client::RedisClient;
/// Configuration types and default constants for the Redis backend.
pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SCAN_BATCH_SIZE,
    RedisBackendConfig,
};
/// Redis-specific error types and result alias.
pub use error::{RedisStorageError, Result};
/// Hash-store capability.
pub use store::HashStore;
