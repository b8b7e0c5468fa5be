//! Record storage abstraction for the todo service.
//!
//! This crate provides the [`StorageBackend`] trait, the [`Record`] model and
//! the components that implement or decorate the trait. The service facade
//! in `todo-service` depends only on the trait and is handed one concrete,
//! possibly decorated, backend at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TodoService                             │
//! │          (RPC and REST adapters, validation)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │        ChangeNotifier  ──▶  EventPublisher (topic)          │
//! │        MeteredBackend                                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  StorageBackend trait                       │
//! │     (create, update, get_all, get, delete, health_check)    │
//! ├──────────────┬──────────────────────────────────────────────┤
//! │ MemoryBackend│            RedisBackend                      │
//! │  (bounded)   │       (todo-storage-redis)                   │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use todo_storage::{MemoryBackend, Record, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new(100);
//!
//!     backend.create(Record::new("1", "Buy milk")).await?;
//!     backend.update(Record::new("1", "Buy oat milk")).await?;
//!
//!     let record = backend.get("1").await?;
//!     assert_eq!(record.map(|r| r.title), Some("Buy oat milk".to_owned()));
//!
//!     backend.delete("1").await?;
//!     assert!(backend.get_all().await?.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! # Available Backends
//!
//! | Backend | Use Case | Persistence |
//! |---------|----------|-------------|
//! | [`MemoryBackend`] | Single instance, development, tests | No |
//! | `RedisBackend` (in `todo-storage-redis`) | Shared state across instances | Yes |
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`]. Backends map their internal
//! errors onto [`StorageError`] variants; decorators pass them through.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` and `conformance` modules with shared test helpers
//!   (record generators, fault-injecting wrappers, assertion macros). Enable this in
//!   `[dev-dependencies]` for integration tests.

#![deny(unsafe_code)]

pub mod backend;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod conformance;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod notifier;
pub mod publisher;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use backend::StorageBackend;
pub use error::{BoxError, StorageError, StorageResult};
pub use memory::{DEFAULT_MAX_ENTRIES, MemoryBackend};
pub use metrics::{
    LatencyPercentiles, MeteredBackend, Metrics, MetricsCollector, MetricsSnapshot, Operation,
    OperationSnapshot,
};
pub use notifier::{ChangeNotifier, NotifierConfig, NotifierStats};
pub use publisher::{
    ChannelPublisher, EventPublisher, NoopPublisher, PublishError, PublishedMessage,
    TracingPublisher,
};
pub use types::{ChangeEvent, ChangeType, Record, Status, UnknownStatus};
