//! Composes the service object graph from a [`ServiceConfig`].
//!
//! ```text
//! TodoService
//!   └─ MeteredBackend
//!        └─ ChangeNotifier   (only when notifications are enabled)
//!             └─ Backend     (Memory | Redis)
//! ```

use std::sync::Arc;

use thiserror::Error;
use todo_storage::{
    ChangeNotifier, EventPublisher, MemoryBackend, MeteredBackend, Metrics, StorageBackend,
    TracingPublisher,
};
use todo_storage_redis::{RedisBackend, RedisStorageError};
use tracing::info;

use crate::{
    backend::Backend,
    config::{BackendConfig, ConfigError, ServiceConfig},
    service::TodoService,
};

/// Failure to assemble the service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BootstrapError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The Redis backend could not be created.
    #[error("Failed to create redis backend: {0}")]
    Redis(#[from] RedisStorageError),
}

/// Creates the storage backend selected by `config`.
///
/// # Errors
///
/// Returns [`BootstrapError::Redis`] if the Redis backend cannot connect or
/// does not answer the initial ping.
pub async fn build_backend(config: &BackendConfig) -> Result<Backend, BootstrapError> {
    match config {
        BackendConfig::Memory(memory) => {
            Ok(Backend::Memory(MemoryBackend::new(memory.max_entries)))
        },
        BackendConfig::Redis(redis) => {
            Ok(Backend::Redis(RedisBackend::new(redis.clone()).await?))
        },
    }
}

/// Builds the service described by `config`.
///
/// With notifications enabled, events go to `publisher`, or to a
/// [`TracingPublisher`] when none is given.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the backend cannot be
/// created.
pub async fn build_service(
    config: &ServiceConfig,
    publisher: Option<Arc<dyn EventPublisher>>,
) -> Result<TodoService, BootstrapError> {
    config.validate()?;
    let backend = build_backend(config.backend()).await?;
    info!(backend = config.backend().kind(), "Storage backend ready");

    let notifications = config.notifications();
    let storage: Arc<dyn StorageBackend> = if notifications.enabled() {
        let publisher: Arc<dyn EventPublisher> = match publisher {
            Some(publisher) => publisher,
            None => Arc::new(TracingPublisher),
        };
        info!(
            pubsub = notifications.pubsub_name(),
            topic = notifications.topic(),
            "Notifications enabled"
        );
        Arc::new(ChangeNotifier::new(backend, Some(publisher), notifications.notifier_config()))
    } else {
        Arc::new(backend)
    };

    let metrics = Metrics::new();
    let metered = MeteredBackend::with_metrics(storage, metrics.clone());

    let mut service = TodoService::new(Arc::new(metered)).with_metrics(metrics);
    if let Some(timeout) = config.request_timeout() {
        service = service.with_request_timeout(timeout);
    }
    Ok(service)
}
