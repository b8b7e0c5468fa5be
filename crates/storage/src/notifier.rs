//! Change-notification decorator for storage backends.
//!
//! [`ChangeNotifier`] wraps any [`StorageBackend`] and publishes a
//! [`ChangeEvent`] for every successful mutation, without modifying the
//! underlying store.
//!
//! # Design
//!
//! - **Read before mutate**: `create`, `update` and `delete` first read the current record through
//!   the wrapped `get`. If that read fails the mutation is not attempted.
//! - **Publish after commit**: the event is published only after the wrapped mutation returned
//!   successfully.
//! - **Best effort**: one publish attempt, bounded by `publish_timeout`. Failures are logged and
//!   counted, never returned to the caller.
//! - **Read pass-through**: `get`, `get_all` and `health_check` go straight to the inner backend.
//!
//! The read–mutate–publish sequence is not transactional. A concurrent write
//! to the same id between the pre-read and the mutation produces an event
//! whose `before` is not the true immediately-prior state.
//!
//! # Usage
//!
//! ```no_run
//! # use todo_storage::{ChangeNotifier, MemoryBackend, NotifierConfig, TracingPublisher};
//! let config = NotifierConfig::builder().enabled(true).topic("todo").build();
//! let notifier = ChangeNotifier::new(MemoryBackend::new(100), Some(TracingPublisher), config);
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::{
    backend::StorageBackend,
    error::StorageResult,
    publisher::{EventPublisher, PublishError},
    types::{ChangeEvent, Record},
};

/// Default topic name for change events.
pub const DEFAULT_TOPIC: &str = "todo";

/// Default upper bound on a single publish attempt.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`ChangeNotifier`].
#[derive(Debug, Clone, bon::Builder)]
pub struct NotifierConfig {
    /// Whether events are published at all.
    #[builder(default)]
    enabled: bool,
    /// Destination topic.
    #[builder(into, default = DEFAULT_TOPIC.to_owned())]
    topic: String,
    /// Upper bound on one publish attempt.
    #[builder(default = DEFAULT_PUBLISH_TIMEOUT)]
    publish_timeout: Duration,
}

impl NotifierConfig {
    /// Configuration with publishing turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self::builder().build()
    }

    /// Returns whether publishing is enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the publish timeout.
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        self.publish_timeout
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Point-in-time publish counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierStats {
    /// Events handed to the publisher successfully.
    pub published: u64,
    /// Events that failed to serialize, publish or finish in time.
    pub failed: u64,
}

/// Decorator that publishes a [`ChangeEvent`] for every successful mutation.
pub struct ChangeNotifier<S, P> {
    inner: S,
    publisher: Option<P>,
    config: NotifierConfig,
    published: AtomicU64,
    failed: AtomicU64,
}

impl<S, P> ChangeNotifier<S, P>
where
    S: StorageBackend,
    P: EventPublisher,
{
    /// Wraps `inner`, publishing through `publisher` when `config` enables it.
    pub fn new(inner: S, publisher: Option<P>, config: NotifierConfig) -> Self {
        if config.enabled && publisher.is_none() {
            warn!("Notifications enabled but no publisher configured; events will be dropped");
        }
        debug!(enabled = config.enabled, topic = %config.topic, "Notification decorator created");
        Self { inner, publisher, config, published: AtomicU64::new(0), failed: AtomicU64::new(0) }
    }

    /// Returns a reference to the inner backend.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Returns publish counters.
    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    async fn read_before(&self, id: &str) -> StorageResult<Option<Record>> {
        self.inner.get(id).await.inspect_err(|e| {
            error!(id, error = %e, "Failed to read record before mutation");
        })
    }

    async fn notify(&self, event: ChangeEvent) {
        if !self.config.enabled {
            return;
        }
        let Some(publisher) = &self.publisher else {
            debug!(change_type = %event.change_type, "No publisher configured; dropping event");
            return;
        };

        match self.try_publish(publisher, &event).await {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    change_type = %event.change_type,
                    id = event.record_id().unwrap_or_default(),
                    error = %e,
                    "Failed to send notification"
                );
            },
        }
    }

    async fn try_publish(&self, publisher: &P, event: &ChangeEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        debug!(
            topic = %self.config.topic,
            change = %String::from_utf8_lossy(&payload),
            "Sending notification"
        );

        let timeout = self.config.publish_timeout;
        match tokio::time::timeout(timeout, publisher.publish(&self.config.topic, payload)).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(timeout)),
        }
    }
}

#[async_trait]
impl<S, P> StorageBackend for ChangeNotifier<S, P>
where
    S: StorageBackend,
    P: EventPublisher,
{
    #[tracing::instrument(name = "notifier_create", skip(self, record), fields(id = %record.id))]
    async fn create(&self, record: Record) -> StorageResult<Record> {
        let before = self.read_before(&record.id).await?;
        let after = self.inner.create(record).await?;
        self.notify(ChangeEvent::created(before, after.clone())).await;
        Ok(after)
    }

    #[tracing::instrument(name = "notifier_update", skip(self, record), fields(id = %record.id))]
    async fn update(&self, record: Record) -> StorageResult<Record> {
        let before = self.read_before(&record.id).await?;
        let after = self.inner.update(record).await?;
        self.notify(ChangeEvent::updated(before, after.clone())).await;
        Ok(after)
    }

    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        self.inner.get_all().await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        self.inner.get(id).await
    }

    #[tracing::instrument(name = "notifier_delete", skip(self))]
    async fn delete(&self, id: &str) -> StorageResult<String> {
        let before = self.read_before(id).await?;
        let deleted = self.inner.delete(id).await?;
        self.notify(ChangeEvent::deleted(before)).await;
        Ok(deleted)
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}
