//! Event publishing capability used by [`ChangeNotifier`](crate::ChangeNotifier).
//!
//! The broker client itself lives outside this crate. Anything that can
//! deliver a payload to a named topic implements [`EventPublisher`]:
//!
//! - [`TracingPublisher`]: Emits the payload as a structured `tracing` event.
//! - [`ChannelPublisher`]: Forwards to a tokio channel for in-process subscribers.
//! - [`NoopPublisher`]: Discards everything.
//!
//! Delivery durability is the publisher's responsibility; the notifier makes
//! exactly one attempt per mutation and never retries.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure to hand an event to the broker.
///
/// These errors stop at the notifier boundary: they are logged and counted
/// but never returned to the caller of the mutating operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PublishError {
    /// The broker refused or failed to accept the message.
    #[error("Publish to topic {topic:?} failed: {message}")]
    Rejected {
        /// Destination topic.
        topic: String,
        /// Description of the failure.
        message: String,
    },

    /// The event could not be encoded.
    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The publish attempt exceeded its time budget.
    #[error("Publish timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The publisher has been shut down.
    #[error("Publisher closed")]
    Closed,
}

impl PublishError {
    /// Creates a new `Rejected` error.
    #[must_use]
    pub fn rejected(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected { topic: topic.into(), message: message.into() }
    }
}

/// Delivers serialized change events to a topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes `payload` to `topic`.
    ///
    /// Implementations should return once the broker has accepted the
    /// message (or definitively failed); they must not block indefinitely.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

#[async_trait]
impl<P: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<P> {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        (**self).publish(topic, payload).await
    }
}

/// Publisher that emits every event as an `INFO` tracing event.
///
/// Field mapping:
/// - `event.topic`: destination topic
/// - `event.payload`: the JSON payload as text
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        tracing::info!(
            event.topic = %topic,
            event.payload = %String::from_utf8_lossy(&payload),
            "change_event"
        );
        Ok(())
    }
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), PublishError> {
        Ok(())
    }
}

/// A message delivered through a [`ChannelPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Publisher that forwards messages to a bounded tokio channel.
///
/// Uses `try_send`, so a full channel is reported as a failed publish rather
/// than stalling the mutation that produced the event.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<PublishedMessage>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiving half of its channel.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PublishedMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let message = PublishedMessage { topic: topic.to_owned(), payload };
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PublishError::rejected(topic, "channel full"),
            mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
        })
    }
}
