//! Storage error types and result alias.
//!
//! Every [`StorageBackend`](crate::StorageBackend) maps its internal failures
//! onto [`StorageError`]. Decorators propagate these errors unchanged, and the
//! service facade translates them into transport status categories.
//!
//! # Error Types
//!
//! - [`StorageError::NotFound`] - Record does not exist (rarely surfaced; absent reads are `Ok(None)`)
//! - [`StorageError::CapacityExceeded`] - Bounded in-memory backend is full
//! - [`StorageError::StoreUnavailable`] - Remote store unreachable or failing
//! - [`StorageError::Serialization`] - Record encoding/decoding failures
//! - [`StorageError::Timeout`] - Caller-imposed deadline elapsed
//! - [`StorageError::Internal`] - Anything else
//!
//! # Example
//!
//! ```
//! use todo_storage::{StorageError, StorageResult};
//!
//! fn lookup(id: &str) -> StorageResult<()> {
//!     Err(StorageError::not_found(id))
//! }
//!
//! assert!(matches!(lookup("42"), Err(StorageError::NotFound { .. })));
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during record storage operations.
///
/// Errors preserve their source chain via `#[source]` so that the full
/// context is visible when logged.
///
/// # Non-exhaustive
///
/// New variants may be added without a breaking change; downstream matches
/// must include a wildcard arm.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The requested record does not exist.
    #[error("Record not found: {id}")]
    NotFound {
        /// The id that was not found.
        id: String,
    },

    /// A bounded backend rejected an insert of a new id.
    ///
    /// Replacing an existing id never produces this error.
    #[error("Capacity exceeded: backend holds the maximum of {max_entries} records")]
    CapacityExceeded {
        /// The configured maximum number of records.
        max_entries: usize,
    },

    /// The underlying store could not be reached or failed at transport level.
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the failure.
        message: String,
        /// The underlying client error.
        #[source]
        source: Option<BoxError>,
    },

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },

    /// The caller's deadline elapsed before the operation completed.
    #[error("Operation timeout")]
    Timeout,

    /// Catch-all for failures that fit no other category.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error for the given id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `CapacityExceeded` error.
    #[must_use]
    pub fn capacity_exceeded(max_entries: usize) -> Self {
        Self::CapacityExceeded { max_entries }
    }

    /// Creates a new `StoreUnavailable` error with the given message.
    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable { message: message.into(), source: None }
    }

    /// Creates a new `StoreUnavailable` error with a message and source error.
    #[must_use]
    pub fn store_unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::StoreUnavailable { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Returns `true` if retrying the same operation later may succeed.
    ///
    /// Only transport-level failures and timeouts are transient. A full
    /// memory backend stays full until something is deleted, so
    /// `CapacityExceeded` is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::Timeout)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_with_source(err.to_string(), err)
    }
}
