//! Service error types and their transport status categories.
//!
//! [`ServiceError`] is what every [`TodoService`](crate::TodoService)
//! operation returns. Both adapters reduce it to a [`StatusCategory`] and
//! render that category in their own vocabulary: an HTTP status code for
//! REST, a canonical code name for RPC.

use thiserror::Error;
use todo_storage::StorageError;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Transport-neutral outcome class of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// The addressed record does not exist.
    NotFound,
    /// The request itself is malformed or inconsistent.
    BadRequest,
    /// A bounded backend is full.
    ResourceExhausted,
    /// The store is unreachable or the deadline elapsed.
    Unavailable,
    /// Anything else.
    Internal,
}

impl StatusCategory {
    /// HTTP status code used by the REST adapter.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::BadRequest => 400,
            Self::ResourceExhausted => 507,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }

    /// Canonical RPC status code name.
    #[must_use]
    pub fn rpc_code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "INVALID_ARGUMENT",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::Unavailable => "UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }
}

/// Errors returned by [`TodoService`](crate::TodoService).
///
/// # Non-exhaustive
///
/// New variants may be added without a breaking change; downstream matches
/// must include a wildcard arm.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// The id in the path differs from the id in the body.
    #[error("Id mismatch: path id {path_id:?} does not match body id {body_id:?}")]
    IdMismatch {
        /// Id taken from the request path.
        path_id: String,
        /// Id taken from the request body.
        body_id: String,
    },

    /// The operation needs a record id and none was given.
    #[error("Missing record id")]
    MissingId,

    /// The request body could not be decoded.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// Returns the status category adapters report for this error.
    #[must_use]
    pub fn category(&self) -> StatusCategory {
        match self {
            Self::IdMismatch { .. } | Self::MissingId | Self::InvalidPayload(_) => {
                StatusCategory::BadRequest
            },
            Self::Storage(e) => match e {
                StorageError::NotFound { .. } => StatusCategory::NotFound,
                StorageError::CapacityExceeded { .. } => StatusCategory::ResourceExhausted,
                StorageError::StoreUnavailable { .. } | StorageError::Timeout => {
                    StatusCategory::Unavailable
                },
                _ => StatusCategory::Internal,
            },
        }
    }
}
