//! Request and response messages of the RPC surface.
//!
//! Field names follow the `v1` wire contract (camelCase), and every response
//! carries the API version it was produced by.

use serde::{Deserialize, Serialize};
use todo_storage::Record;

/// API version stamped on every response.
pub const API_VERSION: &str = "v1";

fn api_version() -> String {
    API_VERSION.to_owned()
}

/// Request for `create` and `update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrUpdateRequest {
    /// Record to write.
    #[serde(default)]
    pub todo: Option<Record>,
}

impl CreateOrUpdateRequest {
    /// Wraps `record` in a request.
    #[must_use]
    pub fn new(record: Record) -> Self {
        Self { todo: Some(record) }
    }
}

/// Response for `create` and `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrUpdateResponse {
    /// API version.
    #[serde(default = "api_version")]
    pub api: String,
    /// Record as stored.
    pub todo: Record,
}

/// Request for `get_all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllRequest {}

/// Response for `get_all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAllResponse {
    /// API version.
    #[serde(default = "api_version")]
    pub api: String,
    /// Every stored record, in no particular order.
    pub todos: Vec<Record>,
}

/// Request for `get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRequest {
    /// Id to look up.
    pub id: String,
}

/// Response for `get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse {
    /// API version.
    #[serde(default = "api_version")]
    pub api: String,
    /// The record, or `None` if the id is unknown.
    pub todo: Option<Record>,
}

/// Request for `delete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Id to remove.
    pub id: String,
}

/// Response for `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// API version.
    #[serde(default = "api_version")]
    pub api: String,
    /// Id that was removed (or was already absent).
    pub id: String,
}
