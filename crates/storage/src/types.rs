//! Record and change-event types shared by every backend and decorator.
//!
//! The JSON shape of these types is part of the external contract:
//!
//! ```text
//! Record:      {"id":"1","title":"Buy milk","description":"","status":"PENDING"}
//! ChangeEvent: {"before":{..}|null,"after":{..}|null,"changeType":"UPDATE"}
//! ```
//!
//! An unset `status` is omitted on output and accepted as either a missing
//! field or an empty string on input.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle state of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Not started yet.
    Pending,
    /// Work has begun.
    InProgress,
    /// Done.
    Completed,
}

impl Status {
    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognised status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0:?}")]
pub struct UnknownStatus(pub String);

/// A todo item.
///
/// `id` is the storage key and never changes for a stored record; writing a
/// record with a different id creates a different record.
///
/// # Examples
///
/// ```
/// use todo_storage::{Record, Status};
///
/// let record = Record::builder().id("1").title("Buy milk").build();
/// assert_eq!(record.description, "");
/// assert_eq!(record.status, None);
/// assert_eq!(record.effective_status(), Status::Pending);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct Record {
    /// Unique key within a backend.
    #[builder(into)]
    #[serde(default)]
    pub id: String,

    /// Human readable label.
    #[builder(into, default)]
    #[serde(default)]
    pub title: String,

    /// Free-form details.
    #[builder(into, default)]
    #[serde(default)]
    pub description: String,

    /// Lifecycle state; `None` when the caller never set one.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_status"
    )]
    pub status: Option<Status>,
}

impl Record {
    /// Creates a record with the given id and title and empty description.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), description: String::new(), status: None }
    }

    /// Returns the status, treating an unset status as [`Status::Pending`].
    #[must_use]
    pub fn effective_status(&self) -> Status {
        self.status.unwrap_or(Status::Pending)
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<Status>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Kind of mutation carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// A record was written through `create`.
    Create,
    /// A record was written through `update`.
    Update,
    /// A record was removed.
    Delete,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Before/after snapshot of a single mutation.
///
/// `before` is `None` when the id did not exist prior to the mutation and
/// `after` is `None` for deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// State read immediately before the mutation.
    pub before: Option<Record>,
    /// State returned by the mutation.
    pub after: Option<Record>,
    /// What kind of mutation produced the event.
    pub change_type: ChangeType,
}

impl ChangeEvent {
    /// Event for a `create` call.
    #[must_use]
    pub fn created(before: Option<Record>, after: Record) -> Self {
        Self { before, after: Some(after), change_type: ChangeType::Create }
    }

    /// Event for an `update` call.
    #[must_use]
    pub fn updated(before: Option<Record>, after: Record) -> Self {
        Self { before, after: Some(after), change_type: ChangeType::Update }
    }

    /// Event for a `delete` call.
    #[must_use]
    pub fn deleted(before: Option<Record>) -> Self {
        Self { before, after: None, change_type: ChangeType::Delete }
    }

    /// Id of the affected record, taken from whichever side is present.
    #[must_use]
    pub fn record_id(&self) -> Option<&str> {
        self.after.as_ref().or(self.before.as_ref()).map(|r| r.id.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_record_serializes_without_unset_status() {
        let record = Record::new("1", "Buy milk");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"id": "1", "title": "Buy milk", "description": ""}));
    }

    #[test]
    fn test_record_serializes_status_name() {
        let record = Record::builder().id("7").title("t").status(Status::InProgress).build();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "IN_PROGRESS");
    }

    #[test]
    fn test_empty_status_deserializes_as_unset() {
        let record: Record =
            serde_json::from_str(r#"{"id":"1","title":"a","description":"","status":""}"#)
                .unwrap();
        assert_eq!(record.status, None);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record: Record = serde_json::from_str(r#"{"title":"only a title"}"#).unwrap();
        assert_eq!(record.id, "");
        assert_eq!(record.description, "");
        assert_eq!(record.status, None);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_str::<Record>(r#"{"id":"1","status":"ARCHIVED"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_parse_and_display_agree() {
        for status in [Status::Pending, Status::InProgress, Status::Completed] {
            assert_eq!(status.to_string().parse::<Status>().unwrap(), status);
        }
        assert_eq!("DONE".parse::<Status>(), Err(UnknownStatus("DONE".into())));
    }

    #[test]
    fn test_change_event_wire_format() {
        let event = ChangeEvent::updated(
            Some(Record::new("42", "old")),
            Record::builder().id("42").title("new").status(Status::Completed).build(),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "before": {"id": "42", "title": "old", "description": ""},
                "after": {"id": "42", "title": "new", "description": "", "status": "COMPLETED"},
                "changeType": "UPDATE",
            })
        );
    }

    #[test]
    fn test_create_event_has_null_before() {
        let event = ChangeEvent::created(None, Record::new("42", "x"));
        let value = serde_json::to_value(&event).unwrap();
        assert!(value["before"].is_null());
        assert_eq!(value["changeType"], "CREATE");
        assert_eq!(event.record_id(), Some("42"));
    }

    #[test]
    fn test_delete_event_takes_id_from_before() {
        let event = ChangeEvent::deleted(Some(Record::new("9", "gone")));
        assert!(event.after.is_none());
        assert_eq!(event.record_id(), Some("9"));
    }
}
