//! Service configuration.
//!
//! [`ServiceConfig`] is the resolved configuration the bootstrap composes the
//! service from. It can be deserialized (durations in humantime notation,
//! e.g. `"250ms"`) or read from `TODO_*` environment variables with
//! [`ServiceConfig::from_env`].
//!
//! # Environment
//!
//! | Variable                          | Default       |
//! |-----------------------------------|---------------|
//! | `TODO_BACKEND`                    | `memory`      |
//! | `TODO_MAX_ENTRIES`                | `100`         |
//! | `TODO_REDIS_HOST`                 | `localhost`   |
//! | `TODO_REDIS_PORT`                 | `6379`        |
//! | `TODO_REDIS_USER`                 | none          |
//! | `TODO_REDIS_PASS`                 | none          |
//! | `TODO_NOTIFICATIONS_ENABLED`      | `false`       |
//! | `TODO_NOTIFICATIONS_PUBSUB_NAME`  | `todo-pubsub` |
//! | `TODO_NOTIFICATIONS_PUBSUB_TOPIC` | `todo`        |
//! | `TODO_REQUEST_TIMEOUT`            | none          |
//! | `TODO_VERBOSE`                    | `2` (info)    |

use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_storage::{DEFAULT_MAX_ENTRIES, NotifierConfig, notifier::DEFAULT_PUBLISH_TIMEOUT};
use todo_storage_redis::{RedisBackendConfig, RedisStorageError};

/// Default pub/sub component name.
pub const DEFAULT_PUBSUB_NAME: &str = "todo-pubsub";

/// Default topic for change events.
pub const DEFAULT_TOPIC: &str = todo_storage::notifier::DEFAULT_TOPIC;

/// Default verbosity (info).
pub const DEFAULT_VERBOSITY: u8 = 2;

/// Highest accepted verbosity (trace).
pub const MAX_VERBOSITY: u8 = 4;

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A field violates a constraint.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The Redis section is invalid.
    #[error("Invalid redis configuration: {0}")]
    Redis(#[from] RedisStorageError),
}

impl ConfigError {
    fn invalid_value(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidValue { var, value: value.to_owned(), reason: reason.to_string() }
    }
}

/// In-memory backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Maximum number of records held.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_entries: DEFAULT_MAX_ENTRIES }
    }
}

/// Which storage backend to run, with its settings.
///
/// Externally tagged: `{"memory": {"max_entries": 10}}` or
/// `{"redis": {"host": "cache"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendConfig {
    /// Volatile, single-process map.
    Memory(MemoryConfig),
    /// Shared Redis hash store.
    Redis(RedisBackendConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Memory(MemoryConfig::default())
    }
}

impl BackendConfig {
    /// Returns the backend name as used by `TODO_BACKEND`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redis(_) => "redis",
        }
    }
}

/// Change-notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Whether change events are published.
    #[serde(default)]
    #[builder(default)]
    pub(crate) enabled: bool,

    /// Name of the pub/sub component the publisher talks to.
    #[serde(default = "default_pubsub_name")]
    #[builder(into, default = DEFAULT_PUBSUB_NAME.to_owned())]
    pub(crate) pubsub_name: String,

    /// Topic events are published to.
    #[serde(default = "default_topic")]
    #[builder(into, default = DEFAULT_TOPIC.to_owned())]
    pub(crate) topic: String,

    /// Upper bound on one publish attempt.
    #[serde(with = "humantime_serde", default = "default_publish_timeout")]
    #[builder(default = DEFAULT_PUBLISH_TIMEOUT)]
    pub(crate) publish_timeout: Duration,
}

fn default_pubsub_name() -> String {
    DEFAULT_PUBSUB_NAME.to_owned()
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_owned()
}

fn default_publish_timeout() -> Duration {
    DEFAULT_PUBLISH_TIMEOUT
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl NotificationsConfig {
    /// Returns whether change events are published.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the pub/sub component name.
    #[must_use]
    pub fn pubsub_name(&self) -> &str {
        &self.pubsub_name
    }

    /// Returns the topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the publish timeout.
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        self.publish_timeout
    }

    /// Converts to the decorator's configuration.
    #[must_use]
    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig::builder()
            .enabled(self.enabled)
            .topic(self.topic.clone())
            .publish_timeout(self.publish_timeout)
            .build()
    }
}

/// Resolved configuration of the service.
///
/// # Example
///
/// ```
/// use todo_service::{BackendConfig, MemoryConfig, ServiceConfig};
///
/// let config = ServiceConfig::builder()
///     .backend(BackendConfig::Memory(MemoryConfig { max_entries: 10 }))
///     .build()?;
/// assert_eq!(config.verbosity(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Storage backend.
    #[serde(default)]
    pub(crate) backend: BackendConfig,

    /// Change notifications.
    #[serde(default)]
    pub(crate) notifications: NotificationsConfig,

    /// Deadline applied to every backend call.
    #[serde(default, with = "humantime_serde")]
    pub(crate) request_timeout: Option<Duration>,

    /// Log verbosity, 0 (errors only) to 4 (trace).
    #[serde(default = "default_verbosity")]
    pub(crate) verbosity: u8,
}

fn default_verbosity() -> u8 {
    DEFAULT_VERBOSITY
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            notifications: NotificationsConfig::default(),
            request_timeout: None,
            verbosity: DEFAULT_VERBOSITY,
        }
    }
}

#[bon::bon]
impl ServiceConfig {
    /// Creates a new configuration, validating all fields.
    ///
    /// # Errors
    ///
    /// Returns an error if [`validate`](Self::validate) rejects the result.
    #[builder]
    pub fn new(
        #[builder(default)] backend: BackendConfig,
        #[builder(default)] notifications: NotificationsConfig,
        request_timeout: Option<Duration>,
        #[builder(default = DEFAULT_VERBOSITY)] verbosity: u8,
    ) -> Result<Self, ConfigError> {
        let config = Self { backend, notifications, request_timeout, verbosity };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that deserialization cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Memory capacity is zero
    /// - The Redis section is invalid
    /// - Notifications are enabled with an empty topic
    /// - The request timeout is zero
    /// - Verbosity is above 4
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.backend {
            BackendConfig::Memory(memory) if memory.max_entries == 0 => {
                return Err(ConfigError::Invalid("max_entries must be at least 1".into()));
            },
            BackendConfig::Redis(redis) => redis.validate()?,
            BackendConfig::Memory(_) => {},
        }
        if self.notifications.enabled && self.notifications.topic.is_empty() {
            return Err(ConfigError::Invalid(
                "notification topic cannot be empty when notifications are enabled".into(),
            ));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid("request_timeout must be non-zero".into()));
        }
        if self.verbosity > MAX_VERBOSITY {
            return Err(ConfigError::Invalid(format!(
                "verbosity must be between 0 and {MAX_VERBOSITY}"
            )));
        }
        Ok(())
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// As [`from_vars`](Self::from_vars).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Reads the configuration from `TODO_*` variables; others are ignored.
    ///
    /// Unset and empty variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable values, or any
    /// error [`validate`](Self::validate) reports.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, v)| k.starts_with("TODO_") && !v.is_empty())
            .collect();
        let var = |name: &str| vars.get(name).map(String::as_str);

        let backend = match var("TODO_BACKEND").unwrap_or("memory") {
            "memory" => {
                let max_entries =
                    parse_var("TODO_MAX_ENTRIES", var("TODO_MAX_ENTRIES"))?.unwrap_or(DEFAULT_MAX_ENTRIES);
                BackendConfig::Memory(MemoryConfig { max_entries })
            },
            "redis" => BackendConfig::Redis(
                RedisBackendConfig::builder()
                    .maybe_host(var("TODO_REDIS_HOST"))
                    .maybe_port(parse_var("TODO_REDIS_PORT", var("TODO_REDIS_PORT"))?)
                    .maybe_username(var("TODO_REDIS_USER"))
                    .maybe_password(var("TODO_REDIS_PASS"))
                    .build()?,
            ),
            other => {
                return Err(ConfigError::invalid_value(
                    "TODO_BACKEND",
                    other,
                    "expected \"memory\" or \"redis\"",
                ));
            },
        };

        let notifications = NotificationsConfig::builder()
            .enabled(
                parse_bool("TODO_NOTIFICATIONS_ENABLED", var("TODO_NOTIFICATIONS_ENABLED"))?
                    .unwrap_or(false),
            )
            .maybe_pubsub_name(var("TODO_NOTIFICATIONS_PUBSUB_NAME"))
            .maybe_topic(var("TODO_NOTIFICATIONS_PUBSUB_TOPIC"))
            .build();

        let request_timeout = var("TODO_REQUEST_TIMEOUT")
            .map(|raw| {
                humantime_serde::re::humantime::parse_duration(raw)
                    .map_err(|e| ConfigError::invalid_value("TODO_REQUEST_TIMEOUT", raw, e))
            })
            .transpose()?;

        Self::builder()
            .backend(backend)
            .notifications(notifications)
            .maybe_request_timeout(request_timeout)
            .maybe_verbosity(parse_var("TODO_VERBOSE", var("TODO_VERBOSE"))?)
            .build()
    }

    /// Returns the backend section.
    #[must_use]
    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    /// Returns the notifications section.
    #[must_use]
    pub fn notifications(&self) -> &NotificationsConfig {
        &self.notifications
    }

    /// Returns the per-request deadline, if any.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns the log verbosity.
    #[must_use]
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }
}

fn parse_var<T>(name: &'static str, raw: Option<&str>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|raw| raw.trim().parse().map_err(|e| ConfigError::invalid_value(name, raw, e)))
        .transpose()
}

fn parse_bool(name: &'static str, raw: Option<&str>) -> Result<Option<bool>, ConfigError> {
    raw.map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(name, raw, "expected a boolean")),
    })
    .transpose()
}
