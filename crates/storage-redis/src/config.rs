//! Configuration for the Redis storage backend.
//!
//! This module provides [`RedisBackendConfig`] which configures the
//! connection to Redis and the key namespace records live in.

use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroizing;

use crate::error::{RedisStorageError, Result};

/// Default Redis host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default Redis port.
pub const DEFAULT_PORT: u16 = 6379;

/// Default `COUNT` hint for `SCAN`.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 10;

/// Default bound on connecting and the initial ping (5 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`RedisBackend`](crate::RedisBackend).
///
/// # Key Scoping
///
/// Every record is stored under `{key_prefix}{id}`. With the default empty
/// prefix the record id is the Redis key and `get_all` scans the whole
/// database, so the database should hold nothing but records.
///
/// # Example
///
/// ```no_run
/// use todo_storage_redis::RedisBackendConfig;
///
/// let config = RedisBackendConfig::builder()
///     .host("redis.internal")
///     .port(6380)
///     .username("todo")
///     .password("secret")
///     .key_prefix("todo:")
///     .build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisBackendConfig {
    /// Server host name.
    #[serde(default = "default_host")]
    pub(crate) host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub(crate) port: u16,

    /// ACL user name.
    #[serde(default)]
    pub(crate) username: Option<String>,

    /// Password, wiped from memory on drop.
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub(crate) password: Option<Zeroizing<String>>,

    /// Prefix prepended to every record id.
    #[serde(default)]
    pub(crate) key_prefix: String,

    /// `COUNT` hint for each `SCAN` round trip.
    #[serde(default = "default_scan_batch_size")]
    pub(crate) scan_batch_size: usize,

    /// Bound on connecting and the initial ping.
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub(crate) connect_timeout: Duration,
}

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scan_batch_size() -> usize {
    DEFAULT_SCAN_BATCH_SIZE
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<Zeroizing<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()).map(Zeroizing::new))
}

impl std::fmt::Debug for RedisBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackendConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("key_prefix", &self.key_prefix)
            .field("scan_batch_size", &self.scan_batch_size)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            key_prefix: String::new(),
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[bon::bon]
impl RedisBackendConfig {
    /// Creates a new configuration, validating all fields.
    ///
    /// # Optional Fields
    ///
    /// * `host` - Server host (default: `localhost`).
    /// * `port` - Server port (default: 6379).
    /// * `username` / `password` - Credentials; an empty value means none.
    /// * `key_prefix` - Prefix for record keys (default: empty).
    /// * `scan_batch_size` - `SCAN` count hint (default: 10).
    /// * `connect_timeout` - Connect and ping bound (default: 5 seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Host is empty
    /// - Port is zero
    /// - Scan batch size is zero
    #[builder]
    pub fn new(
        #[builder(into, default = DEFAULT_HOST.to_owned())] host: String,
        #[builder(default = DEFAULT_PORT)] port: u16,
        #[builder(into)] username: Option<String>,
        #[builder(into)] password: Option<String>,
        #[builder(into, default)] key_prefix: String,
        #[builder(default = DEFAULT_SCAN_BATCH_SIZE)] scan_batch_size: usize,
        #[builder(default = DEFAULT_CONNECT_TIMEOUT)] connect_timeout: Duration,
    ) -> Result<Self> {
        let config = Self {
            host,
            port,
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()).map(Zeroizing::new),
            key_prefix,
            scan_batch_size,
            connect_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that deserialization cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`RedisStorageError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(RedisStorageError::Config("host cannot be empty".into()));
        }
        if self.port == 0 {
            return Err(RedisStorageError::Config("port must be non-zero".into()));
        }
        if self.scan_batch_size == 0 {
            return Err(RedisStorageError::Config("scan_batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the user name, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns whether a password is configured.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Returns the record key prefix.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Returns the `SCAN` count hint.
    #[must_use]
    pub fn scan_batch_size(&self) -> usize {
        self.scan_batch_size
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Builds the client connection info for database 0.
    pub(crate) fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: 0,
                username: self.username.clone(),
                password: self.password.as_ref().map(|p| p.as_str().to_owned()),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedisBackendConfig::builder().build().unwrap();
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 6379);
        assert_eq!(config.username(), None);
        assert!(!config.has_password());
        assert_eq!(config.key_prefix(), "");
        assert_eq!(config.scan_batch_size(), 10);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.address(), "localhost:6379");
    }

    #[test]
    fn test_empty_credentials_mean_none() {
        let config = RedisBackendConfig::builder().username("").password("").build().unwrap();
        assert_eq!(config.username(), None);
        assert!(!config.has_password());
    }

    #[test]
    fn test_validation_empty_host() {
        let result = RedisBackendConfig::builder().host("").build();
        assert!(matches!(result, Err(RedisStorageError::Config(_))));
    }

    #[test]
    fn test_validation_zero_port() {
        let result = RedisBackendConfig::builder().port(0).build();
        assert!(matches!(result, Err(RedisStorageError::Config(_))));
    }

    #[test]
    fn test_validation_zero_scan_batch() {
        let result = RedisBackendConfig::builder().scan_batch_size(0).build();
        assert!(matches!(result, Err(RedisStorageError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = RedisBackendConfig::builder().password("hunter2").build().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_deserialize_with_humantime() {
        let config: RedisBackendConfig = serde_json::from_str(
            r#"{"host":"cache","password":"pw","connect_timeout":"250ms","key_prefix":"todo:"}"#,
        )
        .unwrap();
        assert_eq!(config.host(), "cache");
        assert_eq!(config.port(), 6379);
        assert!(config.has_password());
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.key_prefix(), "todo:");
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result = serde_json::from_str::<RedisBackendConfig>(r#"{"hostname":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_omits_password() {
        let config = RedisBackendConfig::builder().password("pw").build().unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_connection_info_carries_credentials() {
        let config =
            RedisBackendConfig::builder().host("h").port(7000).username("u").password("p").build().unwrap();
        let info = config.connection_info();
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 7000) if host == "h"));
        assert_eq!(info.redis.db, 0);
        assert_eq!(info.redis.username.as_deref(), Some("u"));
        assert_eq!(info.redis.password.as_deref(), Some("p"));
    }
}
