//! Todo service facade and transport adapters.
//!
//! This crate wires the storage crates into a runnable service:
//!
//! - [`TodoService`]: the facade both transports call into. It holds one
//!   [`StorageBackend`](todo_storage::StorageBackend) and translates requests.
//! - [`rpc`]: typed request/response messages of the RPC surface.
//! - [`RestAdapter`]: maps `(method, path, body)` onto facade calls.
//! - [`ServiceConfig`]: resolved configuration, loadable from `TODO_*` variables.
//! - [`bootstrap`]: composes backend, decorators and facade from a config.
//! - [`logging`]: `tracing-subscriber` setup driven by verbosity.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use todo_service::{RestAdapter, ServiceConfig, bootstrap};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder().build()?;
//!     let service = Arc::new(bootstrap::build_service(&config, None).await?);
//!     let rest = RestAdapter::new(service);
//!
//!     let created = rest.handle("POST", "/api/v1/todos", r#"{"id":"1","title":"Buy milk"}"#).await;
//!     assert_eq!(created.status, 201);
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod rest;
pub mod rpc;
pub mod service;

pub use backend::Backend;
pub use bootstrap::BootstrapError;
pub use config::{BackendConfig, ConfigError, MemoryConfig, NotificationsConfig, ServiceConfig};
pub use error::{Result, ServiceError, StatusCategory};
pub use rest::{RestAdapter, RestResponse};
pub use service::TodoService;
