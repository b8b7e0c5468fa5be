//! REST adapter over [`TodoService`].
//!
//! The adapter is transport-agnostic: an HTTP server hands it the method, the
//! request path and the raw body, and writes back the returned status and
//! JSON body.
//!
//! | Method   | Path                  | Success            |
//! |----------|-----------------------|--------------------|
//! | `GET`    | `/api/v1/todos`       | 200, record array  |
//! | `POST`   | `/api/v1/todos`       | 201, stored record |
//! | `GET`    | `/api/v1/todos/{id}`  | 200, record        |
//! | `PUT`    | `/api/v1/todos/{id}`  | 200, stored record |
//! | `DELETE` | `/api/v1/todos/{id}`  | 204, no body       |
//!
//! Errors are rendered as `{"code": <status>, "message": <text>}`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use todo_storage::{Record, StorageError};
use tracing::{debug, warn};

use crate::{
    error::{Result, ServiceError},
    service::TodoService,
};

/// Path prefix of the todo collection.
pub const TODOS_PATH: &str = "/api/v1/todos";

/// Status and body produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body; empty for `204`.
    pub body: String,
}

impl RestResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    fn empty(status: u16) -> Self {
        Self { status, body: String::new() }
    }

    fn error(status: u16, message: &str) -> Self {
        Self { status, body: json!({ "code": status, "message": message }).to_string() }
    }

    fn from_error(err: &ServiceError) -> Self {
        let status = err.category().http_status();
        if status >= 500 {
            warn!(status, error = %err, "Request failed");
        }
        Self::error(status, &err.to_string())
    }
}

enum Route<'a> {
    Collection,
    Item(&'a str),
}

fn route(path: &str) -> Option<Route<'_>> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    let rest = path.strip_prefix(TODOS_PATH)?;
    match rest.trim_end_matches('/') {
        "" => Some(Route::Collection),
        item => {
            let id = item.strip_prefix('/')?;
            (!id.contains('/')).then_some(Route::Item(id))
        },
    }
}

fn parse_record(body: &str) -> Result<Record> {
    serde_json::from_str(body).map_err(|e| ServiceError::InvalidPayload(e.to_string()))
}

/// Translates REST requests into [`TodoService`] calls.
#[derive(Debug, Clone)]
pub struct RestAdapter {
    service: Arc<TodoService>,
}

impl RestAdapter {
    /// Creates an adapter over `service`.
    #[must_use]
    pub fn new(service: Arc<TodoService>) -> Self {
        Self { service }
    }

    /// Returns the facade this adapter calls.
    #[must_use]
    pub fn service(&self) -> &Arc<TodoService> {
        &self.service
    }

    /// Handles one request.
    #[tracing::instrument(skip(self, body))]
    pub async fn handle(&self, method: &str, path: &str, body: &str) -> RestResponse {
        let Some(route) = route(path) else {
            return RestResponse::error(404, &format!("no route for {path}"));
        };

        let response = match (method, route) {
            ("GET", Route::Collection) => self.list().await,
            ("POST", Route::Collection) => self.create(body).await,
            ("GET", Route::Item(id)) => self.get(id).await,
            ("PUT", Route::Item(id)) => self.update(id, body).await,
            ("DELETE", Route::Item(id)) => self.delete(id).await,
            (method, _) => Ok(RestResponse::error(405, &format!("method {method} not allowed"))),
        };

        let response = response.unwrap_or_else(|e| RestResponse::from_error(&e));
        debug!(status = response.status, "Handled request");
        response
    }

    async fn list(&self) -> Result<RestResponse> {
        let records = self.service.list_records().await?;
        Ok(RestResponse::json(200, &records))
    }

    async fn create(&self, body: &str) -> Result<RestResponse> {
        let record = self.service.create_record(parse_record(body)?).await?;
        Ok(RestResponse::json(201, &record))
    }

    async fn get(&self, id: &str) -> Result<RestResponse> {
        match self.service.get_record(id).await? {
            Some(record) => Ok(RestResponse::json(200, &record)),
            None => Err(StorageError::not_found(id).into()),
        }
    }

    async fn update(&self, id: &str, body: &str) -> Result<RestResponse> {
        let record = self.service.update_at(id, parse_record(body)?).await?;
        Ok(RestResponse::json(200, &record))
    }

    async fn delete(&self, id: &str) -> Result<RestResponse> {
        self.service.delete_record(id).await?;
        Ok(RestResponse::empty(204))
    }
}
