//! The service facade both transports call into.
//!
//! [`TodoService`] owns exactly one [`StorageBackend`] (usually a decorated
//! one) and holds no storage logic of its own. It validates requests, fills
//! in generated ids and bounds backend calls with an optional deadline.

use std::{future::Future, sync::Arc, time::Duration};

use todo_storage::{Metrics, MetricsSnapshot, Record, StorageBackend, StorageError, StorageResult};
use tracing::{debug, info};

use crate::{
    error::{Result, ServiceError},
    rpc::{
        API_VERSION, CreateOrUpdateRequest, CreateOrUpdateResponse, DeleteRequest, DeleteResponse,
        GetAllRequest, GetAllResponse, GetRequest, GetResponse,
    },
};

/// Facade over one storage backend.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use todo_service::TodoService;
/// use todo_storage::{MemoryBackend, Record};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = TodoService::new(Arc::new(MemoryBackend::new(10)));
/// let created = service.create_record(Record::new("1", "Buy milk")).await?;
/// assert_eq!(service.get_record("1").await?, Some(created));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TodoService {
    backend: Arc<dyn StorageBackend>,
    request_timeout: Option<Duration>,
    metrics: Option<Metrics>,
}

impl std::fmt::Debug for TodoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoService")
            .field("request_timeout", &self.request_timeout)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl TodoService {
    /// Creates a facade over `backend` with no deadline.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend, request_timeout: None, metrics: None }
    }

    /// Bounds every backend call by `timeout`.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Attaches the metrics handle the backend stack records into.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the backend this facade delegates to.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Returns the configured deadline, if any.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns a snapshot of backend metrics, if metrics are attached.
    #[must_use]
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(Metrics::snapshot)
    }

    /// Logs the attached metrics at INFO, warning when the error rate is high.
    /// Does nothing without metrics.
    pub fn log_metrics(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.log_metrics();
        }
    }

    /// Runs `op`, dropping it once the request timeout elapses.
    async fn bounded<T>(&self, op: impl Future<Output = StorageResult<T>>) -> Result<T> {
        let result = match self.request_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, op).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(?timeout, "Request deadline elapsed");
                    Err(StorageError::timeout())
                },
            },
            None => op.await,
        };
        result.map_err(ServiceError::from)
    }

    /// Stores `record`, generating a UUID v4 id when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] if the backend fails.
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    pub async fn create_record(&self, mut record: Record) -> Result<Record> {
        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().to_string();
            debug!(id = %record.id, "Generated record id");
        }
        info!(id = %record.id, title = %record.title, "Creating todo");
        self.bounded(self.backend.create(record)).await
    }

    /// Replaces the record with `record.id`, inserting it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] if `record.id` is empty, or
    /// [`ServiceError::Storage`] if the backend fails.
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    pub async fn update_record(&self, record: Record) -> Result<Record> {
        if record.id.is_empty() {
            return Err(ServiceError::MissingId);
        }
        info!(title = %record.title, "Updating todo");
        self.bounded(self.backend.update(record)).await
    }

    /// Update addressed by a path id, as the REST `PUT` route does it.
    ///
    /// An empty body id takes the path id; any other body id must equal it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::IdMismatch`] if the ids differ, otherwise as
    /// [`update_record`](Self::update_record).
    #[tracing::instrument(skip(self, record))]
    pub async fn update_at(&self, path_id: &str, mut record: Record) -> Result<Record> {
        if record.id.is_empty() {
            record.id = path_id.to_owned();
        } else if record.id != path_id {
            return Err(ServiceError::IdMismatch {
                path_id: path_id.to_owned(),
                body_id: record.id,
            });
        }
        self.update_record(record).await
    }

    /// Returns every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] if the backend fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_records(&self) -> Result<Vec<Record>> {
        let records = self.bounded(self.backend.get_all()).await?;
        debug!(count = records.len(), "Listed todos");
        Ok(records)
    }

    /// Returns the record for `id`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] if `id` is empty, or
    /// [`ServiceError::Storage`] if the backend fails.
    #[tracing::instrument(skip(self))]
    pub async fn get_record(&self, id: &str) -> Result<Option<Record>> {
        if id.is_empty() {
            return Err(ServiceError::MissingId);
        }
        self.bounded(self.backend.get(id)).await
    }

    /// Removes the record for `id`; an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] if `id` is empty, or
    /// [`ServiceError::Storage`] if the backend fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_record(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(ServiceError::MissingId);
        }
        info!("Deleting todo");
        self.bounded(self.backend.delete(id)).await
    }

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] if the health check fails.
    pub async fn health(&self) -> Result<()> {
        self.bounded(self.backend.health_check()).await
    }

    /// RPC `Create`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidPayload`] if the request carries no
    /// record, otherwise as [`create_record`](Self::create_record).
    pub async fn create(&self, request: CreateOrUpdateRequest) -> Result<CreateOrUpdateResponse> {
        let record = request.todo.ok_or_else(|| missing_todo("create"))?;
        let todo = self.create_record(record).await?;
        Ok(CreateOrUpdateResponse { api: API_VERSION.to_owned(), todo })
    }

    /// RPC `Update`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidPayload`] if the request carries no
    /// record, otherwise as [`update_record`](Self::update_record).
    pub async fn update(&self, request: CreateOrUpdateRequest) -> Result<CreateOrUpdateResponse> {
        let record = request.todo.ok_or_else(|| missing_todo("update"))?;
        let todo = self.update_record(record).await?;
        Ok(CreateOrUpdateResponse { api: API_VERSION.to_owned(), todo })
    }

    /// RPC `GetAll`.
    ///
    /// # Errors
    ///
    /// As [`list_records`](Self::list_records).
    pub async fn get_all(&self, _request: GetAllRequest) -> Result<GetAllResponse> {
        let todos = self.list_records().await?;
        Ok(GetAllResponse { api: API_VERSION.to_owned(), todos })
    }

    /// RPC `Get`. An unknown id yields a response with no record.
    ///
    /// # Errors
    ///
    /// As [`get_record`](Self::get_record).
    pub async fn get(&self, request: GetRequest) -> Result<GetResponse> {
        let todo = self.get_record(&request.id).await?;
        Ok(GetResponse { api: API_VERSION.to_owned(), todo })
    }

    /// RPC `Delete`.
    ///
    /// # Errors
    ///
    /// As [`delete_record`](Self::delete_record).
    pub async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse> {
        let id = self.delete_record(&request.id).await?;
        Ok(DeleteResponse { api: API_VERSION.to_owned(), id })
    }
}

fn missing_todo(operation: &str) -> ServiceError {
    ServiceError::InvalidPayload(format!("{operation} request carries no todo"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use todo_storage::{MemoryBackend, MeteredBackend, Operation, Status};

    use super::*;

    fn service() -> TodoService {
        TodoService::new(Arc::new(MemoryBackend::new(10)))
    }

    #[tokio::test]
    async fn test_create_generates_uuid_for_empty_id() {
        let created = service().create_record(Record::new("", "no id")).await.unwrap();
        assert!(uuid::Uuid::parse_str(&created.id).is_ok());
    }

    #[tokio::test]
    async fn test_create_keeps_caller_id() {
        let created = service().create_record(Record::new("abc", "t")).await.unwrap();
        assert_eq!(created.id, "abc");
    }

    #[tokio::test]
    async fn test_update_at_fills_empty_body_id() {
        let service = service();
        let updated = service.update_at("7", Record::new("", "from path")).await.unwrap();
        assert_eq!(updated.id, "7");
        assert_eq!(service.get_record("7").await.unwrap().unwrap().title, "from path");
    }

    #[tokio::test]
    async fn test_update_at_rejects_mismatch_without_writing() {
        let service = service();
        let err = service.update_at("1", Record::new("2", "x")).await.unwrap_err();
        assert!(matches!(err, ServiceError::IdMismatch { ref path_id, ref body_id }
            if path_id == "1" && body_id == "2"));
        assert!(service.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_ids_are_rejected() {
        let service = service();
        assert!(matches!(service.get_record("").await, Err(ServiceError::MissingId)));
        assert!(matches!(service.delete_record("").await, Err(ServiceError::MissingId)));
        assert!(matches!(
            service.update_record(Record::new("", "x")).await,
            Err(ServiceError::MissingId)
        ));
    }

    #[tokio::test]
    async fn test_rpc_responses_carry_api_version() {
        let service = service();
        let record = Record::builder().id("1").title("t").status(Status::Completed).build();

        let created = service.create(CreateOrUpdateRequest::new(record.clone())).await.unwrap();
        assert_eq!(created.api, "v1");
        assert_eq!(created.todo, record);

        let fetched = service.get(GetRequest { id: "1".into() }).await.unwrap();
        assert_eq!((fetched.api.as_str(), fetched.todo), ("v1", Some(record)));

        let deleted = service.delete(DeleteRequest { id: "1".into() }).await.unwrap();
        assert_eq!(deleted.id, "1");

        let all = service.get_all(GetAllRequest {}).await.unwrap();
        assert!(all.todos.is_empty());
    }

    #[tokio::test]
    async fn test_rpc_create_without_todo_is_invalid() {
        let err = service().create(CreateOrUpdateRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_metrics_snapshot_reflects_backend_calls() {
        let metrics = Metrics::new();
        let backend = MeteredBackend::with_metrics(MemoryBackend::new(10), metrics.clone());
        let service = TodoService::new(Arc::new(backend)).with_metrics(metrics);

        service.create_record(Record::new("1", "a")).await.unwrap();
        service.get_record("1").await.unwrap();

        let snapshot = service.metrics().unwrap();
        assert_eq!(snapshot.operation(Operation::Create).count, 1);
        assert_eq!(snapshot.operation(Operation::Get).count, 1);
    }

    #[tokio::test]
    async fn test_log_metrics_reads_attached_metrics_only() {
        service().log_metrics();

        let metrics = Metrics::new();
        let backend = MeteredBackend::with_metrics(MemoryBackend::new(10), metrics.clone());
        let service = TodoService::new(Arc::new(backend)).with_metrics(metrics);
        service.list_records().await.unwrap();
        service.log_metrics();

        assert_eq!(service.metrics().unwrap().total_operations(), 1);
    }

    #[tokio::test]
    async fn test_health_passes_through() {
        service().health().await.unwrap();
    }
}
