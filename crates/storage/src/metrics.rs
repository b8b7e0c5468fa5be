//! Storage metrics collection and the [`MeteredBackend`] decorator.
//!
//! [`Metrics`] keeps, per record operation:
//!
//! - call counts and error counts
//! - cumulative latency in microseconds
//! - p50/p95/p99 over a sliding window of recent samples
//!
//! plus counters for timeouts and capacity rejections.
//!
//! # Memory Ordering
//!
//! All atomic operations use `Ordering::Relaxed`. Each counter is
//! independent and monotonically increasing, so a snapshot may show counters
//! from slightly different instants relative to each other.
//!
//! # Percentile Tracking
//!
//! Each operation keeps a circular buffer of the most recent 1024 latency
//! samples guarded by a [`parking_lot::Mutex`]. Percentiles are computed at
//! snapshot time by sorting a copy of the buffer.
//!
//! # Usage
//!
//! ```
//! use todo_storage::{MeteredBackend, MemoryBackend, MetricsCollector, Record, StorageBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MeteredBackend::new(MemoryBackend::new(10));
//! backend.create(Record::new("1", "Buy milk")).await.unwrap();
//! backend.get("1").await.unwrap();
//!
//! let snapshot = backend.metrics().snapshot();
//! assert_eq!(snapshot.create.count, 1);
//! assert_eq!(snapshot.get.count, 1);
//! # });
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    types::Record,
};

/// Default number of latency samples retained per operation.
const DEFAULT_HISTOGRAM_WINDOW_SIZE: usize = 1024;

/// Error rate above which [`Metrics::log_metrics`] warns.
const HIGH_ERROR_RATE: f64 = 0.05;

/// Record operations tracked by [`Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `create`
    Create,
    /// `update`
    Update,
    /// `get_all`
    GetAll,
    /// `get`
    Get,
    /// `delete`
    Delete,
    /// `health_check`
    HealthCheck,
}

impl Operation {
    const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Update,
        Operation::GetAll,
        Operation::Get,
        Operation::Delete,
        Operation::HealthCheck,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Returns the operation name as used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::GetAll => "get_all",
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::HealthCheck => "health_check",
        }
    }
}

// ── LatencyPercentiles ──────────────────────────────────────────────────

/// Latency percentiles for a single operation, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyPercentiles {
    /// 50th percentile (median).
    pub p50: u64,
    /// 95th percentile.
    pub p95: u64,
    /// 99th percentile.
    pub p99: u64,
}

// ── LatencyHistogram ────────────────────────────────────────────────────

struct LatencyHistogram {
    inner: Mutex<HistogramInner>,
}

struct HistogramInner {
    buf: Vec<u64>,
    pos: usize,
    capacity: usize,
}

impl LatencyHistogram {
    fn new(capacity: usize) -> Self {
        Self { inner: Mutex::new(HistogramInner { buf: Vec::with_capacity(capacity), pos: 0, capacity }) }
    }

    fn record(&self, value_us: u64) {
        let mut inner = self.inner.lock();
        let pos = inner.pos;
        if inner.buf.len() < inner.capacity {
            inner.buf.push(value_us);
        } else {
            inner.buf[pos] = value_us;
        }
        inner.pos = (pos + 1) % inner.capacity;
    }

    fn percentiles(&self) -> LatencyPercentiles {
        let inner = self.inner.lock();
        if inner.buf.is_empty() {
            return LatencyPercentiles::default();
        }
        let mut sorted = inner.buf.clone();
        sorted.sort_unstable();
        let len = sorted.len();
        LatencyPercentiles {
            p50: sorted[percentile_index(len, 50)],
            p95: sorted[percentile_index(len, 95)],
            p99: sorted[percentile_index(len, 99)],
        }
    }

    fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.buf.clear();
        inner.pos = 0;
    }
}

/// Nearest-rank index: `ceil(percentile/100 * len) - 1`, clamped to range.
fn percentile_index(len: usize, percentile: u32) -> usize {
    if len == 0 {
        return 0;
    }
    let rank = (u64::from(percentile) * len as u64).div_ceil(100) as usize;
    rank.saturating_sub(1).min(len - 1)
}

// ── Snapshots ───────────────────────────────────────────────────────────

/// Counters for one operation at snapshot time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationSnapshot {
    /// Completed calls, successful or not.
    pub count: u64,
    /// Calls that returned an error.
    pub error_count: u64,
    /// Cumulative latency in microseconds.
    pub latency_us: u64,
    /// Percentiles over the recent sample window.
    pub percentiles: LatencyPercentiles,
}

impl OperationSnapshot {
    /// Average latency in microseconds, or `0.0` if nothing was recorded.
    #[must_use]
    pub fn avg_latency_us(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.latency_us as f64 / self.count as f64 }
    }
}

/// Metrics snapshot for export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// `create` counters.
    pub create: OperationSnapshot,
    /// `update` counters.
    pub update: OperationSnapshot,
    /// `get_all` counters.
    pub get_all: OperationSnapshot,
    /// `get` counters.
    pub get: OperationSnapshot,
    /// `delete` counters.
    pub delete: OperationSnapshot,
    /// `health_check` counters.
    pub health_check: OperationSnapshot,
    /// Errors that were [`StorageError::Timeout`].
    pub timeout_count: u64,
    /// Errors that were [`StorageError::CapacityExceeded`].
    pub capacity_rejections: u64,
}

impl MetricsSnapshot {
    /// Returns the snapshot for one operation.
    #[must_use]
    pub fn operation(&self, op: Operation) -> &OperationSnapshot {
        match op {
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::GetAll => &self.get_all,
            Operation::Get => &self.get,
            Operation::Delete => &self.delete,
            Operation::HealthCheck => &self.health_check,
        }
    }

    /// Total calls across all operations.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        Operation::ALL.iter().map(|op| self.operation(*op).count).sum()
    }

    /// Total errors across all operations.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        Operation::ALL.iter().map(|op| self.operation(*op).error_count).sum()
    }

    /// Fraction of calls that failed, or `0.0` if nothing was recorded.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        let total = self.total_operations();
        if total == 0 { 0.0 } else { self.total_errors() as f64 / total as f64 }
    }
}

// ── Metrics ─────────────────────────────────────────────────────────────

struct OperationCounters {
    count: AtomicU64,
    error_count: AtomicU64,
    latency_us: AtomicU64,
    histogram: LatencyHistogram,
}

impl OperationCounters {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            latency_us: AtomicU64::new(0),
            histogram: LatencyHistogram::new(DEFAULT_HISTOGRAM_WINDOW_SIZE),
        }
    }

    fn snapshot(&self) -> OperationSnapshot {
        OperationSnapshot {
            count: self.count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            latency_us: self.latency_us.load(Ordering::Relaxed),
            percentiles: self.histogram.percentiles(),
        }
    }

    fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.error_count.store(0, Ordering::Relaxed);
        self.latency_us.store(0, Ordering::Relaxed);
        self.histogram.reset();
    }
}

struct MetricsInner {
    operations: [OperationCounters; 6],
    timeout_count: AtomicU64,
    capacity_rejections: AtomicU64,
}

/// Thread-safe metrics collector.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").field("snapshot", &self.snapshot()).finish()
    }
}

impl Metrics {
    /// Creates a collector with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                operations: std::array::from_fn(|_| OperationCounters::new()),
                timeout_count: AtomicU64::new(0),
                capacity_rejections: AtomicU64::new(0),
            }),
        }
    }

    /// Records one completed call of `op` taking `duration`.
    pub fn record(&self, op: Operation, duration: Duration) {
        let counters = &self.inner.operations[op.index()];
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        counters.count.fetch_add(1, Ordering::Relaxed);
        counters.latency_us.fetch_add(micros, Ordering::Relaxed);
        counters.histogram.record(micros);
    }

    /// Records that a call of `op` failed with `error`.
    pub fn record_error(&self, op: Operation, error: &StorageError) {
        self.inner.operations[op.index()].error_count.fetch_add(1, Ordering::Relaxed);
        match error {
            StorageError::Timeout => {
                self.inner.timeout_count.fetch_add(1, Ordering::Relaxed);
            },
            StorageError::CapacityExceeded { .. } => {
                self.inner.capacity_rejections.fetch_add(1, Ordering::Relaxed);
            },
            _ => {},
        }
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let op = |op: Operation| self.inner.operations[op.index()].snapshot();
        MetricsSnapshot {
            create: op(Operation::Create),
            update: op(Operation::Update),
            get_all: op(Operation::GetAll),
            get: op(Operation::Get),
            delete: op(Operation::Delete),
            health_check: op(Operation::HealthCheck),
            timeout_count: self.inner.timeout_count.load(Ordering::Relaxed),
            capacity_rejections: self.inner.capacity_rejections.load(Ordering::Relaxed),
        }
    }

    /// Resets all metrics to zero.
    pub fn reset(&self) {
        for counters in &self.inner.operations {
            counters.reset();
        }
        self.inner.timeout_count.store(0, Ordering::Relaxed);
        self.inner.capacity_rejections.store(0, Ordering::Relaxed);
    }

    /// Logs current metrics at INFO level.
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();

        if snapshot.total_operations() == 0 {
            return;
        }

        tracing::info!(
            create_count = snapshot.create.count,
            update_count = snapshot.update.count,
            get_all_count = snapshot.get_all.count,
            get_count = snapshot.get.count,
            delete_count = snapshot.delete.count,
            avg_get_latency_us = snapshot.get.avg_latency_us(),
            get_p99 = snapshot.get.percentiles.p99,
            create_p99 = snapshot.create.percentiles.p99,
            error_rate = snapshot.error_rate(),
            timeout_count = snapshot.timeout_count,
            capacity_rejections = snapshot.capacity_rejections,
            "Storage metrics snapshot"
        );

        if snapshot.error_rate() > HIGH_ERROR_RATE {
            warn!(
                error_rate = snapshot.error_rate(),
                error_count = snapshot.total_errors(),
                total_ops = snapshot.total_operations(),
                "High storage error rate detected"
            );
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Exposes the [`Metrics`] instance for a storage backend.
pub trait MetricsCollector {
    /// Returns a reference to the backend's metrics collector.
    fn metrics(&self) -> &Metrics;
}

// ── MeteredBackend ──────────────────────────────────────────────────────

/// Decorator that records [`Metrics`] for every call to the inner backend.
///
/// Results pass through unchanged.
#[derive(Debug, Clone)]
pub struct MeteredBackend<S> {
    inner: S,
    metrics: Metrics,
}

impl<S: StorageBackend> MeteredBackend<S> {
    /// Wraps `inner` with a fresh collector.
    pub fn new(inner: S) -> Self {
        Self::with_metrics(inner, Metrics::new())
    }

    /// Wraps `inner`, recording into an existing collector.
    pub fn with_metrics(inner: S, metrics: Metrics) -> Self {
        Self { inner, metrics }
    }

    /// Returns a reference to the inner backend.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn observe<T, F>(&self, op: Operation, call: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        let start = Instant::now();
        let result = call.await;
        self.metrics.record(op, start.elapsed());
        if let Err(e) = &result {
            self.metrics.record_error(op, e);
        }
        result
    }
}

impl<S> MetricsCollector for MeteredBackend<S> {
    fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[async_trait]
impl<S: StorageBackend> StorageBackend for MeteredBackend<S> {
    async fn create(&self, record: Record) -> StorageResult<Record> {
        self.observe(Operation::Create, self.inner.create(record)).await
    }

    async fn update(&self, record: Record) -> StorageResult<Record> {
        self.observe(Operation::Update, self.inner.update(record)).await
    }

    async fn get_all(&self) -> StorageResult<Vec<Record>> {
        self.observe(Operation::GetAll, self.inner.get_all()).await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Record>> {
        self.observe(Operation::Get, self.inner.get(id)).await
    }

    async fn delete(&self, id: &str) -> StorageResult<String> {
        self.observe(Operation::Delete, self.inner.delete(id)).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.observe(Operation::HealthCheck, self.inner.health_check()).await
    }
}
