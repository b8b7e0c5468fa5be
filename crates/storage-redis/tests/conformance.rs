//! Conformance test suite for `RedisBackend` over the in-process mock store.

#![allow(clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use todo_storage::conformance;
use todo_storage_redis::{
    RedisBackend, RedisBackendConfig,
    testutil::{MockHashStore, mock_backend, mock_backend_with},
};

async fn backend() -> RedisBackend<MockHashStore> {
    mock_backend(MockHashStore::new()).await
}

#[tokio::test]
async fn crud_get_returns_none_for_missing_id() {
    conformance::crud_get_returns_none_for_missing_id(&backend().await).await;
}

#[tokio::test]
async fn crud_create_then_get_round_trips() {
    conformance::crud_create_then_get_round_trips(&backend().await).await;
}

#[tokio::test]
async fn crud_unset_status_round_trips() {
    conformance::crud_unset_status_round_trips(&backend().await).await;
}

#[tokio::test]
async fn crud_create_is_last_write_wins() {
    conformance::crud_create_is_last_write_wins(&backend().await).await;
}

#[tokio::test]
async fn crud_update_missing_id_inserts() {
    conformance::crud_update_missing_id_inserts(&backend().await).await;
}

#[tokio::test]
async fn crud_update_replaces_all_fields() {
    conformance::crud_update_replaces_all_fields(&backend().await).await;
}

#[tokio::test]
async fn crud_delete_removes_record() {
    conformance::crud_delete_removes_record(&backend().await).await;
}

#[tokio::test]
async fn crud_delete_missing_is_noop() {
    conformance::crud_delete_missing_is_noop(&backend().await).await;
}

#[tokio::test]
async fn crud_idempotent_delete() {
    conformance::crud_idempotent_delete(&backend().await).await;
}

#[tokio::test]
async fn listing_reflects_live_ids() {
    conformance::listing_reflects_live_ids(&backend().await).await;
}

#[tokio::test]
async fn listing_create_update_delete_scenario() {
    conformance::listing_create_update_delete_scenario(&backend().await).await;
}

#[tokio::test]
async fn concurrent_creates_to_different_ids() {
    conformance::concurrent_creates_to_different_ids(Arc::new(backend().await)).await;
}

#[tokio::test]
async fn concurrent_writes_to_same_id() {
    conformance::concurrent_writes_to_same_id(Arc::new(backend().await)).await;
}

#[tokio::test]
async fn health_check_succeeds() {
    conformance::health_check_succeeds(&backend().await).await;
}

#[tokio::test]
async fn run_all() {
    conformance::run_all(Arc::new(backend().await)).await;
}

#[tokio::test]
async fn run_all_with_prefix_and_small_scan_batches() {
    let config = RedisBackendConfig::builder()
        .key_prefix("todo:")
        .scan_batch_size(1)
        .build()
        .expect("valid config");
    conformance::run_all(Arc::new(mock_backend_with(MockHashStore::new(), &config).await)).await;
}
