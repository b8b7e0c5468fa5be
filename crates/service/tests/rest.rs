//! REST adapter routes, status codes and bodies.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use todo_service::{RestAdapter, TodoService};
use todo_storage::MemoryBackend;

#[fixture]
fn rest() -> RestAdapter {
    RestAdapter::new(Arc::new(TodoService::new(Arc::new(MemoryBackend::new(2)))))
}

fn body(response: &todo_service::RestResponse) -> Value {
    serde_json::from_str(&response.body).expect("body should be JSON")
}

#[rstest]
#[tokio::test]
async fn test_crud_lifecycle(rest: RestAdapter) {
    let created = rest.handle("POST", "/api/v1/todos", r#"{"id":"1","title":"Buy milk"}"#).await;
    assert_eq!(created.status, 201);
    assert_eq!(body(&created), json!({"id": "1", "title": "Buy milk", "description": ""}));

    let fetched = rest.handle("GET", "/api/v1/todos/1", "").await;
    assert_eq!(fetched.status, 200);
    assert_eq!(body(&fetched)["title"], "Buy milk");

    let updated = rest
        .handle("PUT", "/api/v1/todos/1", r#"{"id":"1","title":"Buy milk","status":"COMPLETED"}"#)
        .await;
    assert_eq!(updated.status, 200);
    assert_eq!(body(&updated)["status"], "COMPLETED");

    let listed = rest.handle("GET", "/api/v1/todos", "").await;
    assert_eq!(listed.status, 200);
    assert_eq!(body(&listed).as_array().map(Vec::len), Some(1));

    let deleted = rest.handle("DELETE", "/api/v1/todos/1", "").await;
    assert_eq!(deleted.status, 204);
    assert!(deleted.body.is_empty());

    let missing = rest.handle("GET", "/api/v1/todos/1", "").await;
    assert_eq!(missing.status, 404);
    assert_eq!(body(&missing)["code"], 404);

    let empty = rest.handle("GET", "/api/v1/todos", "").await;
    assert_eq!(body(&empty), json!([]));
}

#[rstest]
#[tokio::test]
async fn test_post_without_id_generates_one(rest: RestAdapter) {
    let created = rest.handle("POST", "/api/v1/todos", r#"{"title":"anonymous"}"#).await;
    assert_eq!(created.status, 201);
    let id = body(&created)["id"].as_str().map(str::to_owned).unwrap();
    assert!(!id.is_empty());

    let fetched = rest.handle("GET", &format!("/api/v1/todos/{id}"), "").await;
    assert_eq!(fetched.status, 200);
}

#[rstest]
#[tokio::test]
async fn test_put_with_mismatched_id_is_bad_request(rest: RestAdapter) {
    let response = rest.handle("PUT", "/api/v1/todos/1", r#"{"id":"2","title":"x"}"#).await;
    assert_eq!(response.status, 400);
    assert_eq!(body(&response)["code"], 400);
    assert!(body(&response)["message"].as_str().unwrap().contains("mismatch"));

    let listed = rest.handle("GET", "/api/v1/todos", "").await;
    assert_eq!(body(&listed), json!([]));
}

#[rstest]
#[case::malformed_post("POST", "/api/v1/todos", "{not json", 400)]
#[case::malformed_put("PUT", "/api/v1/todos/1", "42", 400)]
#[case::unknown_status("POST", "/api/v1/todos", r#"{"id":"1","status":"ARCHIVED"}"#, 400)]
#[case::unknown_path("GET", "/api/v1/users", "", 404)]
#[case::nested_path("GET", "/api/v1/todos/1/items", "", 404)]
#[case::collection_delete("DELETE", "/api/v1/todos", "", 405)]
#[case::item_post("POST", "/api/v1/todos/1", "{}", 405)]
#[case::patch("PATCH", "/api/v1/todos/1", "{}", 405)]
#[tokio::test]
async fn test_error_statuses(
    rest: RestAdapter,
    #[case] method: &str,
    #[case] path: &str,
    #[case] request: &str,
    #[case] status: u16,
) {
    let response = rest.handle(method, path, request).await;
    assert_eq!(response.status, status);
    assert_eq!(body(&response)["code"], status);
}

#[rstest]
#[tokio::test]
async fn test_delete_of_missing_id_is_no_content(rest: RestAdapter) {
    let response = rest.handle("DELETE", "/api/v1/todos/nope", "").await;
    assert_eq!(response.status, 204);
}

#[rstest]
#[tokio::test]
async fn test_capacity_exceeded_is_insufficient_storage(rest: RestAdapter) {
    for id in ["a", "b"] {
        let response = rest.handle("POST", "/api/v1/todos", &format!(r#"{{"id":"{id}"}}"#)).await;
        assert_eq!(response.status, 201);
    }

    let response = rest.handle("POST", "/api/v1/todos", r#"{"id":"c"}"#).await;
    assert_eq!(response.status, 507);

    let replaced = rest.handle("PUT", "/api/v1/todos/a", r#"{"title":"still fits"}"#).await;
    assert_eq!(replaced.status, 200);
}
