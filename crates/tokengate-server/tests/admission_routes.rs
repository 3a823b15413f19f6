//! Admission surface over the in-memory stores

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use std::sync::Arc;
use std::time::Duration;
use tokengate::prelude::*;
use tokengate_server::admission;
use tower::ServiceExt;

fn admission_router(policies: &MemoryPolicyStore, buckets: &MemoryBucketStore) -> Router {
    let engine = LimiterEngine::new(
        policies.clone(),
        buckets.clone(),
        Arc::new(LoadCell::new()),
        false,
    );
    admission::router(AdmissionService::new(engine, Duration::from_secs(1)))
}

async fn post_json(
    router: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn check_admits_and_reports_remaining() {
    let policies = MemoryPolicyStore::new();
    policies.put("c1", 5, 10);
    let buckets = MemoryBucketStore::new();

    let (status, body) = post_json(
        admission_router(&policies, &buckets),
        "/check",
        serde_json::json!({"client_id": "c1", "tokens_required": 3}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], serde_json::json!(true));
    assert_eq!(body["remaining_tokens"], serde_json::json!(2));
}

#[tokio::test]
async fn check_rejects_when_drained() {
    let policies = MemoryPolicyStore::new();
    policies.put("c1", 2, 600);
    let buckets = MemoryBucketStore::new();
    let router = admission_router(&policies, &buckets);

    let (status, body) = post_json(
        router.clone(),
        "/check",
        serde_json::json!({"client_id": "c1", "tokens_required": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], serde_json::json!(true));

    let (status, body) = post_json(
        router,
        "/check",
        serde_json::json!({"client_id": "c1", "tokens_required": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], serde_json::json!(false));
    assert_eq!(body["remaining_tokens"], serde_json::json!(0));
}

#[tokio::test]
async fn unknown_client_is_404_and_not_allowed() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();

    let (status, body) = post_json(
        admission_router(&policies, &buckets),
        "/check",
        serde_json::json!({"client_id": "ghost", "tokens_required": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["allowed"], serde_json::json!(false));
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn invalid_arguments_are_400() {
    let policies = MemoryPolicyStore::new();
    policies.put("c1", 5, 10);
    let buckets = MemoryBucketStore::new();
    let router = admission_router(&policies, &buckets);

    let (status, body) = post_json(
        router.clone(),
        "/check",
        serde_json::json!({"client_id": "", "tokens_required": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["allowed"], serde_json::json!(false));

    let (status, _body) = post_json(
        router,
        "/check",
        serde_json::json!({"client_id": "c1", "tokens_required": -4}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();

    let response = admission_router(&policies, &buckets)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
