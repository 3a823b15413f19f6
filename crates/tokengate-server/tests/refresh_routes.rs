//! Refresh surface over the in-memory stores

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use tokengate::prelude::*;
use tokengate_server::refresh;
use tower::ServiceExt;

fn refresh_router(policies: &MemoryPolicyStore, buckets: &MemoryBucketStore) -> Router {
    refresh::router(CacheRefresher::new(policies.clone(), buckets.clone()))
}

async fn post_json(
    router: Router,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn refresh_id_rewrites_the_bucket_pair() {
    let policies = MemoryPolicyStore::new();
    policies.put("c1", 5, 10);
    let buckets = MemoryBucketStore::new();
    buckets.set("c1", 1).await.unwrap();

    let (status, body) = post_json(
        refresh_router(&policies, &buckets),
        "/refresh/id",
        Some(serde_json::json!({"client_id": "c1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("c1"));
    assert_eq!(buckets.get("c1").await.unwrap(), Some(5));
    assert!(buckets.get("c1_last_refill").await.unwrap().is_some());
}

#[tokio::test]
async fn refresh_id_unknown_client_is_404() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();

    let (status, body) = post_json(
        refresh_router(&policies, &buckets),
        "/refresh/id",
        Some(serde_json::json!({"client_id": "ghost"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
    assert!(buckets.is_empty());
}

#[tokio::test]
async fn refresh_id_empty_client_is_400() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();

    let (status, _body) = post_json(
        refresh_router(&policies, &buckets),
        "/refresh/id",
        Some(serde_json::json!({"client_id": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_all_flushes_every_bucket() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();
    buckets.set("c1", 1).await.unwrap();
    buckets.set("c1_last_refill", 12345).await.unwrap();
    buckets.set("c2", 4).await.unwrap();

    let (status, body) = post_json(
        refresh_router(&policies, &buckets),
        "/refresh/all",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert!(buckets.is_empty());
}

#[tokio::test]
async fn malformed_payload_is_a_client_error() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();

    let (status, _body) = post_json(
        refresh_router(&policies, &buckets),
        "/refresh/id",
        Some(serde_json::json!({"client": "missing field"})),
    )
    .await;

    assert!(status.is_client_error());
}
