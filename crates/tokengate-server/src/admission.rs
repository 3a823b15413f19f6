//! Admission surface
//!
//! One route, `POST /check`, carrying the CheckRateLimit contract:
//! `{client_id, tokens_required}` in, `{allowed, remaining_tokens}`
//! out. Every error response carries `allowed: false` and a status code
//! distinguishing invalid-argument, unknown-client, and transient
//! failures; a broken bucket store rejects admissions rather than
//! admitting blindly.

use crate::response::status_for;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokengate::prelude::*;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

const TIMEOUT_SECS: u64 = 5;
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub client_id: String,
    pub tokens_required: i64,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    pub remaining_tokens: i64,
}

/// Build the admission router over any store pair.
///
/// Liveness checks ride the admission listener: kubelets speak the
/// [gRPC health protocol](https://github.com/grpc/grpc/blob/master/doc/health-checking.md)
/// at it, so the health service is mounted next to `/check` instead of
/// getting its own port.
pub fn router<P, B>(service: AdmissionService<P, B>) -> Router
where
    P: PolicyStore + Clone + Send + Sync + 'static,
    B: BucketStore + Clone + Send + Sync + 'static,
{
    let (_, health_service) = tonic_health::server::health_reporter();
    Router::new()
        .route("/check", post(check::<P, B>))
        .route_service("/grpc.health.v1.Health/Check", health_service)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(TIMEOUT_SECS)))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(service)
}

async fn check<P, B>(
    State(service): State<AdmissionService<P, B>>,
    Json(request): Json<CheckRequest>,
) -> Response
where
    P: PolicyStore + Clone + Send + Sync + 'static,
    B: BucketStore + Clone + Send + Sync + 'static,
{
    match service
        .check_rate_limit(&request.client_id, request.tokens_required)
        .await
    {
        Ok(admission) => Json(CheckResponse {
            allowed: admission.allowed,
            remaining_tokens: admission.remaining,
        })
        .into_response(),
        Err(err) => {
            if err.is_transient() {
                error!(client_id = %request.client_id, "admission failed: {err}");
            }
            (
                status_for(&err),
                Json(serde_json::json!({
                    "allowed": false,
                    "error": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}
