//! Cache refresh surface
//!
//! `POST /refresh/id` rewrites one client's bucket pair from current
//! policy, `POST /refresh/all` flushes the bucket store. These are the
//! only policy-propagation paths; the limiter never polls the policy
//! table for changes.

use crate::response::{error, message, status_for};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use std::time::Duration;
use tokengate::prelude::*;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error as log_error;

const TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct RefreshIdRequest {
    pub client_id: String,
}

pub fn router<P, B>(refresher: CacheRefresher<P, B>) -> Router
where
    P: PolicyStore + Clone + Send + Sync + 'static,
    B: BucketStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/refresh/id", post(refresh_id::<P, B>))
        .route("/refresh/all", post(refresh_all::<P, B>))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(TIMEOUT_SECS)))
        .with_state(refresher)
}

async fn refresh_id<P, B>(
    State(refresher): State<CacheRefresher<P, B>>,
    Json(request): Json<RefreshIdRequest>,
) -> Response
where
    P: PolicyStore + Clone + Send + Sync + 'static,
    B: BucketStore + Clone + Send + Sync + 'static,
{
    if request.client_id.is_empty() {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            error("client_id must not be empty"),
        )
            .into_response();
    }

    match refresher.refresh_one(&request.client_id).await {
        Ok(_) => message(format!(
            "Refreshed bucket cache for ID: {}",
            request.client_id
        ))
        .into_response(),
        Err(err) => {
            log_error!(client_id = %request.client_id, "refresh failed: {err}");
            (status_for(&err), error(err.to_string())).into_response()
        }
    }
}

async fn refresh_all<P, B>(State(refresher): State<CacheRefresher<P, B>>) -> Response
where
    P: PolicyStore + Clone + Send + Sync + 'static,
    B: BucketStore + Clone + Send + Sync + 'static,
{
    match refresher.refresh_all().await {
        Ok(()) => message("All bucket caches refreshed successfully").into_response(),
        Err(err) => {
            log_error!("refresh all failed: {err}");
            (status_for(&err), error(err.to_string())).into_response()
        }
    }
}
