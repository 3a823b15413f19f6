//! Policy admin surface
//!
//! Six POST actions over the `rate_limits` table. Bodies are camelCase,
//! matching the callers that already exist. A duplicate client id on
//! insert is reported as a skip, not an error, and deleting a missing
//! client reports the fact in the message body.

use crate::response::{error, message, status_for};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokengate::prelude::*;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error as log_error;

const TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    pub client_id: String,
    pub rate_limit: i32,
    pub refill_interval: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub client_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListRequest {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub num_records: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub client_id: String,
    pub new_rate_limit: i32,
    pub new_refill_interval: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyBody {
    pub client_id: String,
    pub rate_limit: i32,
    pub refill_interval: i32,
}

impl From<ClientPolicy> for PolicyBody {
    fn from(policy: ClientPolicy) -> Self {
        Self {
            client_id: policy.client_id,
            rate_limit: policy.rate_limit,
            refill_interval: policy.refill_interval,
        }
    }
}

pub fn router(store: PgPolicyStore) -> Router {
    Router::new()
        .route("/insert", post(insert))
        .route("/delete", post(delete))
        .route("/list-clients", post(list))
        .route("/generate-random-clients", post(generate))
        .route("/update-client-parameters", post(update))
        .route("/delete-all-clients", post(delete_all))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(TIMEOUT_SECS)))
        .with_state(store)
}

fn failure(err: LimiterError) -> Response {
    log_error!("admin operation failed: {err}");
    (status_for(&err), error(err.to_string())).into_response()
}

async fn insert(
    State(store): State<PgPolicyStore>,
    Json(request): Json<InsertRequest>,
) -> Response {
    let new = NewClientPolicy {
        client_id: request.client_id,
        rate_limit: request.rate_limit,
        refill_interval: request.refill_interval,
    };
    match store.create(&new).await {
        Ok(CreateOutcome::Created(policy)) => message(format!(
            "New client with ID {} successfully inserted.",
            policy.client_id
        ))
        .into_response(),
        Ok(CreateOutcome::DuplicateSkipped) => message(format!(
            "ClientID {} already exists in the database. Skipping duplicate entry.",
            new.client_id
        ))
        .into_response(),
        Err(err) => failure(err),
    }
}

async fn delete(
    State(store): State<PgPolicyStore>,
    Json(request): Json<DeleteRequest>,
) -> Response {
    match store.delete(&request.client_id).await {
        Ok(true) => {
            message(format!("Client {} successfully deleted.", request.client_id)).into_response()
        }
        Ok(false) => message(format!(
            "Client {} does not exist in the database.",
            request.client_id
        ))
        .into_response(),
        Err(err) => failure(err),
    }
}

async fn list(State(store): State<PgPolicyStore>, Json(request): Json<ListRequest>) -> Response {
    match store.list(request.limit, request.offset).await {
        Ok(policies) => {
            let body: Vec<PolicyBody> = policies.into_iter().map(PolicyBody::from).collect();
            Json(body).into_response()
        }
        Err(err) => failure(err),
    }
}

async fn generate(
    State(store): State<PgPolicyStore>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    if request.num_records == 0 {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            error("Number of records must be positive"),
        )
            .into_response();
    }
    match store.generate_random(request.num_records).await {
        Ok(report) => message(format!(
            "{} random clients generated successfully, {} skipped as duplicates.",
            report.created, report.skipped
        ))
        .into_response(),
        Err(err) => failure(err),
    }
}

async fn update(
    State(store): State<PgPolicyStore>,
    Json(request): Json<UpdateRequest>,
) -> Response {
    match store
        .update(
            &request.client_id,
            request.new_rate_limit,
            request.new_refill_interval,
        )
        .await
    {
        Ok(policy) => Json(PolicyBody::from(policy)).into_response(),
        Err(err) => failure(err),
    }
}

async fn delete_all(State(store): State<PgPolicyStore>) -> Response {
    match store.delete_all().await {
        Ok(removed) => {
            message(format!("All rate limits deleted successfully ({removed} rows)."))
                .into_response()
        }
        Err(err) => failure(err),
    }
}
