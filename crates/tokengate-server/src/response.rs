//! HTTP mappings shared by the serving roles

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use tokengate::prelude::LimiterError;

/// `{"message": ...}` body used by the admin and refresh surfaces.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn message(text: impl Into<String>) -> Json<MessageBody> {
    Json(MessageBody {
        message: text.into(),
    })
}

/// `{"error": ...}` body for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error(text: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody { error: text.into() })
}

/// One status code per core error class: callers can tell a rejected
/// argument from a missing client from a retryable outage.
pub fn status_for(err: &LimiterError) -> StatusCode {
    match err {
        LimiterError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        LimiterError::UnknownClient(_) => StatusCode::NOT_FOUND,
        err if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
