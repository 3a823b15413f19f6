//! Core error types

use thiserror::Error;

/// Errors surfaced by the limiter core.
///
/// Everything except [`LimiterError::InvalidArgument`] and
/// [`LimiterError::UnknownClient`] is transient in contract: the engine
/// never retries internally because it cannot distinguish a store-side
/// duplicate from a fresh request, so retry belongs to the caller.
#[derive(Debug, Error)]
pub enum LimiterError {
    /// Malformed input, rejected before any state is touched
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No policy row exists for this client
    #[error("client {0} not found")]
    UnknownClient(String),

    /// Policy database lookup failed
    #[error("policy fetch failed: {0}")]
    PolicyFetch(String),

    /// Bucket store read failed
    #[error("bucket store read failed: {0}")]
    BucketFetch(String),

    /// Bucket store write failed
    #[error("bucket store write failed: {0}")]
    BucketMutate(String),

    /// The per-call deadline expired before the stores answered
    #[error("admission deadline exceeded")]
    DeadlineExceeded,

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unexpected error
    #[error("unexpected error: {0}")]
    Internal(String),
}

impl LimiterError {
    /// Whether the caller may retry the operation as-is.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LimiterError::PolicyFetch(_)
                | LimiterError::BucketFetch(_)
                | LimiterError::BucketMutate(_)
                | LimiterError::DeadlineExceeded
        )
    }
}

/// Result type for limiter operations
pub type Result<T> = std::result::Result<T, LimiterError>;
