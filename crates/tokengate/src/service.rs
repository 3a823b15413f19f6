//! Admission boundary

use crate::engine::{Admission, LimiterEngine};
use crate::error::{LimiterError, Result};
use crate::store::bucket::BucketStore;
use crate::store::policy::PolicyStore;
use std::time::Duration;
use tracing::warn;

/// Stateless boundary in front of the engine: validates the request,
/// enforces the per-call deadline, delegates.
///
/// Any number of service instances may share one bucket store and one
/// policy store; nothing here is per-instance state.
#[derive(Debug, Clone)]
pub struct AdmissionService<P, B> {
    engine: LimiterEngine<P, B>,
    deadline: Duration,
}

impl<P, B> AdmissionService<P, B>
where
    P: PolicyStore,
    B: BucketStore,
{
    pub fn new(engine: LimiterEngine<P, B>, deadline: Duration) -> Self {
        Self { engine, deadline }
    }

    /// `CheckRateLimit(client_id, tokens_required) → (allowed, remaining)`.
    ///
    /// An expired deadline aborts the outstanding store calls and
    /// surfaces as the transient [`LimiterError::DeadlineExceeded`];
    /// writes the store already accepted are not rolled back.
    pub async fn check_rate_limit(
        &self,
        client_id: &str,
        tokens_required: i64,
    ) -> Result<Admission> {
        if client_id.is_empty() {
            return Err(LimiterError::InvalidArgument(
                "client_id must not be empty".to_string(),
            ));
        }
        if tokens_required < 0 {
            return Err(LimiterError::InvalidArgument(format!(
                "tokens_required must not be negative, got {tokens_required}"
            )));
        }

        match tokio::time::timeout(self.deadline, self.engine.admit(client_id, tokens_required))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    client_id,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "admission deadline exceeded"
                );
                Err(LimiterError::DeadlineExceeded)
            }
        }
    }
}
