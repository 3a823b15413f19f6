//! Policy data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::time::Duration;

/// One row of the `rate_limits` table: the authoritative capacity and
/// refill interval for a client. Created, updated, and deleted by the
/// admin surface; the limiter only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClientPolicy {
    pub id: i64,
    pub client_id: String,
    /// Bucket capacity, also the number of tokens granted per interval
    pub rate_limit: i32,
    /// Whole seconds between refill credits
    pub refill_interval: i32,
}

/// Parameters for inserting a policy row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClientPolicy {
    pub client_id: String,
    pub rate_limit: i32,
    pub refill_interval: i32,
}

/// Capacity and refill interval as the engine consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillPolicy {
    /// Maximum tokens the bucket can hold; a full capacity's worth is
    /// credited every interval.
    pub capacity: i64,
    /// Whole seconds between refill events, always positive.
    pub refill_interval_secs: i64,
}

impl RefillPolicy {
    pub fn refill_interval(&self) -> Duration {
        Duration::from_secs(self.refill_interval_secs.max(1) as u64)
    }
}

impl From<&ClientPolicy> for RefillPolicy {
    fn from(policy: &ClientPolicy) -> Self {
        Self {
            capacity: i64::from(policy.rate_limit),
            refill_interval_secs: i64::from(policy.refill_interval),
        }
    }
}
