//! Bucket invalidation after policy changes

use crate::engine::unix_now;
use crate::error::Result;
use crate::store::bucket::{BucketStore, last_refill_key};
use crate::store::models::RefillPolicy;
use crate::store::policy::PolicyStore;
use tracing::info;

/// Point or bulk invalidation of bucket entries after a policy change.
///
/// These are the only policy-propagation paths; the engine never polls
/// for policy changes.
#[derive(Debug, Clone)]
pub struct CacheRefresher<P, B> {
    policies: P,
    buckets: B,
}

impl<P, B> CacheRefresher<P, B>
where
    P: PolicyStore,
    B: BucketStore,
{
    pub fn new(policies: P, buckets: B) -> Self {
        Self { policies, buckets }
    }

    /// Rewrite one client's bucket pair from its current policy, with
    /// the same TTL semantics as lazy initialization.
    ///
    /// An unknown client propagates as
    /// [`crate::error::LimiterError::UnknownClient`] and leaves the
    /// bucket store untouched.
    pub async fn refresh_one(&self, client_id: &str) -> Result<RefillPolicy> {
        let policy = self.policies.lookup(client_id).await?;

        self.buckets
            .set_ex(client_id, policy.capacity, policy.refill_interval())
            .await?;
        self.buckets
            .set(&last_refill_key(client_id), unix_now())
            .await?;

        info!(client_id, capacity = policy.capacity, "bucket refreshed");
        Ok(policy)
    }

    /// Drop every bucket entry; subsequent admissions lazily re-init
    /// each client from current policy.
    pub async fn refresh_all(&self) -> Result<()> {
        self.buckets.flush_all().await?;
        info!("bucket store flushed");
        Ok(())
    }
}
