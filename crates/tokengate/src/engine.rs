//! The token-bucket limiter engine

use crate::error::Result;
use crate::load::{LoadCell, LoadSample, scale_capacity};
use crate::store::bucket::{BucketStore, last_refill_key};
use crate::store::policy::PolicyStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Outcome of one admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Tokens left in the bucket after this admission.
    pub remaining: i64,
}

/// Orchestrates the token-bucket algorithm against the shared stores:
/// policy lookup → dynamic scaling → lazy init → refill → admit/debit.
///
/// Only `decr_by` is atomic across concurrent admissions of the same
/// client. Init and refill are read-modify-write sequences that may
/// race; every writer clamps the token count to capacity, which bounds
/// the over-grant from a race to one interval's worth of tokens. That
/// slack is contract, not a bug.
#[derive(Debug, Clone)]
pub struct LimiterEngine<P, B> {
    policies: P,
    buckets: B,
    load: Arc<LoadCell>,
    dynamic_enabled: bool,
}

impl<P, B> LimiterEngine<P, B>
where
    P: PolicyStore,
    B: BucketStore,
{
    pub fn new(policies: P, buckets: B, load: Arc<LoadCell>, dynamic_enabled: bool) -> Self {
        Self {
            policies,
            buckets,
            load,
            dynamic_enabled,
        }
    }

    /// Decide one admission, debiting the bucket when it is granted.
    ///
    /// `tokens_required <= 0` is trivially allowed and never debits.
    /// The bucket store is untouched for unknown clients.
    pub async fn admit(&self, client_id: &str, tokens_required: i64) -> Result<Admission> {
        let policy = self.policies.lookup(client_id).await?;
        let capacity = self.effective_capacity(policy.capacity);
        // Rate and capacity are the same number: one full bucket is
        // credited per interval.
        let refill_rate = capacity;
        let interval_secs = policy.refill_interval_secs.max(1);
        let now = unix_now();

        self.init_if_absent(client_id, capacity, interval_secs, now)
            .await?;
        let tokens = self
            .refill(client_id, capacity, refill_rate, interval_secs, now)
            .await?;

        if tokens_required <= 0 {
            return Ok(Admission {
                allowed: true,
                remaining: tokens,
            });
        }

        if tokens >= tokens_required {
            self.buckets.decr_by(client_id, tokens_required).await?;
            let remaining = tokens - tokens_required;
            debug!(client_id, tokens_required, remaining, "admission granted");
            Ok(Admission {
                allowed: true,
                remaining,
            })
        } else {
            debug!(client_id, tokens_required, remaining = tokens, "admission rejected");
            Ok(Admission {
                allowed: false,
                remaining: tokens,
            })
        }
    }

    fn effective_capacity(&self, base_capacity: i64) -> i64 {
        if !self.dynamic_enabled {
            return base_capacity;
        }
        let LoadSample { cpu, mem } = self.load.snapshot();
        scale_capacity(base_capacity, cpu, mem)
    }

    /// First-touch creation of the bucket pair.
    ///
    /// The token key carries a TTL of one interval so an idle client's
    /// bucket can expire, which is equivalent to a full refresh on the
    /// next admission. The companion timestamp is checked on its own,
    /// so a dangling `_last_refill` left behind by token-key expiry is
    /// replaced here too.
    async fn init_if_absent(
        &self,
        client_id: &str,
        capacity: i64,
        interval_secs: i64,
        now: i64,
    ) -> Result<()> {
        if !self.buckets.exists(client_id).await? {
            self.buckets
                .set_ex(client_id, capacity, Duration::from_secs(interval_secs as u64))
                .await?;
            debug!(client_id, capacity, "initialized bucket");
        }

        let refill_key = last_refill_key(client_id);
        if !self.buckets.exists(&refill_key).await? {
            self.buckets.set(&refill_key, now).await?;
        }
        Ok(())
    }

    /// Lazy refill: credit whole elapsed intervals, clamp to capacity,
    /// advance the timestamp.
    ///
    /// Partial intervals carry no credit, so refills are deterministic
    /// and monotonic. A clock regression credits nothing and leaves the
    /// stored timestamp where it was. Values that went missing or
    /// negative between steps (TTL expiry, racing debits) read as zero.
    async fn refill(
        &self,
        client_id: &str,
        capacity: i64,
        refill_rate: i64,
        interval_secs: i64,
        now: i64,
    ) -> Result<i64> {
        let refill_key = last_refill_key(client_id);
        let last_refill = self.buckets.get(&refill_key).await?.unwrap_or(now);
        let tokens = self.buckets.get(client_id).await?.unwrap_or(0).max(0);

        let intervals_passed = if now >= last_refill {
            (now - last_refill) / interval_secs
        } else {
            0
        };
        let new_tokens =
            capacity.min(tokens.saturating_add(intervals_passed.saturating_mul(refill_rate)));

        if now >= last_refill {
            self.buckets.set(&refill_key, now).await?;
        }
        self.buckets.set(client_id, new_tokens).await?;

        Ok(new_tokens)
    }
}

/// Wall-clock seconds since the UNIX epoch.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
