//! Shared bucket state store
//!
//! The engine needs six KV operations and nothing else, so they are a
//! trait: production runs against Redis, tests against
//! [`crate::store::memory::MemoryBucketStore`]. Only `DECRBY` is atomic
//! across concurrent callers; the engine's contract is built on that
//! single guarantee.

use crate::error::{LimiterError, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::fmt;
use std::time::Duration;

/// Suffix of the companion key holding the refill timestamp.
const LAST_REFILL_SUFFIX: &str = "_last_refill";

/// Companion key holding a client's last refill timestamp.
///
/// The key format is a wire contract between the limiter and the
/// refresher; both derive keys through here.
pub fn last_refill_key(client_id: &str) -> String {
    format!("{client_id}{LAST_REFILL_SUFFIX}")
}

/// KV operations the limiter needs from the shared store.
///
/// Keys are client ids (plus the `_last_refill` companion), values are
/// signed 64-bit integers.
#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Missing keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Unconditional write, no expiry.
    async fn set(&self, key: &str, value: i64) -> Result<()>;

    /// Write with an expiration window. Only bucket initialization and
    /// refresh use this; an idle client's bucket may expire after one
    /// interval, which is equivalent to a full refresh on next touch.
    async fn set_ex(&self, key: &str, value: i64, ttl: Duration) -> Result<()>;

    /// Atomic decrement, returns the post-decrement value.
    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64>;

    /// Bulk delete of every entry in the store.
    async fn flush_all(&self) -> Result<()>;
}

/// Redis-backed bucket store.
#[derive(Clone)]
pub struct RedisBucketStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisBucketStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBucketStore").finish()
    }
}

impl RedisBucketStore {
    /// Connect to the store and establish a managed connection that
    /// reconnects on failure.
    pub async fn connect(address: &str) -> Result<Self> {
        let client = redis::Client::open(address).map_err(|e| {
            LimiterError::Configuration(format!("invalid bucket store address {address}: {e}"))
        })?;
        let conn = client.get_connection_manager().await.map_err(|e| {
            LimiterError::BucketFetch(format!("failed to connect to {address}: {e}"))
        })?;
        Ok(Self { conn })
    }

    /// Round-trip PING, used by startup probes.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(fetch_err)?;
        Ok(())
    }
}

fn fetch_err(err: redis::RedisError) -> LimiterError {
    LimiterError::BucketFetch(err.to_string())
}

fn mutate_err(err: redis::RedisError) -> LimiterError {
    LimiterError::BucketMutate(err.to_string())
}

#[async_trait]
impl BucketStore for RedisBucketStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(fetch_err)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(fetch_err)
    }

    async fn set(&self, key: &str, value: i64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(mutate_err)?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: i64, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(mutate_err)?;
        Ok(())
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        conn.decr(key, delta).await.map_err(mutate_err)
    }

    async fn flush_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(mutate_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_refill_key_format() {
        assert_eq!(last_refill_key("c1"), "c1_last_refill");
        assert_eq!(last_refill_key(""), "_last_refill");
    }
}
