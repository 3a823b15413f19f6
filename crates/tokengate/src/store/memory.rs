//! In-memory store fakes
//!
//! Process-local implementations of the two store capabilities, honoring
//! the same contracts as the Redis and Postgres backends (including the
//! expiry semantics of `set_ex`). The engine and refresher run against
//! these in tests and local development without external services.

use crate::error::{LimiterError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::bucket::BucketStore;
use super::models::RefillPolicy;
use super::policy::PolicyStore;

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self) -> bool {
        self.expires_at.is_none_or(|deadline| Instant::now() < deadline)
    }
}

/// DashMap-backed bucket store with lazy expiry.
#[derive(Debug, Default, Clone)]
pub struct MemoryBucketStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys, for test assertions.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        // The read guard must drop before the expired-entry removal can
        // touch the same shard.
        let live = match self.entries.get(key) {
            Some(entry) => entry.live(),
            None => return Ok(false),
        };
        if !live {
            self.entries.remove(key);
        }
        Ok(live)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let value = match self.entries.get(key) {
            Some(entry) if entry.live() => return Ok(Some(entry.value)),
            Some(_) => None,
            None => return Ok(None),
        };
        self.entries.remove(key);
        Ok(value)
    }

    async fn set(&self, key: &str, value: i64) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: i64, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        // Entry lock makes the read-modify-write atomic per key, the
        // same guarantee DECRBY gives. A missing or expired key counts
        // from zero, as Redis does.
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: 0,
            expires_at: None,
        });
        if !entry.live() {
            *entry = Entry {
                value: 0,
                expires_at: None,
            };
        }
        entry.value -= delta;
        Ok(entry.value)
    }

    async fn flush_all(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

/// DashMap-backed policy store.
#[derive(Debug, Default, Clone)]
pub struct MemoryPolicyStore {
    policies: Arc<DashMap<String, RefillPolicy>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a client's policy.
    pub fn put(&self, client_id: &str, capacity: i64, refill_interval_secs: i64) {
        self.policies.insert(
            client_id.to_string(),
            RefillPolicy {
                capacity,
                refill_interval_secs,
            },
        );
    }

    pub fn remove(&self, client_id: &str) {
        self.policies.remove(client_id);
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn lookup(&self, client_id: &str) -> Result<RefillPolicy> {
        self.policies
            .get(client_id)
            .map(|policy| *policy)
            .ok_or_else(|| LimiterError::UnknownClient(client_id.to_string()))
    }
}
