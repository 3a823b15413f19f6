//! Storage backends
//!
//! Two narrow capabilities with one production implementation each:
//! [`policy::PolicyStore`] resolves per-client capacity and refill
//! policy from Postgres, [`bucket::BucketStore`] holds the live bucket
//! state in a shared Redis-compatible KV store. [`memory`] carries
//! process-local fakes with the same contracts.

pub mod bucket;
pub mod memory;
pub mod models;
pub mod policy;

pub use bucket::{BucketStore, RedisBucketStore, last_refill_key};
pub use memory::{MemoryBucketStore, MemoryPolicyStore};
pub use models::{ClientPolicy, NewClientPolicy, RefillPolicy};
pub use policy::{CreateOutcome, GenerateReport, PgPolicyStore, PolicyStore};
