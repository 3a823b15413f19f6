#![forbid(unsafe_code)]
//! # Distributed token-bucket rate limiting
//!
//! This crate provides the core of a distributed rate limiter: per-client
//! token buckets whose state lives in a shared Redis-compatible KV store
//! and whose capacity/refill policy lives in a Postgres table.
//! Asynchronous I/O is based on [`tokio`], database access on [`sqlx`],
//! bucket storage on [`redis`].
//!
//! One admission flows through [`service::AdmissionService`] into
//! [`engine::LimiterEngine`]: the policy row is resolved, optionally
//! scaled down under host load ([`load`]), the bucket is lazily
//! initialized and refilled in the shared store ([`store`]), and the
//! request is admitted and debited or rejected.
//!
//! The engine talks to its backends through the [`store::PolicyStore`]
//! and [`store::BucketStore`] traits, so it runs unchanged against the
//! in-memory fakes in [`store::memory`].
//!
//! [`tokio`]: https://docs.rs/tokio
//! [`sqlx`]: https://docs.rs/sqlx
//! [`redis`]: https://docs.rs/redis

pub mod config;
pub mod engine;
pub mod error;
pub mod load;
pub mod refresh;
pub mod service;
pub mod store;

/// Commonly used imports and re-exports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::engine::{Admission, LimiterEngine};
    pub use crate::error::{LimiterError, Result};
    pub use crate::load::{LoadCell, LoadSample, LoadSampler, scale_capacity};
    pub use crate::refresh::CacheRefresher;
    pub use crate::service::AdmissionService;
    pub use crate::store::bucket::{BucketStore, RedisBucketStore, last_refill_key};
    pub use crate::store::memory::{MemoryBucketStore, MemoryPolicyStore};
    pub use crate::store::models::{ClientPolicy, NewClientPolicy, RefillPolicy};
    pub use crate::store::policy::{CreateOutcome, GenerateReport, PgPolicyStore, PolicyStore};
}
