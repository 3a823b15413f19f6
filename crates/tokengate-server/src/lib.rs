//! # tokengate server roles
//!
//! The three serving roles of the rate limiter, one axum router each:
//!
//! - [`admission`]: `POST /check`, the CheckRateLimit contract, plus a
//!   gRPC health probe on the same listener
//! - [`admin`]: policy CRUD over the `rate_limits` table
//! - [`refresh`]: point and bulk bucket invalidation
//!
//! The roles are stateless over their stores: any number of instances
//! may share one bucket store and one policy database.

pub mod admin;
pub mod admission;
pub mod refresh;
pub mod response;
pub mod shutdown;
