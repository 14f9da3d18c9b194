//! Request middleware.
//!
//! - [`auth`] - Resolves the bearer token to an [`auth::AuthenticatedOwner`]
//! - [`rate_limit`] - Per-client token bucket
//! - [`tracing`] - Request spans and latency logging

pub mod auth;
pub mod rate_limit;
pub mod tracing;
