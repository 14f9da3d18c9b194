//! HTTP API for domain onboarding.
//!
//! Handlers translate requests into service calls scoped to the
//! authenticated owner and render results as JSON. Failures use the
//! [`crate::error::AppError`] envelope.
//!
//! # Modules
//!
//! - [`dto`] - Request bodies (validated) and response shapes
//! - [`handlers`] - Domain, DNS record, certificate and health handlers
//! - [`middleware`] - Bearer authentication, rate limiting, request tracing
//! - [`routes`] - The protected `/api` route table

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
