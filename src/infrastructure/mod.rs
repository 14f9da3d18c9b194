//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and outbound provider calls.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`provider`] - DNS, TLS provider API and HTTPS probes

pub mod persistence;
pub mod provider;
