//! Domain layer containing business entities and the contracts the
//! application layer depends on.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`provider`] - Outbound DNS/TLS/HTTP port
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository and provider traits define contracts implemented by the
//!   infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod entities;
pub mod provider;
pub mod repositories;
