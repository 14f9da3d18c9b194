//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation. Health reports are serialized straight from
//! [`crate::domain::entities::HealthReport`].

pub mod certificate;
pub mod dns_record;
pub mod domain;
pub mod health;
