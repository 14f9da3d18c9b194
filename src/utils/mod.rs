//! Utility functions shared across layers.
//!
//! - [`db_error`] - Database error classification
//! - [`hostname`] - Hostname normalization and grammar validation
//! - [`verification_token`] - Ownership challenge token generation

pub mod db_error;
pub mod hostname;
pub mod verification_token;
