//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented by concrete repositories in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`DomainRepository`] - Domain registry, certificate state transitions
//! - [`DnsRecordRepository`] - Mirrored DNS records
//! - [`TokenRepository`] - API token authentication
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod dns_record_repository;
pub mod domain_repository;
pub mod token_repository;

pub use dns_record_repository::DnsRecordRepository;
pub use domain_repository::DomainRepository;
pub use token_repository::{ApiToken, TokenRepository};

#[cfg(test)]
pub use dns_record_repository::MockDnsRecordRepository;
#[cfg(test)]
pub use domain_repository::MockDomainRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
