//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgDomainRepository`] - Domain registry and certificate state
//! - [`PgDnsRecordRepository`] - Mirrored DNS records
//! - [`PgTokenRepository`] - API token storage and validation

pub mod pg_dns_record_repository;
pub mod pg_domain_repository;
pub mod pg_token_repository;

pub use pg_dns_record_repository::PgDnsRecordRepository;
pub use pg_domain_repository::PgDomainRepository;
pub use pg_token_repository::PgTokenRepository;
