//! Application layer services implementing business logic.
//!
//! Services consume repository traits and the [`crate::domain::provider::DomainProvider`]
//! port, and provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::domain_service::DomainService`] - Domain registry
//! - [`services::dns_record_service::DnsRecordService`] - Mirrored DNS records
//! - [`services::verification_service::VerificationService`] - Ownership challenges
//! - [`services::certificate_service::CertificateService`] - TLS certificate lifecycle
//! - [`services::health_service::HealthService`] - Live health reports
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
