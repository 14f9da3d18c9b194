//! Business logic services for the application layer.

pub mod auth_service;
pub mod certificate_service;
pub mod dns_record_service;
pub mod domain_service;
pub mod health_service;
pub mod verification_service;

pub use auth_service::AuthService;
pub use certificate_service::{CertificateService, CertificateSettings};
pub use dns_record_service::DnsRecordService;
pub use domain_service::DomainService;
pub use health_service::{HealthService, HealthSettings};
pub use verification_service::{VerificationInstructions, VerificationService, VerificationSettings};
