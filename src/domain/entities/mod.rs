//! Core domain entities.
//!
//! Entities are plain data structures without persistence logic.
//!
//! # Entity Types
//!
//! - [`Domain`] - A custom hostname owned by one account
//! - [`DomainSettings`] - Serving options, exactly one per domain
//! - [`DnsRecord`] - Mirrored DNS configuration of a domain
//! - [`HealthReport`] - Derived health snapshot (not persisted)
//!
//! # Design Pattern
//!
//! Separate structs are used for creation (`NewDomain`, `NewDomainSettings`,
//! `NewDnsRecord`) and partial updates (`UpdateDomain`, `UpdateDomainSettings`).

pub mod dns_record;
pub mod domain;
pub mod domain_settings;
pub mod health;

pub use dns_record::{DnsRecord, DnsRecordType, NewDnsRecord};
pub use domain::{
    CertificateClaim, CertificateOutcome, CertificateStatus, Domain, NewDomain, StatusDrift,
    UpdateDomain, VerificationMethod,
};
pub use domain_settings::{DomainSettings, NewDomainSettings, RedirectMode, UpdateDomainSettings};
pub use health::{
    CertificateMetrics, DnsStatus, HealthIssue, HealthMetrics, HealthReport, IssueCategory,
    IssueSeverity, OverallStatus, ResponseMetrics, SecurityGrade, SecurityMetrics,
};
