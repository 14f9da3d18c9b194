//! Port for every call leaving the service: DNS lookups, the TLS provider API,
//! the file challenge fetch and HTTPS reachability probes.
//!
//! Services depend on `Arc<dyn DomainProvider>` so tests can substitute a fake.
//! The production adapter is
//! [`crate::infrastructure::provider::ProviderAdapter`].

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Failure of an outbound call. Never used for a negative lookup result.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("DNS lookup failed: {0}")]
    Dns(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),

    /// The provider answered but refused or failed the certificate.
    #[error("certificate not issued: {0}")]
    Rejected(String),
}

/// Certificate state as reported by the TLS provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuanceState {
    Pending,
    Active,
    Expired,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CertificateInfo {
    pub state: IssuanceState,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl CertificateInfo {
    /// Expired either by the provider's word or by its validity window.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.state == IssuanceState::Expired
            || (self.state == IssuanceState::Active
                && self.expires_at.is_some_and(|expires| expires <= now))
    }
}

/// Recommended response headers checked by the HTTPS probe, besides HSTS.
pub const SECURITY_HEADERS: [&str; 4] = [
    "X-Content-Type-Options",
    "X-Frame-Options",
    "Content-Security-Policy",
    "Referrer-Policy",
];

/// Result of a single HTTPS request to the hostname root.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpsProbe {
    pub status: u16,
    pub latency_ms: u64,
    pub hsts: bool,
    /// Entries of [`SECURITY_HEADERS`] absent from the response.
    pub missing_security_headers: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainProvider: Send + Sync {
    /// TXT record contents at `hostname`. Empty when none exist.
    async fn txt_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError>;

    /// CNAME targets at `hostname`, without the trailing dot. Empty when none exist.
    async fn cname_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError>;

    /// A/AAAA addresses of `hostname`. Empty when none exist.
    async fn address_records(&self, hostname: &str) -> Result<Vec<IpAddr>, ProviderError>;

    /// Body of `https://{hostname}{path}`, or `None` when the server answers 4xx.
    async fn fetch_challenge_file(
        &self,
        hostname: &str,
        path: &str,
    ) -> Result<Option<String>, ProviderError>;

    async fn request_certificate(&self, hostname: &str) -> Result<CertificateInfo, ProviderError>;

    async fn renew_certificate(&self, hostname: &str) -> Result<CertificateInfo, ProviderError>;

    async fn certificate_status(&self, hostname: &str) -> Result<CertificateInfo, ProviderError>;

    async fn probe_https(&self, hostname: &str) -> Result<HttpsProbe, ProviderError>;
}
