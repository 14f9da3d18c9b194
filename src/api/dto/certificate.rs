//! DTOs for verification and certificate endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{CertificateStatus, Domain};

/// Response of `POST /api/domains/{id}/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// Response of `GET /api/domains/{id}/ssl/status` and `POST .../ssl/renew`.
#[derive(Debug, Serialize)]
pub struct CertificateStatusResponse {
    pub status: CertificateStatus,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Domain> for CertificateStatusResponse {
    fn from(d: Domain) -> Self {
        CertificateStatusResponse {
            status: d.certificate_status,
            issued_at: d.certificate_issued_at,
            expires_at: d.certificate_expires_at,
            error: d.certificate_error,
        }
    }
}
