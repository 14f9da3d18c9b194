//! Domain entity representing a customer-owned hostname.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How ownership of a hostname is proven.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMethod {
    /// A TXT record on the hostname whose content equals the verification token.
    #[default]
    DnsTxt,
    /// A CNAME record on the hostname pointing at the service's verification target.
    DnsCname,
    /// A file under `/.well-known/` whose body equals the verification token.
    File,
}

/// TLS certificate lifecycle state.
///
/// ```text
/// PENDING ──initialize──▶ INITIALIZING ──▶ ACTIVE | FAILED
/// ACTIVE ──health──▶ EXPIRED          ACTIVE ──renew fails──▶ FAILED
/// FAILED ──renew──▶ INITIALIZING
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Pending,
    Initializing,
    Active,
    Failed,
    Expired,
    Inactive,
}

impl CertificateStatus {
    /// States from which `initialize` may move into [`CertificateStatus::Initializing`].
    pub const INITIALIZE_FROM: &'static [CertificateStatus] =
        &[CertificateStatus::Pending, CertificateStatus::Failed];

    /// States from which `renew` may move into [`CertificateStatus::Initializing`].
    pub const RENEW_FROM: &'static [CertificateStatus] = &[
        CertificateStatus::Pending,
        CertificateStatus::Active,
        CertificateStatus::Failed,
        CertificateStatus::Expired,
        CertificateStatus::Inactive,
    ];

    /// Whether this status alone makes a domain's health critical.
    pub fn is_critical(self) -> bool {
        matches!(self, CertificateStatus::Failed | CertificateStatus::Expired)
    }
}

/// A custom hostname attached to the service by one owner.
#[derive(Debug, Clone)]
pub struct Domain {
    pub id: i64,
    pub owner_id: i64,
    pub hostname: String,
    pub is_verified: bool,
    /// Kept after verification for audit; never reused for another challenge.
    pub verification_token: String,
    pub verification_method: VerificationMethod,
    pub verified_at: Option<DateTime<Utc>>,
    pub certificate_status: CertificateStatus,
    pub certificate_issued_at: Option<DateTime<Utc>>,
    pub certificate_expires_at: Option<DateTime<Utc>>,
    /// Last provider error message, cleared when a certificate becomes active.
    pub certificate_error: Option<String>,
    pub is_active: bool,
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for registering a new domain.
///
/// New domains are unverified, active, and have a `PENDING` certificate.
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub owner_id: i64,
    pub hostname: String,
    pub verification_token: String,
    pub verification_method: VerificationMethod,
}

/// Partial update of a domain and its settings.
///
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateDomain {
    pub is_active: Option<bool>,
    pub verification_method: Option<VerificationMethod>,
    pub settings: super::UpdateDomainSettings,
}

impl UpdateDomain {
    pub fn is_empty(&self) -> bool {
        self.is_active.is_none()
            && self.verification_method.is_none()
            && self.settings.is_empty()
    }
}

/// Result of a finished certificate operation, written back over `INITIALIZING`.
#[derive(Debug, Clone, PartialEq)]
pub enum CertificateOutcome {
    Issued {
        issued_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    },
    Failed {
        error: String,
    },
}

/// A won compare-and-set into `INITIALIZING`.
///
/// Only a completion carrying the same `operation_id` can write the outcome;
/// a stale takeover issues a new id and supersedes this one.
#[derive(Debug, Clone)]
pub struct CertificateClaim {
    pub domain: Domain,
    pub operation_id: i64,
}

/// Certificate status correction observed by a health check.
///
/// Applied only if the stored status still equals `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDrift {
    pub from: CertificateStatus,
    pub to: CertificateStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_string_round_trip_matches_storage() {
        assert_eq!(CertificateStatus::Initializing.as_ref(), "INITIALIZING");
        assert_eq!(
            CertificateStatus::from_str("EXPIRED").unwrap(),
            CertificateStatus::Expired
        );
        assert!(CertificateStatus::from_str("expired").is_err());
    }

    #[test]
    fn test_method_storage_names() {
        assert_eq!(VerificationMethod::DnsTxt.as_ref(), "DNS_TXT");
        assert_eq!(VerificationMethod::DnsCname.as_ref(), "DNS_CNAME");
        assert_eq!(VerificationMethod::File.as_ref(), "FILE");
        assert_eq!(VerificationMethod::default(), VerificationMethod::DnsTxt);
    }

    #[test]
    fn test_method_json_names() {
        let json = serde_json::to_string(&VerificationMethod::DnsCname).unwrap();
        assert_eq!(json, "\"DNS_CNAME\"");
    }

    #[test]
    fn test_initializing_is_never_an_entry_state() {
        assert!(!CertificateStatus::INITIALIZE_FROM.contains(&CertificateStatus::Initializing));
        assert!(!CertificateStatus::RENEW_FROM.contains(&CertificateStatus::Initializing));
        assert!(!CertificateStatus::INITIALIZE_FROM.contains(&CertificateStatus::Active));
        assert!(CertificateStatus::RENEW_FROM.contains(&CertificateStatus::Active));
    }

    #[test]
    fn test_critical_states() {
        assert!(CertificateStatus::Failed.is_critical());
        assert!(CertificateStatus::Expired.is_critical());
        assert!(!CertificateStatus::Active.is_critical());
        assert!(!CertificateStatus::Pending.is_critical());
    }

    #[test]
    fn test_update_domain_default_is_empty() {
        assert!(UpdateDomain::default().is_empty());

        let update = UpdateDomain {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
