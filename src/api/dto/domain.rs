//! DTOs for domain management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use validator::Validate;

use crate::application::services::VerificationInstructions;
use crate::domain::entities::{
    CertificateStatus, Domain, DomainSettings, NewDomainSettings, RedirectMode,
    UpdateDomain, UpdateDomainSettings, VerificationMethod,
};

/// Request body for `POST /api/domains`.
///
/// The hostname is normalized and validated by the registry, which reports
/// `invalid_hostname` rather than a generic validation error.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDomainRequest {
    pub hostname: String,

    #[validate(nested)]
    pub settings: Option<DomainSettingsRequest>,

    /// Defaults to `DNS_TXT`.
    pub verification_method: Option<VerificationMethod>,
}

/// Settings supplied together with a new domain.
#[derive(Debug, Deserialize, Validate)]
pub struct DomainSettingsRequest {
    pub redirect_mode: Option<RedirectMode>,

    /// Comma-separated nameserver hostnames.
    #[validate(length(min = 1, max = 1024))]
    pub custom_nameservers: Option<String>,

    pub force_ssl: Option<bool>,
}

impl From<DomainSettingsRequest> for NewDomainSettings {
    fn from(r: DomainSettingsRequest) -> Self {
        let defaults = NewDomainSettings::default();
        NewDomainSettings {
            redirect_mode: r.redirect_mode.unwrap_or(defaults.redirect_mode),
            custom_nameservers: r.custom_nameservers,
            force_ssl: r.force_ssl.unwrap_or(defaults.force_ssl),
        }
    }
}

/// Request body for `PATCH /api/domains/{id}`.
///
/// All fields are optional, only provided fields are changed.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDomainRequest {
    pub is_active: Option<bool>,

    /// Rejected once the domain is verified.
    pub verification_method: Option<VerificationMethod>,

    #[validate(nested)]
    pub settings: Option<UpdateDomainSettingsRequest>,
}

/// Partial settings update.
///
/// # `custom_nameservers` semantics
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear the list
/// - **String** → replace the list
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDomainSettingsRequest {
    pub redirect_mode: Option<RedirectMode>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(min = 1, max = 1024))]
    pub custom_nameservers: Option<Option<String>>,

    pub force_ssl: Option<bool>,
}

impl From<UpdateDomainRequest> for UpdateDomain {
    fn from(r: UpdateDomainRequest) -> Self {
        let settings = r.settings.unwrap_or_default();
        UpdateDomain {
            is_active: r.is_active,
            verification_method: r.verification_method,
            settings: UpdateDomainSettings {
                redirect_mode: settings.redirect_mode,
                custom_nameservers: settings.custom_nameservers,
                force_ssl: settings.force_ssl,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DomainSettingsResponse {
    pub redirect_mode: RedirectMode,
    pub custom_nameservers: Option<String>,
    pub force_ssl: bool,
}

impl From<DomainSettings> for DomainSettingsResponse {
    fn from(s: DomainSettings) -> Self {
        DomainSettingsResponse {
            redirect_mode: s.redirect_mode,
            custom_nameservers: s.custom_nameservers,
            force_ssl: s.force_ssl,
        }
    }
}

/// Domain as returned by the API.
///
/// `settings` is embedded on single-domain responses only. `verification`
/// is present while the domain is unverified.
#[derive(Debug, Serialize)]
pub struct DomainResponse {
    pub id: i64,
    pub hostname: String,
    pub is_verified: bool,
    pub verification_method: VerificationMethod,
    pub verification_token: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub certificate_status: CertificateStatus,
    pub certificate_issued_at: Option<DateTime<Utc>>,
    pub certificate_expires_at: Option<DateTime<Utc>>,
    pub certificate_error: Option<String>,
    pub is_active: bool,
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<DomainSettingsResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationInstructions>,
}

impl From<Domain> for DomainResponse {
    fn from(d: Domain) -> Self {
        DomainResponse {
            id: d.id,
            hostname: d.hostname,
            is_verified: d.is_verified,
            verification_method: d.verification_method,
            verification_token: d.verification_token,
            verified_at: d.verified_at,
            certificate_status: d.certificate_status,
            certificate_issued_at: d.certificate_issued_at,
            certificate_expires_at: d.certificate_expires_at,
            certificate_error: d.certificate_error,
            is_active: d.is_active,
            last_health_check_at: d.last_health_check_at,
            created_at: d.created_at,
            updated_at: d.updated_at,
            settings: None,
            verification: None,
        }
    }
}

impl DomainResponse {
    pub fn with_settings(mut self, settings: DomainSettings) -> Self {
        self.settings = Some(settings.into());
        self
    }

    pub fn with_verification(mut self, verification: Option<VerificationInstructions>) -> Self {
        self.verification = verification;
        self
    }
}

/// Response of `DELETE /api/domains/{id}`.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}
