//! Ownership verification service.

use std::sync::Arc;

use serde::Serialize;

use crate::application::services::CertificateService;
use crate::domain::entities::{CertificateStatus, Domain, VerificationMethod};
use crate::domain::provider::{DomainProvider, ProviderError};
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct VerificationSettings {
    /// Fixed target a `DNS_CNAME` challenge must point at.
    pub cname_target: String,
    /// Names the file challenge: `/.well-known/{service_name}-verify.txt`.
    pub service_name: String,
}

impl VerificationSettings {
    pub fn challenge_path(&self) -> String {
        format!("/.well-known/{}-verify.txt", self.service_name)
    }
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            cname_target: "verify.custom-domains.invalid".to_string(),
            service_name: "custom-domains".to_string(),
        }
    }
}

/// What the owner has to publish for the pending challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationInstructions {
    DnsTxt { record_type: &'static str, name: String, value: String },
    DnsCname { record_type: &'static str, name: String, value: String },
    File { url: String, body: String },
}

/// Runs the ownership challenge of a domain and, on success, hands the
/// domain to the certificate lifecycle.
///
/// A single probe per call; retry cadence is the caller's concern. A negative
/// probe returns `Ok(false)` and a failed probe returns
/// [`AppError::VerificationProbeFailed`], neither of which changes state.
pub struct VerificationService<R: DomainRepository> {
    repository: Arc<R>,
    provider: Arc<dyn DomainProvider>,
    certificates: Arc<CertificateService<R>>,
    settings: VerificationSettings,
}

impl<R: DomainRepository> VerificationService<R> {
    pub fn new(
        repository: Arc<R>,
        provider: Arc<dyn DomainProvider>,
        certificates: Arc<CertificateService<R>>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            repository,
            provider,
            certificates,
            settings,
        }
    }

    /// Probes the challenge and marks the domain verified when it matches.
    ///
    /// Idempotent: an already verified domain returns `true` without probing,
    /// and retries certificate initialization if it never started.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    /// Returns [`AppError::VerificationProbeFailed`] if the lookup itself failed.
    pub async fn verify(&self, domain_id: i64, owner_id: i64) -> Result<bool, AppError> {
        let domain = self
            .repository
            .find_for_owner(domain_id, owner_id)
            .await?
            .ok_or_else(|| AppError::domain_not_found(domain_id))?;

        if domain.is_verified {
            if domain.certificate_status == CertificateStatus::Pending {
                self.start_certificate(&domain).await?;
            }
            return Ok(true);
        }

        let matched = self.probe(&domain).await.map_err(|e| {
            tracing::warn!(
                domain_id,
                hostname = %domain.hostname,
                method = %domain.verification_method,
                error = %e,
                "Verification probe failed"
            );
            metrics::counter!("domain_verifications_total", "result" => "probe_failed").increment(1);
            AppError::probe_failed(&domain.hostname, &e)
        })?;

        if !matched {
            tracing::debug!(
                domain_id,
                hostname = %domain.hostname,
                method = %domain.verification_method,
                "Verification challenge not found"
            );
            metrics::counter!("domain_verifications_total", "result" => "not_matched").increment(1);
            return Ok(false);
        }

        let verified = self
            .repository
            .mark_verified(domain_id, owner_id)
            .await?
            .ok_or_else(|| AppError::domain_not_found(domain_id))?;

        metrics::counter!("domain_verifications_total", "result" => "verified").increment(1);
        tracing::info!(
            domain_id,
            hostname = %verified.hostname,
            method = %verified.verification_method,
            "Domain verified"
        );

        self.start_certificate(&verified).await?;
        Ok(true)
    }

    /// Instructions for the pending challenge, `None` once verified.
    pub fn instructions(&self, domain: &Domain) -> Option<VerificationInstructions> {
        if domain.is_verified {
            return None;
        }

        Some(match domain.verification_method {
            VerificationMethod::DnsTxt => VerificationInstructions::DnsTxt {
                record_type: "TXT",
                name: domain.hostname.clone(),
                value: domain.verification_token.clone(),
            },
            VerificationMethod::DnsCname => VerificationInstructions::DnsCname {
                record_type: "CNAME",
                name: domain.hostname.clone(),
                value: self.settings.cname_target.clone(),
            },
            VerificationMethod::File => VerificationInstructions::File {
                url: format!("https://{}{}", domain.hostname, self.settings.challenge_path()),
                body: domain.verification_token.clone(),
            },
        })
    }

    async fn probe(&self, domain: &Domain) -> Result<bool, ProviderError> {
        let hostname = domain.hostname.as_str();

        match domain.verification_method {
            VerificationMethod::DnsTxt => {
                let records = self.provider.txt_records(hostname).await?;
                Ok(records.iter().any(|r| *r == domain.verification_token))
            }
            VerificationMethod::DnsCname => {
                let target = dns_name(&self.settings.cname_target);
                let records = self.provider.cname_records(hostname).await?;
                Ok(records.iter().any(|r| dns_name(r) == target))
            }
            VerificationMethod::File => {
                let body = self
                    .provider
                    .fetch_challenge_file(hostname, &self.settings.challenge_path())
                    .await?;
                Ok(body.is_some_and(|b| b.trim() == domain.verification_token))
            }
        }
    }

    /// Certificate failures after a successful verification are persisted as
    /// `FAILED` by the certificate service and do not undo the verification.
    async fn start_certificate(&self, domain: &Domain) -> Result<(), AppError> {
        match self.certificates.initialize(domain).await {
            Ok(_) => Ok(()),
            Err(
                e @ (AppError::Provider { .. }
                | AppError::ProviderUnavailable { .. }
                | AppError::CertificateOperationInProgress { .. }
                | AppError::Conflict { .. }),
            ) => {
                tracing::warn!(
                    domain_id = domain.id,
                    hostname = %domain.hostname,
                    error = %e,
                    "Certificate initialization did not complete"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn dns_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}
