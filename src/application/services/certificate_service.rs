//! Certificate lifecycle service.
//!
//! Every operation first claims the domain with a compare-and-set into
//! `INITIALIZING` and only then calls the provider, so a crash mid-call
//! leaves an inspectable row instead of a silently stuck `PENDING`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

use crate::domain::entities::{CertificateClaim, CertificateOutcome, CertificateStatus, Domain};
use crate::domain::provider::{CertificateInfo, DomainProvider, IssuanceState, ProviderError};
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;

/// Tunables for certificate operations.
#[derive(Debug, Clone)]
pub struct CertificateSettings {
    /// Status polls after the provider answered "pending".
    pub poll_attempts: usize,
    pub poll_interval: Duration,
    /// Upper bound for the whole polling phase.
    pub provider_timeout: Duration,
    /// Age after which an `INITIALIZING` row may be taken over by `renew`.
    ///
    /// Must outlast [`Self::longest_operation`]; a takeover supersedes the
    /// earlier claim, whose late result is then discarded.
    pub stale_after: Duration,
}

impl Default for CertificateSettings {
    fn default() -> Self {
        Self {
            poll_attempts: 3,
            poll_interval: Duration::from_millis(1000),
            provider_timeout: Duration::from_secs(10),
            stale_after: Duration::from_secs(900),
        }
    }
}

impl CertificateSettings {
    /// Upper bound on one operation, counted as `poll_attempts + 2` provider timeouts.
    pub fn longest_operation(&self) -> Duration {
        let calls = u32::try_from(self.poll_attempts.saturating_add(2)).unwrap_or(u32::MAX);
        self.provider_timeout.saturating_mul(calls)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Initialize,
    Renew,
}

impl Operation {
    fn label(self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::Renew => "renew",
        }
    }
}

enum PollError {
    StillPending(CertificateInfo),
    Provider(ProviderError),
}

/// Drives `certificate_status` through `INITIALIZING` to `ACTIVE` or `FAILED`.
///
/// Provider failures are persisted as `FAILED` (with the message in
/// `certificate_error`) and also returned to the caller.
pub struct CertificateService<R: DomainRepository> {
    repository: Arc<R>,
    provider: Arc<dyn DomainProvider>,
    settings: CertificateSettings,
}

impl<R: DomainRepository> CertificateService<R> {
    pub fn new(
        repository: Arc<R>,
        provider: Arc<dyn DomainProvider>,
        settings: CertificateSettings,
    ) -> Self {
        Self {
            repository,
            provider,
            settings,
        }
    }

    /// Requests the first certificate for a freshly verified domain.
    ///
    /// Allowed from `PENDING` and `FAILED`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotVerified`] if the domain is not verified.
    /// Returns [`AppError::CertificateOperationInProgress`] if another operation holds the domain.
    /// Returns [`AppError::Provider`] or [`AppError::ProviderUnavailable`] when
    /// issuance fails; the domain is left `FAILED`.
    pub async fn initialize(&self, domain: &Domain) -> Result<Domain, AppError> {
        if !domain.is_verified {
            return Err(AppError::domain_not_verified(domain.id));
        }

        let claimed = self
            .repository
            .begin_certificate_operation(
                domain.id,
                domain.owner_id,
                CertificateStatus::INITIALIZE_FROM,
                None,
            )
            .await?;

        match claimed {
            Some(claimed) => self.run(claimed, Operation::Initialize).await,
            None => Err(self.rejection(domain.id, domain.owner_id).await),
        }
    }

    /// Renews (or retries) the certificate of a verified domain.
    ///
    /// Allowed from every state except a fresh `INITIALIZING`; a row stuck in
    /// `INITIALIZING` longer than [`CertificateSettings::stale_after`] is taken over.
    ///
    /// # Errors
    ///
    /// Same as [`Self::initialize`], plus [`AppError::DomainNotFound`] for a
    /// domain the caller does not own.
    pub async fn renew(&self, domain_id: i64, owner_id: i64) -> Result<Domain, AppError> {
        let stale_after_secs = i64::try_from(self.settings.stale_after.as_secs()).unwrap_or(i64::MAX);

        let claimed = self
            .repository
            .begin_certificate_operation(
                domain_id,
                owner_id,
                CertificateStatus::RENEW_FROM,
                Some(stale_after_secs),
            )
            .await?;

        match claimed {
            Some(claimed) => self.run(claimed, Operation::Renew).await,
            None => Err(self.rejection(domain_id, owner_id).await),
        }
    }

    /// Explains why the compare-and-set did not match.
    async fn rejection(&self, domain_id: i64, owner_id: i64) -> AppError {
        match self.repository.find_for_owner(domain_id, owner_id).await {
            Err(e) => e,
            Ok(None) => AppError::domain_not_found(domain_id),
            Ok(Some(d)) if !d.is_verified => AppError::domain_not_verified(domain_id),
            Ok(Some(d)) if d.certificate_status == CertificateStatus::Initializing => {
                AppError::certificate_in_progress(domain_id)
            }
            Ok(Some(d)) => AppError::conflict(
                "Certificate operation not allowed in current state",
                json!({ "id": domain_id, "certificate_status": d.certificate_status }),
            ),
        }
    }

    async fn run(&self, claim: CertificateClaim, operation: Operation) -> Result<Domain, AppError> {
        let CertificateClaim {
            domain,
            operation_id,
        } = claim;

        tracing::info!(
            domain_id = domain.id,
            hostname = %domain.hostname,
            operation = operation.label(),
            operation_id,
            "Certificate operation started"
        );

        match self.obtain(&domain.hostname, operation).await {
            Ok(info) => {
                let outcome = CertificateOutcome::Issued {
                    issued_at: info.issued_at,
                    expires_at: info.expires_at,
                };
                let updated = self.complete(domain.id, operation_id, outcome).await?;

                metrics::counter!(
                    "certificate_operations_total",
                    "operation" => operation.label(),
                    "result" => "success"
                )
                .increment(1);
                tracing::info!(
                    domain_id = domain.id,
                    hostname = %domain.hostname,
                    expires_at = ?updated.certificate_expires_at,
                    "Certificate active"
                );

                Ok(updated)
            }
            Err(err) => {
                tracing::warn!(
                    domain_id = domain.id,
                    hostname = %domain.hostname,
                    operation = operation.label(),
                    error = %err,
                    "Certificate operation failed"
                );

                let outcome = CertificateOutcome::Failed {
                    error: err.to_string(),
                };
                self.complete(domain.id, operation_id, outcome).await?;

                metrics::counter!(
                    "certificate_operations_total",
                    "operation" => operation.label(),
                    "result" => "failure"
                )
                .increment(1);

                Err(err.into())
            }
        }
    }

    async fn complete(
        &self,
        domain_id: i64,
        operation_id: i64,
        outcome: CertificateOutcome,
    ) -> Result<Domain, AppError> {
        // None means a stale takeover superseded this claim while we were waiting.
        let updated = self
            .repository
            .complete_certificate_operation(domain_id, operation_id, outcome)
            .await?;

        updated.ok_or_else(|| {
            tracing::warn!(domain_id, operation_id, "Certificate result discarded, claim superseded");
            AppError::certificate_in_progress(domain_id)
        })
    }

    async fn obtain(
        &self,
        hostname: &str,
        operation: Operation,
    ) -> Result<CertificateInfo, ProviderError> {
        let first = match operation {
            Operation::Initialize => self.provider.request_certificate(hostname).await?,
            Operation::Renew => self.provider.renew_certificate(hostname).await?,
        };

        let info = if first.state == IssuanceState::Pending {
            self.poll_until_settled(hostname).await?
        } else {
            first
        };

        match info.state {
            IssuanceState::Active => Ok(info),
            IssuanceState::Pending => Err(ProviderError::Timeout {
                operation: "certificate issuance",
            }),
            IssuanceState::Failed | IssuanceState::Expired => Err(ProviderError::Rejected(
                info.message
                    .unwrap_or_else(|| format!("provider reported {:?}", info.state).to_lowercase()),
            )),
        }
    }

    /// Polls the provider while the certificate is pending.
    ///
    /// Returns the last observed state; a still-pending result is left to the caller.
    async fn poll_until_settled(&self, hostname: &str) -> Result<CertificateInfo, ProviderError> {
        let strategy = FixedInterval::new(self.settings.poll_interval)
            .take(self.settings.poll_attempts.saturating_sub(1));

        let provider = &self.provider;
        let poll = RetryIf::spawn(
            strategy,
            move || async move {
                let info = provider
                    .certificate_status(hostname)
                    .await
                    .map_err(PollError::Provider)?;

                if info.state == IssuanceState::Pending {
                    Err(PollError::StillPending(info))
                } else {
                    Ok(info)
                }
            },
            |e: &PollError| matches!(e, PollError::StillPending(_)),
        );

        match tokio::time::timeout(self.settings.provider_timeout, poll).await {
            Err(_) => Err(ProviderError::Timeout {
                operation: "certificate issuance",
            }),
            Ok(Ok(info)) | Ok(Err(PollError::StillPending(info))) => Ok(info),
            Ok(Err(PollError::Provider(e))) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::VerificationMethod;
    use crate::domain::provider::MockDomainProvider;
    use crate::domain::repositories::MockDomainRepository;
    use chrono::{Duration as ChronoDuration, Utc};

    fn domain(status: CertificateStatus, is_verified: bool) -> Domain {
        Domain {
            id: 1,
            owner_id: 5,
            hostname: "example.com".to_string(),
            is_verified,
            verification_token: "token".to_string(),
            verification_method: VerificationMethod::DnsTxt,
            verified_at: None,
            certificate_status: status,
            certificate_issued_at: None,
            certificate_expires_at: None,
            certificate_error: None,
            is_active: true,
            last_health_check_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn claim(operation_id: i64) -> CertificateClaim {
        CertificateClaim {
            domain: domain(CertificateStatus::Initializing, true),
            operation_id,
        }
    }

    fn info(state: IssuanceState) -> CertificateInfo {
        CertificateInfo {
            state,
            issued_at: Some(Utc::now()),
            expires_at: Some(Utc::now() + ChronoDuration::days(90)),
            message: None,
        }
    }

    fn fast_settings() -> CertificateSettings {
        CertificateSettings {
            poll_attempts: 3,
            poll_interval: Duration::from_millis(1),
            provider_timeout: Duration::from_secs(1),
            stale_after: Duration::from_secs(900),
        }
    }

    fn service(repo: MockDomainRepository, provider: MockDomainProvider) -> CertificateService<MockDomainRepository> {
        CertificateService::new(Arc::new(repo), Arc::new(provider), fast_settings())
    }

    #[tokio::test]
    async fn test_initialize_unverified_is_rejected_without_claim() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation().never();

        let svc = service(repo, MockDomainProvider::new());

        let result = svc.initialize(&domain(CertificateStatus::Pending, false)).await;

        assert!(matches!(result.unwrap_err(), AppError::DomainNotVerified { .. }));
    }

    #[tokio::test]
    async fn test_initialize_success_marks_active() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .withf(|_, _, allowed, stale| {
                allowed.to_vec() == CertificateStatus::INITIALIZE_FROM.to_vec() && stale.is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(Some(claim(41))));
        repo.expect_complete_certificate_operation()
            .withf(|_, operation_id, outcome| {
                *operation_id == 41 && matches!(outcome, CertificateOutcome::Issued { .. })
            })
            .times(1)
            .returning(|_, _, _| Ok(Some(domain(CertificateStatus::Active, true))));

        let mut provider = MockDomainProvider::new();
        provider
            .expect_request_certificate()
            .times(1)
            .returning(|_| Ok(info(IssuanceState::Active)));

        let svc = service(repo, provider);

        let updated = svc.initialize(&domain(CertificateStatus::Pending, true)).await.unwrap();
        assert_eq!(updated.certificate_status, CertificateStatus::Active);
    }

    #[tokio::test]
    async fn test_initialize_guard_rejection_reports_in_progress() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .times(1)
            .returning(|_, _, _, _| Ok(None));
        repo.expect_find_for_owner()
            .times(1)
            .returning(|_, _| Ok(Some(domain(CertificateStatus::Initializing, true))));

        let mut provider = MockDomainProvider::new();
        provider.expect_request_certificate().never();

        let svc = service(repo, provider);

        let result = svc.initialize(&domain(CertificateStatus::Pending, true)).await;
        assert!(matches!(
            result.unwrap_err(),
            AppError::CertificateOperationInProgress { .. }
        ));
    }

    #[tokio::test]
    async fn test_renew_provider_error_persists_failed() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .withf(|_, _, allowed, stale| {
                allowed.to_vec() == CertificateStatus::RENEW_FROM.to_vec() && *stale == Some(900)
            })
            .times(1)
            .returning(|_, _, _, _| Ok(Some(claim(41))));
        repo.expect_complete_certificate_operation()
            .withf(|_, _, outcome| matches!(outcome, CertificateOutcome::Failed { error } if error.contains("503")))
            .times(1)
            .returning(|_, _, _| Ok(Some(domain(CertificateStatus::Failed, true))));

        let mut provider = MockDomainProvider::new();
        provider.expect_renew_certificate().times(1).returning(|_| {
            Err(ProviderError::Api {
                status: 503,
                message: "upstream busy".to_string(),
            })
        });

        let svc = service(repo, provider);

        let result = svc.renew(1, 5).await;
        assert!(matches!(result.unwrap_err(), AppError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_renew_timeout_maps_to_unavailable() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .times(1)
            .returning(|_, _, _, _| Ok(Some(claim(41))));
        repo.expect_complete_certificate_operation()
            .withf(|_, _, outcome| matches!(outcome, CertificateOutcome::Failed { .. }))
            .times(1)
            .returning(|_, _, _| Ok(Some(domain(CertificateStatus::Failed, true))));

        let mut provider = MockDomainProvider::new();
        provider.expect_renew_certificate().times(1).returning(|_| {
            Err(ProviderError::Timeout {
                operation: "renew certificate",
            })
        });

        let svc = service(repo, provider);

        let result = svc.renew(1, 5).await;
        assert!(matches!(result.unwrap_err(), AppError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_pending_issuance_is_polled_until_active() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .times(1)
            .returning(|_, _, _, _| Ok(Some(claim(41))));
        repo.expect_complete_certificate_operation()
            .withf(|_, _, outcome| matches!(outcome, CertificateOutcome::Issued { .. }))
            .times(1)
            .returning(|_, _, _| Ok(Some(domain(CertificateStatus::Active, true))));

        let mut provider = MockDomainProvider::new();
        provider
            .expect_request_certificate()
            .times(1)
            .returning(|_| Ok(info(IssuanceState::Pending)));

        let mut seq = mockall::Sequence::new();
        provider
            .expect_certificate_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(info(IssuanceState::Pending)));
        provider
            .expect_certificate_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(info(IssuanceState::Active)));

        let svc = service(repo, provider);

        let updated = svc.initialize(&domain(CertificateStatus::Pending, true)).await.unwrap();
        assert_eq!(updated.certificate_status, CertificateStatus::Active);
    }

    #[tokio::test]
    async fn test_still_pending_after_polling_fails() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .times(1)
            .returning(|_, _, _, _| Ok(Some(claim(41))));
        repo.expect_complete_certificate_operation()
            .withf(|_, _, outcome| matches!(outcome, CertificateOutcome::Failed { .. }))
            .times(1)
            .returning(|_, _, _| Ok(Some(domain(CertificateStatus::Failed, true))));

        let mut provider = MockDomainProvider::new();
        provider
            .expect_request_certificate()
            .times(1)
            .returning(|_| Ok(info(IssuanceState::Pending)));
        provider
            .expect_certificate_status()
            .times(3)
            .returning(|_| Ok(info(IssuanceState::Pending)));

        let svc = service(repo, provider);

        let result = svc.initialize(&domain(CertificateStatus::Pending, true)).await;
        assert!(matches!(result.unwrap_err(), AppError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_superseded_claim_result_is_discarded() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .times(1)
            .returning(|_, _, _, _| Ok(Some(claim(7))));
        repo.expect_complete_certificate_operation()
            .withf(|_, operation_id, _| *operation_id == 7)
            .times(1)
            .returning(|_, _, _| Ok(None));

        let mut provider = MockDomainProvider::new();
        provider
            .expect_renew_certificate()
            .times(1)
            .returning(|_| Ok(info(IssuanceState::Active)));

        let svc = service(repo, provider);

        let result = svc.renew(1, 5).await;
        assert!(matches!(
            result.unwrap_err(),
            AppError::CertificateOperationInProgress { .. }
        ));
    }

    #[test]
    fn test_longest_operation_covers_every_provider_call() {
        let settings = CertificateSettings::default();

        assert_eq!(settings.longest_operation(), Duration::from_secs(50));
        assert!(settings.stale_after > settings.longest_operation());
    }

    #[tokio::test]
    async fn test_renew_not_owned() {
        let mut repo = MockDomainRepository::new();
        repo.expect_begin_certificate_operation()
            .times(1)
            .returning(|_, _, _, _| Ok(None));
        repo.expect_find_for_owner().times(1).returning(|_, _| Ok(None));

        let svc = service(repo, MockDomainProvider::new());

        let result = svc.renew(1, 99).await;
        assert!(matches!(result.unwrap_err(), AppError::DomainNotFound { .. }));
    }
}
