//! Repository trait for domain records and their settings.

use crate::domain::entities::{
    CertificateClaim, CertificateOutcome, CertificateStatus, Domain, DomainSettings, NewDomain, NewDomainSettings,
    StatusDrift, UpdateDomain,
};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the domain registry.
///
/// Lookups that take an `owner_id` return `None` for domains owned by anyone
/// else; callers turn that into "not found".
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgDomainRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_domain.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Inserts a domain and its settings in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::HostnameConflict`] if the hostname exists for any owner.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(
        &self,
        new_domain: NewDomain,
        settings: NewDomainSettings,
    ) -> Result<(Domain, DomainSettings), AppError>;

    async fn find_for_owner(&self, id: i64, owner_id: i64) -> Result<Option<Domain>, AppError>;

    async fn find_with_settings(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<(Domain, DomainSettings)>, AppError>;

    /// Lists an owner's domains, newest first.
    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<Domain>, AppError>;

    /// Applies a partial update to the domain row and its settings row.
    ///
    /// Returns `None` if the domain does not exist for this owner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the update changes the verification
    /// method of a domain that is already verified.
    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        update: UpdateDomain,
    ) -> Result<Option<(Domain, DomainSettings)>, AppError>;

    /// Deletes the domain, its settings and all its DNS records in one transaction.
    ///
    /// Returns `false` if the domain does not exist for this owner.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError>;

    /// Marks the domain verified. Idempotent.
    async fn mark_verified(&self, id: i64, owner_id: i64) -> Result<Option<Domain>, AppError>;

    /// Compare-and-set into `INITIALIZING`.
    ///
    /// Succeeds only for a verified domain whose status is one of `allowed`, or
    /// whose current operation started more than `stale_after_secs` ago when given.
    /// Every success issues a new operation id. Returns `None` when the guard
    /// did not match.
    async fn begin_certificate_operation(
        &self,
        id: i64,
        owner_id: i64,
        allowed: &[CertificateStatus],
        stale_after_secs: Option<i64>,
    ) -> Result<Option<CertificateClaim>, AppError>;

    /// Writes the result of the operation identified by `operation_id`.
    ///
    /// Returns `None` if the domain is no longer `INITIALIZING` under that id,
    /// i.e. the claim was taken over after going stale.
    async fn complete_certificate_operation(
        &self,
        id: i64,
        operation_id: i64,
        outcome: CertificateOutcome,
    ) -> Result<Option<Domain>, AppError>;

    /// Stamps `last_health_check_at` and applies `drift` if the stored status
    /// still equals `drift.from`.
    async fn record_health_check(
        &self,
        id: i64,
        drift: Option<StatusDrift>,
    ) -> Result<Option<Domain>, AppError>;
}
