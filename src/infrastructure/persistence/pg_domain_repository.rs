//! PostgreSQL implementation of the domain repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::entities::{
    CertificateClaim, CertificateOutcome, CertificateStatus, Domain, DomainSettings, NewDomain, NewDomainSettings,
    RedirectMode, StatusDrift, UpdateDomain, VerificationMethod,
};
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on;

const HOSTNAME_CONSTRAINT: &str = "domains_hostname_key";

macro_rules! domain_columns {
    () => {
        "id, owner_id, hostname, is_verified, verification_token, verification_method, \
         verified_at, certificate_status, certificate_issued_at, certificate_expires_at, \
         certificate_error, is_active, last_health_check_at, created_at, updated_at"
    };
}

macro_rules! settings_columns {
    () => {
        "domain_id, redirect_mode, custom_nameservers, force_ssl"
    };
}

#[derive(sqlx::FromRow)]
struct DomainRow {
    id: i64,
    owner_id: i64,
    hostname: String,
    is_verified: bool,
    verification_token: String,
    verification_method: String,
    verified_at: Option<DateTime<Utc>>,
    certificate_status: String,
    certificate_issued_at: Option<DateTime<Utc>>,
    certificate_expires_at: Option<DateTime<Utc>>,
    certificate_error: Option<String>,
    is_active: bool,
    last_health_check_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    #[sqlx(flatten)]
    domain: DomainRow,
    certificate_operation_id: i64,
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    domain_id: i64,
    redirect_mode: String,
    custom_nameservers: Option<String>,
    force_ssl: bool,
}

fn corrupt_column(column: &str, value: &str) -> AppError {
    tracing::error!(column, value, "Unexpected value stored in domains table");
    AppError::internal("Corrupt domain record", json!({ "column": column }))
}

impl TryFrom<DomainRow> for Domain {
    type Error = AppError;

    fn try_from(r: DomainRow) -> Result<Self, Self::Error> {
        let verification_method = VerificationMethod::from_str(&r.verification_method)
            .map_err(|_| corrupt_column("verification_method", &r.verification_method))?;
        let certificate_status = CertificateStatus::from_str(&r.certificate_status)
            .map_err(|_| corrupt_column("certificate_status", &r.certificate_status))?;

        Ok(Domain {
            id: r.id,
            owner_id: r.owner_id,
            hostname: r.hostname,
            is_verified: r.is_verified,
            verification_token: r.verification_token,
            verification_method,
            verified_at: r.verified_at,
            certificate_status,
            certificate_issued_at: r.certificate_issued_at,
            certificate_expires_at: r.certificate_expires_at,
            certificate_error: r.certificate_error,
            is_active: r.is_active,
            last_health_check_at: r.last_health_check_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl TryFrom<SettingsRow> for DomainSettings {
    type Error = AppError;

    fn try_from(r: SettingsRow) -> Result<Self, Self::Error> {
        let redirect_mode = RedirectMode::from_str(&r.redirect_mode)
            .map_err(|_| corrupt_column("redirect_mode", &r.redirect_mode))?;

        Ok(DomainSettings {
            domain_id: r.domain_id,
            redirect_mode,
            custom_nameservers: r.custom_nameservers,
            force_ssl: r.force_ssl,
        })
    }
}

fn into_domain(row: Option<DomainRow>) -> Result<Option<Domain>, AppError> {
    row.map(Domain::try_from).transpose()
}

/// PostgreSQL repository for the domain registry.
///
/// Hostname uniqueness is the `domains_hostname_key` constraint; certificate
/// state transitions are single guarded `UPDATE` statements.
pub struct PgDomainRepository {
    pool: Arc<PgPool>,
}

impl PgDomainRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_settings(&self, domain_id: i64) -> Result<DomainSettings, AppError> {
        let row = sqlx::query_as::<_, SettingsRow>(concat!(
            "SELECT ",
            settings_columns!(),
            " FROM domain_settings WHERE domain_id = $1"
        ))
        .bind(domain_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }
}

#[async_trait]
impl DomainRepository for PgDomainRepository {
    async fn create(
        &self,
        new_domain: NewDomain,
        settings: NewDomainSettings,
    ) -> Result<(Domain, DomainSettings), AppError> {
        let mut tx = self.pool.begin().await?;

        let domain_row = sqlx::query_as::<_, DomainRow>(concat!(
            "INSERT INTO domains (owner_id, hostname, verification_token, verification_method) \
             VALUES ($1, $2, $3, $4) \
             RETURNING ",
            domain_columns!()
        ))
        .bind(new_domain.owner_id)
        .bind(&new_domain.hostname)
        .bind(&new_domain.verification_token)
        .bind(new_domain.verification_method.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation_on(&e, HOSTNAME_CONSTRAINT) {
                AppError::hostname_conflict(&new_domain.hostname)
            } else {
                AppError::from(e)
            }
        })?;

        // Dropping `tx` on error rolls back the domain insert as well.
        let settings_row = sqlx::query_as::<_, SettingsRow>(concat!(
            "INSERT INTO domain_settings (domain_id, redirect_mode, custom_nameservers, force_ssl) \
             VALUES ($1, $2, $3, $4) \
             RETURNING ",
            settings_columns!()
        ))
        .bind(domain_row.id)
        .bind(settings.redirect_mode.to_string())
        .bind(&settings.custom_nameservers)
        .bind(settings.force_ssl)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((domain_row.try_into()?, settings_row.try_into()?))
    }

    async fn find_for_owner(&self, id: i64, owner_id: i64) -> Result<Option<Domain>, AppError> {
        let row = sqlx::query_as::<_, DomainRow>(concat!(
            "SELECT ",
            domain_columns!(),
            " FROM domains WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_domain(row)
    }

    async fn find_with_settings(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<(Domain, DomainSettings)>, AppError> {
        let Some(domain) = self.find_for_owner(id, owner_id).await? else {
            return Ok(None);
        };

        let settings = self.fetch_settings(domain.id).await?;
        Ok(Some((domain, settings)))
    }

    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<Domain>, AppError> {
        let rows = sqlx::query_as::<_, DomainRow>(concat!(
            "SELECT ",
            domain_columns!(),
            " FROM domains WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Domain::try_from).collect()
    }

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        update: UpdateDomain,
    ) -> Result<Option<(Domain, DomainSettings)>, AppError> {
        let mut tx = self.pool.begin().await?;

        let method = update.verification_method.map(|m| m.to_string());

        // The method guard sits in the WHERE clause so a concurrent
        // mark_verified cannot slip between check and write.
        let domain_row = sqlx::query_as::<_, DomainRow>(concat!(
            "UPDATE domains SET \
                 is_active           = COALESCE($3::BOOLEAN, is_active), \
                 verification_method = COALESCE($4::TEXT, verification_method), \
                 updated_at          = NOW() \
             WHERE id = $1 AND owner_id = $2 \
               AND ($4::TEXT IS NULL OR NOT is_verified OR verification_method = $4::TEXT) \
             RETURNING ",
            domain_columns!()
        ))
        .bind(id)
        .bind(owner_id)
        .bind(update.is_active)
        .bind(method.clone())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(domain_row) = domain_row else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM domains WHERE id = $1 AND owner_id = $2)",
            )
            .bind(id)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;

            if exists {
                return Err(AppError::bad_request(
                    "Verification method cannot change after verification",
                    json!({ "id": id, "verification_method": method }),
                ));
            }
            return Ok(None);
        };

        let settings = update.settings;
        let update_nameservers = settings.custom_nameservers.is_some();
        let new_nameservers = settings.custom_nameservers.flatten();

        let settings_row = sqlx::query_as::<_, SettingsRow>(concat!(
            "UPDATE domain_settings SET \
                 redirect_mode      = COALESCE($2::TEXT, redirect_mode), \
                 custom_nameservers = CASE WHEN $3::BOOLEAN THEN $4::TEXT ELSE custom_nameservers END, \
                 force_ssl          = COALESCE($5::BOOLEAN, force_ssl) \
             WHERE domain_id = $1 \
             RETURNING ",
            settings_columns!()
        ))
        .bind(id)
        .bind(settings.redirect_mode.map(|m| m.to_string()))
        .bind(update_nameservers)
        .bind(new_nameservers)
        .bind(settings.force_ssl)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((domain_row.try_into()?, settings_row.try_into()?)))
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM domains WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM dns_records WHERE domain_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM domain_settings WHERE domain_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM domains WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn mark_verified(&self, id: i64, owner_id: i64) -> Result<Option<Domain>, AppError> {
        let row = sqlx::query_as::<_, DomainRow>(concat!(
            "UPDATE domains SET \
                 is_verified = TRUE, \
                 verified_at = COALESCE(verified_at, NOW()), \
                 updated_at  = NOW() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING ",
            domain_columns!()
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_domain(row)
    }

    async fn begin_certificate_operation(
        &self,
        id: i64,
        owner_id: i64,
        allowed: &[CertificateStatus],
        stale_after_secs: Option<i64>,
    ) -> Result<Option<CertificateClaim>, AppError> {
        let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();

        // Concurrent callers serialize on the row lock; the loser re-evaluates
        // the WHERE clause against INITIALIZING and matches nothing.
        let row = sqlx::query_as::<_, ClaimRow>(concat!(
            "UPDATE domains SET \
                 certificate_status               = 'INITIALIZING', \
                 certificate_error                = NULL, \
                 certificate_operation_id         = nextval('certificate_operation_seq'), \
                 certificate_operation_started_at = NOW(), \
                 updated_at                       = NOW() \
             WHERE id = $1 AND owner_id = $2 AND is_verified \
               AND ( certificate_status = ANY($3) \
                     OR ( $4::BIGINT IS NOT NULL \
                          AND certificate_status = 'INITIALIZING' \
                          AND COALESCE(certificate_operation_started_at, updated_at) \
                              < NOW() - make_interval(secs => $4::BIGINT) ) ) \
             RETURNING ",
            domain_columns!(),
            ", certificate_operation_id"
        ))
        .bind(id)
        .bind(owner_id)
        .bind(allowed)
        .bind(stale_after_secs)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(CertificateClaim {
            domain: row.domain.try_into()?,
            operation_id: row.certificate_operation_id,
        }))
    }

    async fn complete_certificate_operation(
        &self,
        id: i64,
        operation_id: i64,
        outcome: CertificateOutcome,
    ) -> Result<Option<Domain>, AppError> {
        let row = match outcome {
            CertificateOutcome::Issued {
                issued_at,
                expires_at,
            } => {
                sqlx::query_as::<_, DomainRow>(concat!(
                    "UPDATE domains SET \
                         certificate_status               = 'ACTIVE', \
                         certificate_issued_at            = COALESCE($3, NOW()), \
                         certificate_expires_at           = $4, \
                         certificate_error                = NULL, \
                         certificate_operation_id         = NULL, \
                         certificate_operation_started_at = NULL, \
                         updated_at                       = NOW() \
                     WHERE id = $1 AND certificate_status = 'INITIALIZING' \
                       AND certificate_operation_id = $2 \
                     RETURNING ",
                    domain_columns!()
                ))
                .bind(id)
                .bind(operation_id)
                .bind(issued_at)
                .bind(expires_at)
                .fetch_optional(self.pool.as_ref())
                .await?
            }
            CertificateOutcome::Failed { error } => {
                sqlx::query_as::<_, DomainRow>(concat!(
                    "UPDATE domains SET \
                         certificate_status               = 'FAILED', \
                         certificate_error                = $3, \
                         certificate_operation_id         = NULL, \
                         certificate_operation_started_at = NULL, \
                         updated_at                       = NOW() \
                     WHERE id = $1 AND certificate_status = 'INITIALIZING' \
                       AND certificate_operation_id = $2 \
                     RETURNING ",
                    domain_columns!()
                ))
                .bind(id)
                .bind(operation_id)
                .bind(error)
                .fetch_optional(self.pool.as_ref())
                .await?
            }
        };

        into_domain(row)
    }

    async fn record_health_check(
        &self,
        id: i64,
        drift: Option<StatusDrift>,
    ) -> Result<Option<Domain>, AppError> {
        let to = drift.map(|d| d.to.to_string());
        let from = drift.map(|d| d.from.to_string());

        let row = sqlx::query_as::<_, DomainRow>(concat!(
            "UPDATE domains SET \
                 last_health_check_at = NOW(), \
                 certificate_status = CASE \
                     WHEN $2::TEXT IS NOT NULL AND certificate_status = $3::TEXT THEN $2::TEXT \
                     ELSE certificate_status END, \
                 updated_at = CASE \
                     WHEN $2::TEXT IS NOT NULL AND certificate_status = $3::TEXT THEN NOW() \
                     ELSE updated_at END \
             WHERE id = $1 \
             RETURNING ",
            domain_columns!()
        ))
        .bind(id)
        .bind(to)
        .bind(from)
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_domain(row)
    }
}
