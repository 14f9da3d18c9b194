//! Domain registry service.

use crate::domain::entities::{
    Domain, DomainSettings, NewDomain, NewDomainSettings, UpdateDomain, VerificationMethod,
};
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;
use crate::utils::hostname::normalize_hostname;
use crate::utils::verification_token::generate_verification_token;
use serde_json::json;
use std::sync::Arc;

/// Service for registering and managing custom hostnames.
///
/// Every read and write is scoped by `(domain_id, owner_id)`. A domain owned
/// by someone else is reported as [`AppError::DomainNotFound`], exactly like
/// a domain that does not exist.
pub struct DomainService<R: DomainRepository> {
    repository: Arc<R>,
}

impl<R: DomainRepository> DomainService<R> {
    /// Creates a new domain service.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Registers a hostname for `owner_id`.
    ///
    /// The hostname is normalized (trimmed, lower-cased, one trailing dot
    /// removed) before validation. A fresh verification token is generated and
    /// the settings row is created in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidHostname`] if the hostname fails the grammar.
    /// Returns [`AppError::Validation`] if custom nameservers are malformed.
    /// Returns [`AppError::HostnameConflict`] if any owner already registered it.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn add(
        &self,
        owner_id: i64,
        hostname: &str,
        settings: Option<NewDomainSettings>,
        verification_method: Option<VerificationMethod>,
    ) -> Result<(Domain, DomainSettings), AppError> {
        let hostname = normalize_hostname(hostname)?;

        let mut settings = settings.unwrap_or_default();
        settings.custom_nameservers = settings
            .custom_nameservers
            .as_deref()
            .map(normalize_nameservers)
            .transpose()?;

        // Uniqueness is enforced by the insert itself, not by a lookup first.
        let new_domain = NewDomain {
            owner_id,
            hostname,
            verification_token: generate_verification_token()?,
            verification_method: verification_method.unwrap_or_default(),
        };

        let (domain, settings) = self.repository.create(new_domain, settings).await?;

        tracing::info!(
            domain_id = domain.id,
            owner_id,
            hostname = %domain.hostname,
            method = %domain.verification_method,
            "Domain registered"
        );

        Ok((domain, settings))
    }

    /// Retrieves a domain.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    pub async fn get(&self, domain_id: i64, owner_id: i64) -> Result<Domain, AppError> {
        self.repository
            .find_for_owner(domain_id, owner_id)
            .await?
            .ok_or_else(|| AppError::domain_not_found(domain_id))
    }

    /// Retrieves a domain together with its settings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    pub async fn get_with_settings(
        &self,
        domain_id: i64,
        owner_id: i64,
    ) -> Result<(Domain, DomainSettings), AppError> {
        self.repository
            .find_with_settings(domain_id, owner_id)
            .await?
            .ok_or_else(|| AppError::domain_not_found(domain_id))
    }

    pub async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<Domain>, AppError> {
        self.repository.list_for_owner(owner_id).await
    }

    /// Applies a partial update.
    ///
    /// An empty patch returns the current state unchanged. The verification
    /// method can only be changed while the domain is still unverified.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    /// Returns [`AppError::Validation`] for a method change after verification
    /// or malformed custom nameservers.
    pub async fn update(
        &self,
        domain_id: i64,
        owner_id: i64,
        mut patch: UpdateDomain,
    ) -> Result<(Domain, DomainSettings), AppError> {
        let (current, current_settings) = self.get_with_settings(domain_id, owner_id).await?;

        if patch.is_empty() {
            return Ok((current, current_settings));
        }

        if let Some(method) = patch.verification_method
            && current.is_verified
            && method != current.verification_method
        {
            return Err(AppError::bad_request(
                "Verification method cannot change after verification",
                json!({
                    "id": domain_id,
                    "verification_method": current.verification_method,
                }),
            ));
        }

        if let Some(Some(nameservers)) = &patch.settings.custom_nameservers {
            let normalized = normalize_nameservers(nameservers)?;
            patch.settings.custom_nameservers = Some(Some(normalized));
        }

        let updated = self
            .repository
            .update(domain_id, owner_id, patch)
            .await?
            .ok_or_else(|| AppError::domain_not_found(domain_id))?;

        tracing::info!(domain_id, owner_id, "Domain updated");
        Ok(updated)
    }

    /// Deletes a domain, its settings and its DNS records in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    pub async fn delete(&self, domain_id: i64, owner_id: i64) -> Result<(), AppError> {
        if !self.repository.delete(domain_id, owner_id).await? {
            return Err(AppError::domain_not_found(domain_id));
        }

        tracing::info!(domain_id, owner_id, "Domain deleted");
        Ok(())
    }
}

/// Normalizes a comma-separated nameserver list into `ns1.example.com,ns2.example.com`.
fn normalize_nameservers(raw: &str) -> Result<String, AppError> {
    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if entries.is_empty() {
        return Err(AppError::bad_request(
            "Custom nameservers must not be empty",
            json!({ "field": "custom_nameservers" }),
        ));
    }

    let normalized = entries
        .into_iter()
        .map(|ns| {
            normalize_hostname(ns).map_err(|_| {
                AppError::bad_request(
                    "Invalid nameserver hostname",
                    json!({ "field": "custom_nameservers", "value": ns }),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(normalized.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CertificateStatus, RedirectMode, UpdateDomainSettings};
    use crate::domain::repositories::MockDomainRepository;
    use crate::utils::verification_token::TOKEN_PREFIX;
    use chrono::Utc;

    fn test_domain(id: i64, owner_id: i64, hostname: &str, is_verified: bool) -> Domain {
        Domain {
            id,
            owner_id,
            hostname: hostname.to_string(),
            is_verified,
            verification_token: format!("{TOKEN_PREFIX}abc"),
            verification_method: VerificationMethod::DnsTxt,
            verified_at: None,
            certificate_status: CertificateStatus::Pending,
            certificate_issued_at: None,
            certificate_expires_at: None,
            certificate_error: None,
            is_active: true,
            last_health_check_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_settings(domain_id: i64) -> DomainSettings {
        DomainSettings {
            domain_id,
            redirect_mode: RedirectMode::Redirect,
            custom_nameservers: None,
            force_ssl: true,
        }
    }

    #[tokio::test]
    async fn test_add_normalizes_and_generates_token() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo
            .expect_create()
            .withf(|new, settings| {
                new.hostname == "shop.example.com"
                    && new.owner_id == 7
                    && new.verification_token.starts_with(TOKEN_PREFIX)
                    && new.verification_method == VerificationMethod::DnsTxt
                    && settings.force_ssl
            })
            .times(1)
            .returning(|new, _| {
                let mut domain = test_domain(1, new.owner_id, &new.hostname, false);
                domain.verification_token = new.verification_token;
                Ok((domain, test_settings(1)))
            });

        let service = DomainService::new(Arc::new(mock_repo));

        let (domain, _) = service.add(7, " Shop.Example.COM. ", None, None).await.unwrap();

        assert_eq!(domain.hostname, "shop.example.com");
        assert!(!domain.is_verified);
        assert_eq!(domain.certificate_status, CertificateStatus::Pending);
        assert!(domain.verification_token.len() > TOKEN_PREFIX.len());
    }

    #[tokio::test]
    async fn test_add_invalid_hostname_never_reaches_repository() {
        let mock_repo = MockDomainRepository::new();
        let service = DomainService::new(Arc::new(mock_repo));

        let result = service.add(1, "localhost", None, None).await;

        assert!(matches!(result.unwrap_err(), AppError::InvalidHostname { .. }));
    }

    #[tokio::test]
    async fn test_add_propagates_hostname_conflict() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo
            .expect_create()
            .times(1)
            .returning(|new, _| Err(AppError::hostname_conflict(&new.hostname)));

        let service = DomainService::new(Arc::new(mock_repo));

        let result = service.add(2, "taken.example.com", None, None).await;

        assert!(matches!(result.unwrap_err(), AppError::HostnameConflict { .. }));
    }

    #[tokio::test]
    async fn test_add_normalizes_custom_nameservers() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo
            .expect_create()
            .withf(|_, settings| {
                settings.custom_nameservers.as_deref() == Some("ns1.dns.io,ns2.dns.io")
            })
            .times(1)
            .returning(|new, _| Ok((test_domain(1, new.owner_id, &new.hostname, false), test_settings(1))));

        let service = DomainService::new(Arc::new(mock_repo));
        let settings = NewDomainSettings {
            custom_nameservers: Some(" NS1.dns.io , ns2.dns.io. ".to_string()),
            ..Default::default()
        };

        assert!(service.add(1, "example.com", Some(settings), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_wrong_owner_is_not_found() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo
            .expect_find_for_owner()
            .withf(|id, owner| *id == 1 && *owner == 99)
            .times(1)
            .returning(|_, _| Ok(None));

        let service = DomainService::new(Arc::new(mock_repo));

        let result = service.get(1, 99).await;

        assert!(matches!(result.unwrap_err(), AppError::DomainNotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_method_after_verification_rejected() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo
            .expect_find_with_settings()
            .times(1)
            .returning(|id, owner| Ok(Some((test_domain(id, owner, "example.com", true), test_settings(id)))));

        let service = DomainService::new(Arc::new(mock_repo));
        let patch = UpdateDomain {
            verification_method: Some(VerificationMethod::File),
            ..Default::default()
        };

        let result = service.update(1, 1, patch).await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_empty_patch_returns_current() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo
            .expect_find_with_settings()
            .times(1)
            .returning(|id, owner| Ok(Some((test_domain(id, owner, "example.com", false), test_settings(id)))));
        mock_repo.expect_update().never();

        let service = DomainService::new(Arc::new(mock_repo));

        let (domain, _) = service.update(1, 1, UpdateDomain::default()).await.unwrap();
        assert_eq!(domain.hostname, "example.com");
    }

    #[tokio::test]
    async fn test_update_settings() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo
            .expect_find_with_settings()
            .times(1)
            .returning(|id, owner| Ok(Some((test_domain(id, owner, "example.com", false), test_settings(id)))));
        mock_repo
            .expect_update()
            .withf(|_, _, patch| patch.settings.redirect_mode == Some(RedirectMode::Proxy))
            .times(1)
            .returning(|id, owner, _| {
                let mut settings = test_settings(id);
                settings.redirect_mode = RedirectMode::Proxy;
                Ok(Some((test_domain(id, owner, "example.com", false), settings)))
            });

        let service = DomainService::new(Arc::new(mock_repo));
        let patch = UpdateDomain {
            settings: UpdateDomainSettings {
                redirect_mode: Some(RedirectMode::Proxy),
                ..Default::default()
            },
            ..Default::default()
        };

        let (_, settings) = service.update(1, 1, patch).await.unwrap();
        assert_eq!(settings.redirect_mode, RedirectMode::Proxy);
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let mut mock_repo = MockDomainRepository::new();

        mock_repo.expect_delete().times(1).returning(|_, _| Ok(false));

        let service = DomainService::new(Arc::new(mock_repo));

        let result = service.delete(5, 1).await;

        assert!(matches!(result.unwrap_err(), AppError::DomainNotFound { .. }));
    }

    #[test]
    fn test_normalize_nameservers_rejects_garbage() {
        assert!(normalize_nameservers(" , ").is_err());
        assert!(normalize_nameservers("ns1.example.com,not a host").is_err());
    }
}
