//! Shared application state injected into every handler.

use std::sync::Arc;

use sqlx::PgPool;

use crate::application::services::{
    AuthService, CertificateService, CertificateSettings, DnsRecordService, DomainService,
    HealthService, HealthSettings, VerificationService, VerificationSettings,
};
use crate::domain::provider::DomainProvider;
use crate::infrastructure::persistence::{
    PgDnsRecordRepository, PgDomainRepository, PgTokenRepository,
};

/// Tunables for the services, assembled from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub token_signing_secret: String,
    pub verification: VerificationSettings,
    pub certificate: CertificateSettings,
    pub health: HealthSettings,
}

impl ServiceSettings {
    /// Default tunables with the given token signing secret.
    pub fn with_secret(token_signing_secret: impl Into<String>) -> Self {
        Self {
            token_signing_secret: token_signing_secret.into(),
            verification: VerificationSettings::default(),
            certificate: CertificateSettings::default(),
            health: HealthSettings::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PgPool>,
    pub domain_service: Arc<DomainService<PgDomainRepository>>,
    pub dns_record_service: Arc<DnsRecordService<PgDomainRepository, PgDnsRecordRepository>>,
    pub verification_service: Arc<VerificationService<PgDomainRepository>>,
    pub certificate_service: Arc<CertificateService<PgDomainRepository>>,
    pub health_service: Arc<HealthService<PgDomainRepository>>,
    pub auth_service: Arc<AuthService<PgTokenRepository>>,
}

impl AppState {
    /// Builds repositories and services over one pool and one provider.
    pub fn new(
        pool: Arc<PgPool>,
        provider: Arc<dyn DomainProvider>,
        settings: ServiceSettings,
    ) -> Self {
        let domain_repo = Arc::new(PgDomainRepository::new(pool.clone()));
        let dns_record_repo = Arc::new(PgDnsRecordRepository::new(pool.clone()));
        let token_repo = Arc::new(PgTokenRepository::new(pool.clone()));

        let certificate_service = Arc::new(CertificateService::new(
            domain_repo.clone(),
            provider.clone(),
            settings.certificate,
        ));

        Self {
            domain_service: Arc::new(DomainService::new(domain_repo.clone())),
            dns_record_service: Arc::new(DnsRecordService::new(
                domain_repo.clone(),
                dns_record_repo,
            )),
            verification_service: Arc::new(VerificationService::new(
                domain_repo.clone(),
                provider.clone(),
                certificate_service.clone(),
                settings.verification,
            )),
            health_service: Arc::new(HealthService::new(
                domain_repo,
                provider,
                settings.health,
            )),
            certificate_service,
            auth_service: Arc::new(AuthService::new(token_repo, settings.token_signing_secret)),
            pool,
        }
    }
}
