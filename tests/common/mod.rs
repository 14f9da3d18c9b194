#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, routing::get};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use custom_domains::api::handlers::health_handler;
use custom_domains::application::services::auth_service::hash_token;
use custom_domains::domain::provider::{
    CertificateInfo, DomainProvider, HttpsProbe, IssuanceState, ProviderError,
};
use custom_domains::routes::api_router;
use custom_domains::state::{AppState, ServiceSettings};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const CNAME_TARGET: &str = "verify.example.net";

/// Canned answer for a certificate call.
#[derive(Debug, Clone)]
pub enum CertificateReply {
    Info(CertificateInfo),
    ApiError(u16, String),
    Timeout,
}

impl CertificateReply {
    pub fn active() -> Self {
        let now = Utc::now();
        CertificateReply::Info(CertificateInfo {
            state: IssuanceState::Active,
            issued_at: Some(now),
            expires_at: Some(now + Duration::days(90)),
            message: None,
        })
    }

    pub fn expired() -> Self {
        let now = Utc::now();
        CertificateReply::Info(CertificateInfo {
            state: IssuanceState::Expired,
            issued_at: Some(now - Duration::days(100)),
            expires_at: Some(now - Duration::days(10)),
            message: None,
        })
    }

    fn into_result(self, operation: &'static str) -> Result<CertificateInfo, ProviderError> {
        match self {
            CertificateReply::Info(info) => Ok(info),
            CertificateReply::ApiError(status, message) => {
                Err(ProviderError::Api { status, message })
            }
            CertificateReply::Timeout => Err(ProviderError::Timeout { operation }),
        }
    }
}

struct FakeState {
    txt: HashMap<String, Vec<String>>,
    cname: HashMap<String, Vec<String>>,
    files: HashMap<String, String>,
    dns_down: bool,
    addresses: Vec<IpAddr>,
    issue: CertificateReply,
    renew: CertificateReply,
    status: CertificateReply,
    probe: Option<HttpsProbe>,
    certificate_calls: usize,
}

/// In-memory stand-in for DNS, the TLS provider and HTTPS probes.
///
/// Defaults describe a healthy, fully configured hostname with no
/// verification records published.
pub struct FakeProvider {
    state: Mutex<FakeState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                txt: HashMap::new(),
                cname: HashMap::new(),
                files: HashMap::new(),
                dns_down: false,
                addresses: vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))],
                issue: CertificateReply::active(),
                renew: CertificateReply::active(),
                status: CertificateReply::active(),
                probe: Some(HttpsProbe {
                    status: 200,
                    latency_ms: 120,
                    hsts: true,
                    missing_security_headers: Vec::new(),
                }),
                certificate_calls: 0,
            }),
        }
    }

    pub fn set_txt(&self, hostname: &str, values: &[&str]) {
        self.state.lock().unwrap().txt.insert(
            hostname.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
    }

    pub fn set_cname(&self, hostname: &str, target: &str) {
        self.state
            .lock()
            .unwrap()
            .cname
            .insert(hostname.to_string(), vec![target.to_string()]);
    }

    pub fn set_file(&self, hostname: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(hostname.to_string(), body.to_string());
    }

    pub fn set_dns_down(&self, down: bool) {
        self.state.lock().unwrap().dns_down = down;
    }

    pub fn set_issue(&self, reply: CertificateReply) {
        self.state.lock().unwrap().issue = reply;
    }

    pub fn set_renew(&self, reply: CertificateReply) {
        self.state.lock().unwrap().renew = reply;
    }

    pub fn set_status(&self, reply: CertificateReply) {
        self.state.lock().unwrap().status = reply;
    }

    pub fn set_probe(&self, probe: Option<HttpsProbe>) {
        self.state.lock().unwrap().probe = probe;
    }

    /// Number of issue and renew calls seen so far.
    pub fn certificate_calls(&self) -> usize {
        self.state.lock().unwrap().certificate_calls
    }

    fn dns_error(&self) -> Option<ProviderError> {
        self.state
            .lock()
            .unwrap()
            .dns_down
            .then(|| ProviderError::Dns("SERVFAIL".to_string()))
    }
}

#[async_trait]
impl DomainProvider for FakeProvider {
    async fn txt_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError> {
        if let Some(e) = self.dns_error() {
            return Err(e);
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .txt
            .get(hostname)
            .cloned()
            .unwrap_or_default())
    }

    async fn cname_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError> {
        if let Some(e) = self.dns_error() {
            return Err(e);
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .cname
            .get(hostname)
            .cloned()
            .unwrap_or_default())
    }

    async fn address_records(&self, _hostname: &str) -> Result<Vec<IpAddr>, ProviderError> {
        if let Some(e) = self.dns_error() {
            return Err(e);
        }
        Ok(self.state.lock().unwrap().addresses.clone())
    }

    async fn fetch_challenge_file(
        &self,
        hostname: &str,
        _path: &str,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.state.lock().unwrap().files.get(hostname).cloned())
    }

    async fn request_certificate(&self, _hostname: &str) -> Result<CertificateInfo, ProviderError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.certificate_calls += 1;
            state.issue.clone()
        };
        reply.into_result("request certificate")
    }

    async fn renew_certificate(&self, _hostname: &str) -> Result<CertificateInfo, ProviderError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.certificate_calls += 1;
            state.renew.clone()
        };
        reply.into_result("renew certificate")
    }

    async fn certificate_status(&self, _hostname: &str) -> Result<CertificateInfo, ProviderError> {
        let reply = self.state.lock().unwrap().status.clone();
        reply.into_result("certificate status")
    }

    async fn probe_https(&self, _hostname: &str) -> Result<HttpsProbe, ProviderError> {
        self.state
            .lock()
            .unwrap()
            .probe
            .clone()
            .ok_or_else(|| ProviderError::Http("connection refused".to_string()))
    }
}

pub fn test_settings() -> ServiceSettings {
    let mut settings = ServiceSettings::with_secret(SIGNING_SECRET);
    settings.verification.cname_target = CNAME_TARGET.to_string();
    settings.certificate.poll_interval = std::time::Duration::from_millis(10);
    settings.certificate.provider_timeout = std::time::Duration::from_secs(2);
    settings
}

pub fn create_test_state(pool: PgPool) -> (AppState, Arc<FakeProvider>) {
    let provider = Arc::new(FakeProvider::new());
    let state = AppState::new(Arc::new(pool), provider.clone(), test_settings());
    (state, provider)
}

/// Router with authentication but without rate limiting, which needs a peer address.
pub fn make_server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router(state.clone()))
        .with_state(state);
    TestServer::new(app).unwrap()
}

/// Stores a token for `owner_id` and returns its raw value.
pub async fn create_test_token(pool: &PgPool, owner_id: i64) -> String {
    let raw = format!("test-token-owner-{owner_id}");
    sqlx::query("INSERT INTO api_tokens (owner_id, name, token_hash) VALUES ($1, $2, $3)")
        .bind(owner_id)
        .bind(format!("owner {owner_id}"))
        .bind(hash_token(SIGNING_SECRET, &raw))
        .execute(pool)
        .await
        .unwrap();
    raw
}

/// Inserts a domain row directly, bypassing the registry.
pub async fn create_test_domain(
    pool: &PgPool,
    owner_id: i64,
    hostname: &str,
    verified: bool,
    certificate_status: &str,
) -> i64 {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO domains (owner_id, hostname, verification_token, is_verified, certificate_status) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(owner_id)
    .bind(hostname)
    .bind(format!("cd-verify-{hostname}"))
    .bind(verified)
    .bind(certificate_status)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO domain_settings (domain_id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();

    id
}

pub async fn certificate_status_of(pool: &PgPool, domain_id: i64) -> String {
    sqlx::query_scalar("SELECT certificate_status FROM domains WHERE id = $1")
        .bind(domain_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
