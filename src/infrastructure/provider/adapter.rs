//! Production implementation of [`DomainProvider`].

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;

use super::certificate_api::CertificateApiClient;
use super::dns_resolver::HickoryDnsResolver;
use super::http_client::build_client;
use super::web_probe::WebProbe;
use crate::domain::provider::{CertificateInfo, DomainProvider, HttpsProbe, ProviderError};

const CHALLENGE_REDIRECT_LIMIT: usize = 5;

/// Connection settings for outbound calls.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    /// Upper bound for every single outbound call.
    pub timeout: Duration,
    /// DNS server to query instead of the system resolver.
    pub nameserver: Option<SocketAddr>,
}

/// DNS, certificate API and web probes behind one timeout policy.
///
/// Each call is wrapped in [`tokio::time::timeout`] on top of the client-level
/// timeouts, so a call that ignores its own deadline still ends as
/// [`ProviderError::Timeout`].
pub struct ProviderAdapter {
    dns: HickoryDnsResolver,
    certificates: CertificateApiClient,
    web: WebProbe,
    timeout: Duration,
}

impl ProviderAdapter {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let dns = match config.nameserver {
            Some(addr) => HickoryDnsResolver::with_nameserver(addr, config.timeout),
            None => HickoryDnsResolver::system(config.timeout)?,
        };

        let api_client = build_client(config.timeout, Policy::none())?;
        let certificates =
            CertificateApiClient::new(api_client, &config.api_url, config.api_token.clone());

        let web = WebProbe::new(
            build_client(config.timeout, Policy::limited(CHALLENGE_REDIRECT_LIMIT))?,
            build_client(config.timeout, Policy::none())?,
        );

        Ok(Self {
            dns,
            certificates,
            web,
            timeout: config.timeout,
        })
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "Provider call timed out");
                Err(ProviderError::Timeout { operation })
            }
        }
    }
}

#[async_trait]
impl DomainProvider for ProviderAdapter {
    async fn txt_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError> {
        self.bounded("TXT lookup", self.dns.txt_records(hostname)).await
    }

    async fn cname_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError> {
        self.bounded("CNAME lookup", self.dns.cname_records(hostname)).await
    }

    async fn address_records(&self, hostname: &str) -> Result<Vec<IpAddr>, ProviderError> {
        self.bounded("address lookup", self.dns.address_records(hostname)).await
    }

    async fn fetch_challenge_file(
        &self,
        hostname: &str,
        path: &str,
    ) -> Result<Option<String>, ProviderError> {
        self.bounded("challenge file fetch", self.web.fetch_challenge_file(hostname, path))
            .await
    }

    async fn request_certificate(&self, hostname: &str) -> Result<CertificateInfo, ProviderError> {
        self.bounded("request certificate", self.certificates.request(hostname))
            .await
    }

    async fn renew_certificate(&self, hostname: &str) -> Result<CertificateInfo, ProviderError> {
        self.bounded("renew certificate", self.certificates.renew(hostname))
            .await
    }

    async fn certificate_status(&self, hostname: &str) -> Result<CertificateInfo, ProviderError> {
        self.bounded("certificate status", self.certificates.status(hostname))
            .await
    }

    async fn probe_https(&self, hostname: &str) -> Result<HttpsProbe, ProviderError> {
        self.bounded("HTTPS probe", self.web.probe_https(hostname)).await
    }
}
