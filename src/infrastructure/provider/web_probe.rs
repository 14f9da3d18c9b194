//! Outbound HTTPS requests to customer hostnames.

use std::time::Instant;

use reqwest::{Client, Response};
use reqwest::header::{HeaderMap, STRICT_TRANSPORT_SECURITY};
use url::Url;

use super::http_client::transport_error;
use crate::domain::provider::{HttpsProbe, ProviderError, SECURITY_HEADERS};

/// Largest challenge file body accepted.
const MAX_CHALLENGE_BYTES: usize = 4096;

pub struct WebProbe {
    /// Follows a few redirects for the file challenge.
    challenge_client: Client,
    /// Never follows redirects, so headers belong to the hostname itself.
    probe_client: Client,
}

fn https_url(hostname: &str, path: &str) -> Result<Url, ProviderError> {
    Url::parse(&format!("https://{hostname}"))
        .and_then(|base| base.join(path))
        .map_err(|e| ProviderError::Http(format!("invalid URL for '{hostname}': {e}")))
}

fn missing_security_headers(headers: &HeaderMap) -> Vec<String> {
    SECURITY_HEADERS
        .iter()
        .filter(|name| !headers.contains_key(**name))
        .map(|name| (*name).to_string())
        .collect()
}

/// Reads the body, giving up with `None` as soon as it exceeds `limit` bytes.
async fn read_capped(mut response: Response, limit: usize) -> Result<Option<String>, reqwest::Error> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Ok(None);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Ok(None);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}

impl WebProbe {
    pub fn new(challenge_client: Client, probe_client: Client) -> Self {
        Self {
            challenge_client,
            probe_client,
        }
    }

    /// Returns `None` for any 4xx answer; 5xx is a probe failure.
    pub async fn fetch_challenge_file(
        &self,
        hostname: &str,
        path: &str,
    ) -> Result<Option<String>, ProviderError> {
        let url = https_url(hostname, path)?;

        let response = self
            .challenge_client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error("challenge file fetch", e))?;

        let status = response.status();
        if status.is_client_error() {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Http(format!(
                "challenge file fetch: HTTP {}",
                status.as_u16()
            )));
        }

        read_capped(response, MAX_CHALLENGE_BYTES)
            .await
            .map_err(|e| transport_error("challenge file fetch", e))
    }

    pub async fn probe_https(&self, hostname: &str) -> Result<HttpsProbe, ProviderError> {
        let url = https_url(hostname, "/")?;
        let started = Instant::now();

        let response = self
            .probe_client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error("HTTPS probe", e))?;

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let headers = response.headers();

        Ok(HttpsProbe {
            status: response.status().as_u16(),
            latency_ms,
            hsts: headers.contains_key(STRICT_TRANSPORT_SECURITY),
            missing_security_headers: missing_security_headers(headers),
        })
    }
}
