//! Client for the TLS provider's certificate API.
//!
//! # API
//!
//! ```text
//! POST {base}/certificates                   {"hostname": "shop.example.com"}
//! POST {base}/certificates/{hostname}/renew
//! GET  {base}/certificates/{hostname}
//!
//! Response (all three):
//! {
//!   "status": "pending" | "active" | "expired" | "failed",
//!   "issued_at": "2025-03-01T12:00:00Z" | null,
//!   "expires_at": "2025-05-30T12:00:00Z" | null,
//!   "message": "..." | null
//! }
//! ```

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::transport_error;
use crate::domain::provider::{CertificateInfo, IssuanceState, ProviderError};

#[derive(Serialize)]
struct IssueRequest<'a> {
    hostname: &'a str,
}

#[derive(Deserialize)]
struct CertificateResponse {
    status: IssuanceState,
    #[serde(default)]
    issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    message: Option<String>,
}

impl From<CertificateResponse> for CertificateInfo {
    fn from(r: CertificateResponse) -> Self {
        CertificateInfo {
            state: r.status,
            issued_at: r.issued_at,
            expires_at: r.expires_at,
            message: r.message,
        }
    }
}

pub struct CertificateApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl CertificateApiClient {
    pub fn new(client: Client, base_url: &str, api_token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn request(&self, hostname: &str) -> Result<CertificateInfo, ProviderError> {
        debug!(hostname, "Requesting certificate");

        let request = self
            .client
            .post(format!("{}/certificates", self.base_url))
            .json(&IssueRequest { hostname });

        self.send("request certificate", request).await
    }

    pub async fn renew(&self, hostname: &str) -> Result<CertificateInfo, ProviderError> {
        debug!(hostname, "Renewing certificate");

        let request = self
            .client
            .post(format!("{}/certificates/{hostname}/renew", self.base_url));

        self.send("renew certificate", request).await
    }

    pub async fn status(&self, hostname: &str) -> Result<CertificateInfo, ProviderError> {
        let request = self
            .client
            .get(format!("{}/certificates/{hostname}", self.base_url));

        self.send("certificate status", request).await
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<CertificateInfo, ProviderError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let response = ensure_success(response).await?;

        let body: CertificateResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("{operation}: failed to parse response: {e}"))
        })?;

        Ok(body.into())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message: body,
    })
}
