//! HTTP client factory for outbound calls.
//!
//! Every `reqwest::Client` used by the provider adapter is built here so
//! connect and request timeouts are always set.

use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;

use crate::domain::provider::ProviderError;

/// TCP handshake plus TLS.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("custom-domains/", env!("CARGO_PKG_VERSION"));

/// Builds a client whose requests never outlive `request_timeout`.
pub fn build_client(request_timeout: Duration, redirects: Policy) -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
        .timeout(request_timeout)
        .redirect(redirects)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::Http(format!("failed to build HTTP client: {e}")))
}

/// Maps a transport error, keeping timeouts distinguishable.
pub fn transport_error(operation: &'static str, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout { operation }
    } else {
        ProviderError::Http(format!("{operation}: {e}"))
    }
}
