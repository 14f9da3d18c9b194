//! Outbound integrations behind the [`crate::domain::provider::DomainProvider`] port.
//!
//! - [`adapter`] - [`ProviderAdapter`], the production port implementation
//! - [`certificate_api`] - TLS provider REST client
//! - [`dns_resolver`] - TXT/CNAME/address lookups via hickory
//! - [`web_probe`] - File challenge fetch and HTTPS reachability probe
//! - [`http_client`] - `reqwest` client factory

pub mod adapter;
pub mod certificate_api;
pub mod dns_resolver;
pub mod http_client;
pub mod web_probe;

pub use adapter::{ProviderAdapter, ProviderConfig};
