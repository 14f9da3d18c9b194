//! DNS lookups through hickory.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::ProtoErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{ResolveError, TokioResolver};
use tracing::trace;

use crate::domain::provider::ProviderError;

/// Resolver without a cache, so a challenge published a moment ago is seen
/// on the next verification attempt.
pub struct HickoryDnsResolver {
    resolver: TokioResolver,
}

fn resolver_opts(timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 2;
    opts.cache_size = 0;
    opts
}

/// Absolute name, so search domains are never appended.
fn fqdn(hostname: &str) -> String {
    if hostname.ends_with('.') {
        hostname.to_string()
    } else {
        format!("{hostname}.")
    }
}

/// NXDOMAIN and NoData are negative results, not failures.
///
/// hickory reports SERVFAIL and REFUSED as "no records found" too; those stay
/// errors so an unreachable zone is never read as a missing challenge.
fn empty_or_error<T>(hostname: &str, e: ResolveError) -> Result<Vec<T>, ProviderError> {
    let negative = match e.proto().map(|proto| proto.kind()) {
        Some(ProtoErrorKind::NoRecordsFound { response_code, .. }) => {
            matches!(response_code, ResponseCode::NXDomain | ResponseCode::NoError)
        }
        _ => false,
    };

    if negative {
        trace!(hostname, "No records found");
        Ok(Vec::new())
    } else {
        Err(ProviderError::Dns(format!("lookup of '{hostname}' failed: {e}")))
    }
}

impl HickoryDnsResolver {
    /// Uses the system resolver configuration.
    pub fn system(timeout: Duration) -> Result<Self, ProviderError> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| ProviderError::Dns(format!("failed to read system resolver config: {e}")))?
            .with_options(resolver_opts(timeout))
            .build();

        Ok(Self { resolver })
    }

    /// Queries a single nameserver over UDP.
    pub fn with_nameserver(addr: SocketAddr, timeout: Duration) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(resolver_opts(timeout))
                .build();

        Self { resolver }
    }

    pub async fn txt_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError> {
        match self.resolver.txt_lookup(fqdn(hostname)).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    // A TXT record may carry several character-strings; join them.
                    txt.txt_data()
                        .iter()
                        .map(|data| String::from_utf8_lossy(data))
                        .collect::<String>()
                })
                .collect()),
            Err(e) => empty_or_error(hostname, e),
        }
    }

    pub async fn cname_records(&self, hostname: &str) -> Result<Vec<String>, ProviderError> {
        match self.resolver.lookup(fqdn(hostname), RecordType::CNAME).await {
            Ok(lookup) => Ok(lookup
                .records()
                .iter()
                .filter_map(|record| record.data().as_cname())
                .map(|cname| cname.to_string().trim_end_matches('.').to_string())
                .collect()),
            Err(e) => empty_or_error(hostname, e),
        }
    }

    pub async fn address_records(&self, hostname: &str) -> Result<Vec<IpAddr>, ProviderError> {
        match self.resolver.lookup_ip(fqdn(hostname)).await {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(e) => empty_or_error(hostname, e),
        }
    }
}
