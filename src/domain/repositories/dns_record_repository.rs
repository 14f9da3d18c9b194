//! Repository trait for mirrored DNS records.

use crate::domain::entities::{DnsRecord, NewDnsRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for DNS records.
///
/// Methods are keyed by `domain_id` only; ownership of the domain is checked
/// by the service before any call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsRecordRepository: Send + Sync {
    async fn list_for_domain(&self, domain_id: i64) -> Result<Vec<DnsRecord>, AppError>;

    async fn create(&self, domain_id: i64, record: NewDnsRecord) -> Result<DnsRecord, AppError>;

    /// Returns `false` if no such record exists under this domain.
    async fn delete(&self, domain_id: i64, record_id: i64) -> Result<bool, AppError>;

    async fn count_for_domain(&self, domain_id: i64) -> Result<i64, AppError>;
}
