//! DTOs for the DNS record endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::dns_record_service::AUTOMATIC_TTL;
use crate::domain::entities::{DnsRecord, DnsRecordType, NewDnsRecord};

fn default_ttl() -> i32 {
    AUTOMATIC_TTL
}

/// Request body for `POST /api/domains/{id}/dns`.
///
/// Only shape is checked here; per-type content rules are applied by the
/// record store.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDnsRecordRequest {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,

    #[validate(length(min = 1, max = 253))]
    pub name: String,

    #[validate(length(min = 1, max = 2048))]
    pub content: String,

    /// `1` means automatic.
    #[serde(default = "default_ttl")]
    pub ttl: i32,

    /// MX only.
    pub priority: Option<i32>,

    #[serde(default)]
    pub proxied: bool,
}

impl From<CreateDnsRecordRequest> for NewDnsRecord {
    fn from(r: CreateDnsRecordRequest) -> Self {
        NewDnsRecord {
            record_type: r.record_type,
            name: r.name,
            content: r.content,
            ttl: r.ttl,
            priority: r.priority,
            proxied: r.proxied,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DnsRecordResponse {
    pub id: i64,
    pub domain_id: i64,
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    pub ttl: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub proxied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DnsRecord> for DnsRecordResponse {
    fn from(r: DnsRecord) -> Self {
        DnsRecordResponse {
            id: r.id,
            domain_id: r.domain_id,
            record_type: r.record_type,
            name: r.name,
            content: r.content,
            ttl: r.ttl,
            priority: r.priority,
            proxied: r.proxied,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let request: CreateDnsRecordRequest =
            serde_json::from_str(r#"{"type": "A", "name": "@", "content": "192.0.2.10"}"#).unwrap();

        assert_eq!(request.ttl, AUTOMATIC_TTL);
        assert!(!request.proxied);
        assert!(request.priority.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_content_rejected() {
        let request: CreateDnsRecordRequest =
            serde_json::from_str(r#"{"type": "TXT", "name": "@", "content": ""}"#).unwrap();

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_lowercase_type_rejected() {
        let result = serde_json::from_str::<CreateDnsRecordRequest>(
            r#"{"type": "mx", "name": "@", "content": "mail.example.com"}"#,
        );
        assert!(result.is_err());
    }
}
