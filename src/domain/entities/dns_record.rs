//! Local mirror of a DNS record configured for a domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DnsRecordType {
    A,
    Aaaa,
    Cname,
    Txt,
    Mx,
    Ns,
}

impl DnsRecordType {
    /// Whether traffic for this record type can be proxied by the edge.
    pub fn is_proxiable(self) -> bool {
        matches!(self, DnsRecordType::A | DnsRecordType::Aaaa | DnsRecordType::Cname)
    }
}

/// A DNS record owned by exactly one domain; removed together with it.
#[derive(Debug, Clone)]
pub struct DnsRecord {
    pub id: i64,
    pub domain_id: i64,
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    pub ttl: i32,
    /// MX only.
    pub priority: Option<i32>,
    pub proxied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDnsRecord {
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    pub ttl: i32,
    pub priority: Option<i32>,
    pub proxied: bool,
}
