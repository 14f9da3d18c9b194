//! DNS record store service.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::json;

use crate::domain::entities::{DnsRecord, DnsRecordType, NewDnsRecord};
use crate::domain::repositories::{DnsRecordRepository, DomainRepository};
use crate::error::AppError;
use crate::utils::hostname::normalize_hostname;

/// TTL value meaning "let the provider decide".
pub const AUTOMATIC_TTL: i32 = 1;
const MIN_TTL: i32 = 60;
const MAX_TTL: i32 = 86_400;
const MAX_TXT_LEN: usize = 2048;
const MAX_NAME_LEN: usize = 253;

/// One label of a record name. Allows `*` and a leading underscore (`_dmarc`).
static NAME_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\*|_?[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)$").unwrap()
});

/// Service for the DNS records mirrored under a domain.
///
/// Records are stored locally only; nothing is pushed to the provider.
pub struct DnsRecordService<D: DomainRepository, R: DnsRecordRepository> {
    domain_repository: Arc<D>,
    record_repository: Arc<R>,
}

impl<D: DomainRepository, R: DnsRecordRepository> DnsRecordService<D, R> {
    pub fn new(domain_repository: Arc<D>, record_repository: Arc<R>) -> Self {
        Self {
            domain_repository,
            record_repository,
        }
    }

    /// Lists records of a domain the caller owns.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    pub async fn list(&self, domain_id: i64, owner_id: i64) -> Result<Vec<DnsRecord>, AppError> {
        self.ensure_owned(domain_id, owner_id).await?;
        self.record_repository.list_for_domain(domain_id).await
    }

    /// Validates and stores a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    /// Returns [`AppError::Validation`] if the record is malformed for its type.
    pub async fn add(
        &self,
        domain_id: i64,
        owner_id: i64,
        record: NewDnsRecord,
    ) -> Result<DnsRecord, AppError> {
        self.ensure_owned(domain_id, owner_id).await?;

        let record = validate_record(record)?;
        let created = self.record_repository.create(domain_id, record).await?;

        tracing::info!(
            domain_id,
            record_id = created.id,
            record_type = %created.record_type,
            name = %created.name,
            "DNS record added"
        );

        Ok(created)
    }

    /// Deletes one record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    /// Returns [`AppError::NotFound`] if the record does not belong to the domain.
    pub async fn delete(
        &self,
        domain_id: i64,
        owner_id: i64,
        record_id: i64,
    ) -> Result<(), AppError> {
        self.ensure_owned(domain_id, owner_id).await?;

        if !self.record_repository.delete(domain_id, record_id).await? {
            return Err(AppError::not_found(
                "DNS record not found",
                json!({ "domain_id": domain_id, "record_id": record_id }),
            ));
        }

        tracing::info!(domain_id, record_id, "DNS record deleted");
        Ok(())
    }

    async fn ensure_owned(&self, domain_id: i64, owner_id: i64) -> Result<(), AppError> {
        self.domain_repository
            .find_for_owner(domain_id, owner_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::domain_not_found(domain_id))
    }
}

fn invalid(field: &str, message: &str, value: impl serde::Serialize) -> AppError {
    AppError::bad_request(message.to_string(), json!({ "field": field, "value": value }))
}

/// Checks type-specific rules and returns the record with normalized
/// `name` and `content`.
pub fn validate_record(mut record: NewDnsRecord) -> Result<NewDnsRecord, AppError> {
    record.name = validate_name(&record.name)?;

    if record.ttl != AUTOMATIC_TTL && !(MIN_TTL..=MAX_TTL).contains(&record.ttl) {
        return Err(invalid(
            "ttl",
            "TTL must be 1 (automatic) or between 60 and 86400",
            record.ttl,
        ));
    }

    if record.proxied && !record.record_type.is_proxiable() {
        return Err(invalid(
            "proxied",
            "Only A, AAAA and CNAME records can be proxied",
            record.record_type,
        ));
    }

    match (record.record_type, record.priority) {
        (DnsRecordType::Mx, None) => {
            return Err(invalid("priority", "MX records require a priority", None::<i32>));
        }
        (DnsRecordType::Mx, Some(p)) if !(0..=65_535).contains(&p) => {
            return Err(invalid("priority", "Priority must be between 0 and 65535", p));
        }
        (DnsRecordType::Mx, Some(_)) => {}
        (_, Some(p)) => {
            return Err(invalid("priority", "Priority is only allowed on MX records", p));
        }
        (_, None) => {}
    }

    let content = record.content.trim();
    record.content = match record.record_type {
        DnsRecordType::A => content
            .parse::<Ipv4Addr>()
            .map_err(|_| invalid("content", "A record content must be an IPv4 address", content))?
            .to_string(),
        DnsRecordType::Aaaa => content
            .parse::<Ipv6Addr>()
            .map_err(|_| invalid("content", "AAAA record content must be an IPv6 address", content))?
            .to_string(),
        DnsRecordType::Cname | DnsRecordType::Ns | DnsRecordType::Mx => normalize_hostname(content)
            .map_err(|_| invalid("content", "Record content must be a hostname", content))?,
        DnsRecordType::Txt => {
            if content.is_empty() || content.len() > MAX_TXT_LEN {
                return Err(invalid(
                    "content",
                    "TXT content must be 1 to 2048 characters",
                    content.len(),
                ));
            }
            content.to_string()
        }
    };

    Ok(record)
}

/// `@`, or dot-separated labels with an optional trailing dot.
fn validate_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim().to_ascii_lowercase();
    if name == "@" {
        return Ok(name);
    }

    let relative = name.strip_suffix('.').unwrap_or(&name);
    if relative.is_empty()
        || relative.len() > MAX_NAME_LEN
        || !relative.split('.').all(|label| NAME_LABEL_REGEX.is_match(label))
    {
        return Err(invalid("name", "Invalid record name", raw));
    }

    Ok(name)
}
