//! PostgreSQL implementation of the DNS record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::entities::{DnsRecord, DnsRecordType, NewDnsRecord};
use crate::domain::repositories::DnsRecordRepository;
use crate::error::AppError;

const RECORD_COLUMNS: &str =
    "id, domain_id, record_type, name, content, ttl, priority, proxied, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct DnsRecordRow {
    id: i64,
    domain_id: i64,
    record_type: String,
    name: String,
    content: String,
    ttl: i32,
    priority: Option<i32>,
    proxied: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DnsRecordRow> for DnsRecord {
    type Error = AppError;

    fn try_from(r: DnsRecordRow) -> Result<Self, Self::Error> {
        let record_type = DnsRecordType::from_str(&r.record_type).map_err(|_| {
            tracing::error!(value = %r.record_type, "Unexpected record_type in dns_records");
            AppError::internal("Corrupt DNS record", json!({ "id": r.id }))
        })?;

        Ok(DnsRecord {
            id: r.id,
            domain_id: r.domain_id,
            record_type,
            name: r.name,
            content: r.content,
            ttl: r.ttl,
            priority: r.priority,
            proxied: r.proxied,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// PostgreSQL repository for mirrored DNS records.
pub struct PgDnsRecordRepository {
    pool: Arc<PgPool>,
}

impl PgDnsRecordRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DnsRecordRepository for PgDnsRecordRepository {
    async fn list_for_domain(&self, domain_id: i64) -> Result<Vec<DnsRecord>, AppError> {
        let rows = sqlx::query_as::<_, DnsRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM dns_records WHERE domain_id = $1 ORDER BY id"
        ))
        .bind(domain_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(DnsRecord::try_from).collect()
    }

    async fn create(&self, domain_id: i64, record: NewDnsRecord) -> Result<DnsRecord, AppError> {
        let row = sqlx::query_as::<_, DnsRecordRow>(&format!(
            "INSERT INTO dns_records (domain_id, record_type, name, content, ttl, priority, proxied) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(domain_id)
        .bind(record.record_type.to_string())
        .bind(&record.name)
        .bind(&record.content)
        .bind(record.ttl)
        .bind(record.priority)
        .bind(record.proxied)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn delete(&self, domain_id: i64, record_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM dns_records WHERE id = $1 AND domain_id = $2")
            .bind(record_id)
            .bind(domain_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_for_domain(&self, domain_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dns_records WHERE domain_id = $1")
                .bind(domain_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }
}
