//! Health report types.
//!
//! A [`HealthReport`] is derived on every check and never stored verbatim.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::CertificateStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Issues,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsStatus {
    Ok,
    Issues,
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Dns,
    Ssl,
    Response,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthIssue {
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl HealthIssue {
    pub fn new(category: IssueCategory, severity: IssueSeverity, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            recommendation: None,
        }
    }

    pub fn recommend(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SecurityGrade {
    A,
    B,
    C,
    F,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CertificateMetrics {
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub days_to_expiry: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseMetrics {
    pub latency_ms: Option<u64>,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityMetrics {
    pub hsts: bool,
    pub security_headers: bool,
    pub grade: SecurityGrade,
}

/// Measured metrics.
///
/// `uptime_ratio` and `last_downtime` need probe history, which is not kept,
/// so they are always `null` rather than estimated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthMetrics {
    pub certificate: CertificateMetrics,
    pub response: ResponseMetrics,
    pub uptime_ratio: Option<f64>,
    pub last_downtime: Option<DateTime<Utc>>,
    pub security: SecurityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub domain_id: i64,
    pub hostname: String,
    pub status: OverallStatus,
    pub dns_status: DnsStatus,
    pub certificate_status: CertificateStatus,
    pub metrics: HealthMetrics,
    /// At most one entry per category, ordered dns, ssl, response, security.
    pub issues: Vec<HealthIssue>,
    pub checked_at: DateTime<Utc>,
}

impl OverallStatus {
    /// Critical on unreachable DNS or a failed/expired certificate, otherwise
    /// `issues` whenever anything was flagged.
    pub fn derive(dns: DnsStatus, certificate: CertificateStatus, issue_count: usize) -> Self {
        if dns == DnsStatus::Unreachable || certificate.is_critical() {
            OverallStatus::Critical
        } else if issue_count > 0 {
            OverallStatus::Issues
        } else {
            OverallStatus::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_status_derivation() {
        assert_eq!(
            OverallStatus::derive(DnsStatus::Unreachable, CertificateStatus::Active, 1),
            OverallStatus::Critical
        );
        assert_eq!(
            OverallStatus::derive(DnsStatus::Ok, CertificateStatus::Expired, 1),
            OverallStatus::Critical
        );
        assert_eq!(
            OverallStatus::derive(DnsStatus::Issues, CertificateStatus::Active, 1),
            OverallStatus::Issues
        );
        assert_eq!(
            OverallStatus::derive(DnsStatus::Ok, CertificateStatus::Active, 0),
            OverallStatus::Healthy
        );
    }

    #[test]
    fn test_issue_serialization_skips_missing_recommendation() {
        let issue = HealthIssue::new(IssueCategory::Ssl, IssueSeverity::Error, "expired");
        let json = serde_json::to_value(&issue).unwrap();

        assert_eq!(json["category"], "ssl");
        assert_eq!(json["severity"], "error");
        assert!(json.get("recommendation").is_none());

        let json = serde_json::to_value(issue.recommend("renew")).unwrap();
        assert_eq!(json["recommendation"], "renew");
    }
}
