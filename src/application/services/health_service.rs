//! Domain health monitoring service.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::{
    CertificateMetrics, CertificateStatus, DnsStatus, Domain, DomainSettings, HealthIssue,
    HealthMetrics, HealthReport, IssueCategory, IssueSeverity, OverallStatus, ResponseMetrics,
    SecurityGrade, SecurityMetrics, StatusDrift,
};
use crate::domain::provider::{
    CertificateInfo, DomainProvider, HttpsProbe, IssuanceState, ProviderError, SECURITY_HEADERS,
};
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct HealthSettings {
    pub expiry_warning_days: i64,
    pub slow_response_ms: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            expiry_warning_days: 30,
            slow_response_ms: 2000,
        }
    }
}

/// Builds health reports from live probes.
///
/// Read-mostly: the only writes are `last_health_check_at` and a certificate
/// status correction when the provider contradicts the stored status.
pub struct HealthService<R: DomainRepository> {
    repository: Arc<R>,
    provider: Arc<dyn DomainProvider>,
    settings: HealthSettings,
}

struct CertificateAssessment {
    metrics: CertificateMetrics,
    drift: Option<StatusDrift>,
    issue: Option<HealthIssue>,
}

impl<R: DomainRepository> HealthService<R> {
    pub fn new(
        repository: Arc<R>,
        provider: Arc<dyn DomainProvider>,
        settings: HealthSettings,
    ) -> Self {
        Self {
            repository,
            provider,
            settings,
        }
    }

    /// Runs DNS, certificate and HTTPS probes concurrently and derives a report.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DomainNotFound`] if the domain does not exist for this owner.
    /// Probe failures are reported as issues, not errors.
    pub async fn check(&self, domain_id: i64, owner_id: i64) -> Result<HealthReport, AppError> {
        let (domain, settings) = self
            .repository
            .find_with_settings(domain_id, owner_id)
            .await?
            .ok_or_else(|| AppError::domain_not_found(domain_id))?;

        let hostname = domain.hostname.as_str();
        let query_certificate = matches!(
            domain.certificate_status,
            CertificateStatus::Active | CertificateStatus::Expired
        );

        let (dns, certificate, https) = tokio::join!(
            self.provider.address_records(hostname),
            async {
                if query_certificate {
                    Some(self.provider.certificate_status(hostname).await)
                } else {
                    None
                }
            },
            self.provider.probe_https(hostname),
        );

        let now = Utc::now();
        let mut issues = Vec::with_capacity(4);

        let dns_status = match dns {
            Ok(addresses) if !addresses.is_empty() => DnsStatus::Ok,
            Ok(_) => {
                issues.push(
                    HealthIssue::new(
                        IssueCategory::Dns,
                        IssueSeverity::Warning,
                        "Hostname has no A or AAAA records",
                    )
                    .recommend("Add a CNAME or A record pointing the hostname at the service"),
                );
                DnsStatus::Issues
            }
            Err(e) => {
                issues.push(
                    HealthIssue::new(
                        IssueCategory::Dns,
                        IssueSeverity::Error,
                        format!("DNS lookup failed: {e}"),
                    )
                    .recommend("Check that the domain's nameservers are reachable"),
                );
                DnsStatus::Unreachable
            }
        };

        let assessment = assess_certificate(&domain, certificate, now, self.settings.expiry_warning_days);
        issues.extend(assessment.issue);

        let (response, response_issue) = self.assess_response(&https);
        issues.extend(response_issue);

        let (security, security_issue) = assess_security(&https, &settings);
        issues.extend(security_issue);

        if let Some(drift) = assessment.drift {
            tracing::info!(
                domain_id,
                hostname,
                from = %drift.from,
                to = %drift.to,
                "Correcting certificate status from health check"
            );
        }

        let stored = self
            .repository
            .record_health_check(domain.id, assessment.drift)
            .await?
            .ok_or_else(|| AppError::domain_not_found(domain_id))?;

        let status = OverallStatus::derive(dns_status, stored.certificate_status, issues.len());

        metrics::counter!("health_checks_total", "status" => status_label(status)).increment(1);
        tracing::debug!(domain_id, hostname, status = status_label(status), issues = issues.len(), "Health check finished");

        Ok(HealthReport {
            domain_id: stored.id,
            hostname: stored.hostname,
            status,
            dns_status,
            certificate_status: stored.certificate_status,
            metrics: HealthMetrics {
                certificate: assessment.metrics,
                response,
                uptime_ratio: None,
                last_downtime: None,
                security,
            },
            issues,
            checked_at: now,
        })
    }

    fn assess_response(
        &self,
        https: &Result<HttpsProbe, ProviderError>,
    ) -> (ResponseMetrics, Option<HealthIssue>) {
        let probe = match https {
            Ok(probe) => probe,
            Err(e) => {
                let issue = HealthIssue::new(
                    IssueCategory::Response,
                    IssueSeverity::Error,
                    format!("HTTPS request failed: {e}"),
                )
                .recommend("Make sure the hostname resolves to the service and serves HTTPS");
                return (ResponseMetrics::default(), Some(issue));
            }
        };

        let metrics = ResponseMetrics {
            latency_ms: Some(probe.latency_ms),
            status_code: Some(probe.status),
        };

        let issue = if probe.status >= 500 {
            Some(HealthIssue::new(
                IssueCategory::Response,
                IssueSeverity::Error,
                format!("Server responded with HTTP {}", probe.status),
            ))
        } else if probe.status >= 400 {
            Some(HealthIssue::new(
                IssueCategory::Response,
                IssueSeverity::Warning,
                format!("Server responded with HTTP {}", probe.status),
            ))
        } else if probe.latency_ms > self.settings.slow_response_ms {
            Some(
                HealthIssue::new(
                    IssueCategory::Response,
                    IssueSeverity::Warning,
                    format!("Slow response: {} ms", probe.latency_ms),
                )
                .recommend("Check the origin's response time"),
            )
        } else {
            None
        };

        (metrics, issue)
    }
}

fn status_label(status: OverallStatus) -> &'static str {
    match status {
        OverallStatus::Healthy => "healthy",
        OverallStatus::Issues => "issues",
        OverallStatus::Critical => "critical",
    }
}

fn certificate_metrics(
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> CertificateMetrics {
    CertificateMetrics {
        valid_from,
        valid_until,
        days_to_expiry: valid_until.map(|until| (until - now).num_days()),
    }
}

/// Compares the stored status with what the provider reports.
///
/// The provider is only consulted for `ACTIVE` and `EXPIRED`; every other
/// stored status is reported as-is and never corrected here.
fn assess_certificate(
    domain: &Domain,
    observed: Option<Result<CertificateInfo, ProviderError>>,
    now: DateTime<Utc>,
    warning_days: i64,
) -> CertificateAssessment {
    let stored = domain.certificate_status;
    let mut metrics = certificate_metrics(domain.certificate_issued_at, domain.certificate_expires_at, now);

    let ssl = |severity, message: String| HealthIssue::new(IssueCategory::Ssl, severity, message);

    let (drift, issue) = match (stored, observed) {
        (CertificateStatus::Pending | CertificateStatus::Initializing, _) => (
            None,
            Some(
                ssl(IssueSeverity::Warning, format!("Certificate is {stored}"))
                    .recommend("Verify the domain to start certificate issuance"),
            ),
        ),
        (CertificateStatus::Inactive, _) => (
            None,
            Some(
                ssl(IssueSeverity::Warning, "Certificate is inactive".to_string())
                    .recommend("Renew the certificate to serve HTTPS"),
            ),
        ),
        (CertificateStatus::Failed, _) => {
            let reason = domain
                .certificate_error
                .as_deref()
                .unwrap_or("unknown error");
            (
                None,
                Some(
                    ssl(IssueSeverity::Error, format!("Certificate issuance failed: {reason}"))
                        .recommend("Check the DNS configuration and renew the certificate"),
                ),
            )
        }
        (_, None) => (None, None),
        (_, Some(Err(e))) => {
            let severity = if stored.is_critical() {
                IssueSeverity::Error
            } else {
                IssueSeverity::Warning
            };
            (
                None,
                Some(ssl(severity, format!("Could not query certificate status: {e}"))),
            )
        }
        (_, Some(Ok(info))) => {
            metrics = certificate_metrics(info.issued_at, info.expires_at, now);
            let drift_to = |to| (stored != to).then_some(StatusDrift { from: stored, to });

            if info.is_expired_at(now) {
                (
                    drift_to(CertificateStatus::Expired),
                    Some(
                        ssl(IssueSeverity::Error, "Certificate has expired".to_string())
                            .recommend("Renew the certificate"),
                    ),
                )
            } else if info.state == IssuanceState::Failed {
                let drift = (stored == CertificateStatus::Active).then_some(StatusDrift {
                    from: stored,
                    to: CertificateStatus::Failed,
                });
                let message = info.message.unwrap_or_else(|| "provider reports failure".to_string());
                (
                    drift,
                    Some(
                        ssl(IssueSeverity::Error, format!("Certificate failed: {message}"))
                            .recommend("Renew the certificate"),
                    ),
                )
            } else if info.state == IssuanceState::Pending {
                let severity = if stored.is_critical() {
                    IssueSeverity::Error
                } else {
                    IssueSeverity::Warning
                };
                (None, Some(ssl(severity, "Provider reports the certificate as pending".to_string())))
            } else {
                let expiring = metrics
                    .days_to_expiry
                    .filter(|days| *days <= warning_days)
                    .map(|days| {
                        ssl(IssueSeverity::Warning, format!("Certificate expires in {days} days"))
                            .recommend("Renew the certificate before it expires")
                    });
                (drift_to(CertificateStatus::Active), expiring)
            }
        }
    };

    CertificateAssessment {
        metrics,
        drift,
        issue,
    }
}

/// Grade from HSTS and the number of recommended headers present.
pub fn security_grade(hsts: bool, headers_present: usize) -> SecurityGrade {
    if hsts && headers_present >= SECURITY_HEADERS.len() {
        SecurityGrade::A
    } else if hsts || headers_present >= 2 {
        SecurityGrade::B
    } else {
        SecurityGrade::C
    }
}

fn assess_security(
    https: &Result<HttpsProbe, ProviderError>,
    settings: &DomainSettings,
) -> (SecurityMetrics, Option<HealthIssue>) {
    let Ok(probe) = https else {
        let metrics = SecurityMetrics {
            hsts: false,
            security_headers: false,
            grade: SecurityGrade::F,
        };
        return (metrics, None);
    };

    let present = SECURITY_HEADERS.len().saturating_sub(probe.missing_security_headers.len());
    let metrics = SecurityMetrics {
        hsts: probe.hsts,
        security_headers: probe.missing_security_headers.is_empty(),
        grade: security_grade(probe.hsts, present),
    };

    let mut missing: Vec<&str> = Vec::new();
    if settings.force_ssl && !probe.hsts {
        missing.push("Strict-Transport-Security");
    }
    missing.extend(probe.missing_security_headers.iter().map(String::as_str));

    let issue = (!missing.is_empty()).then(|| {
        HealthIssue::new(
            IssueCategory::Security,
            IssueSeverity::Warning,
            format!("Missing security headers: {}", missing.join(", ")),
        )
        .recommend("Send the missing headers from the origin")
    });

    (metrics, issue)
}
