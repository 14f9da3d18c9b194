//! Application error type and its HTTP representation.
//!
//! Every failure leaving a service is an [`AppError`]. Each variant carries a
//! human-readable message plus a JSON `details` object and maps to a stable
//! machine-readable `code`:
//!
//! ```json
//! { "error": { "code": "hostname_conflict", "message": "...", "details": {} } }
//! ```

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::provider::ProviderError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serialized error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidHostname { message: String, details: Value },
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    #[error("{message}")]
    DomainNotFound { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    HostnameConflict { message: String, details: Value },
    #[error("{message}")]
    DomainNotVerified { message: String, details: Value },
    #[error("{message}")]
    CertificateOperationInProgress { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    VerificationProbeFailed { message: String, details: Value },
    #[error("{message}")]
    Provider { message: String, details: Value },
    #[error("{message}")]
    ProviderUnavailable { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn invalid_hostname(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidHostname {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returned both for missing domains and for domains owned by someone else.
    pub fn domain_not_found(domain_id: i64) -> Self {
        Self::DomainNotFound {
            message: "Domain not found".into(),
            details: json!({ "id": domain_id }),
        }
    }

    pub fn hostname_conflict(hostname: &str) -> Self {
        Self::HostnameConflict {
            message: "Hostname is already registered".into(),
            details: json!({ "hostname": hostname }),
        }
    }

    pub fn domain_not_verified(domain_id: i64) -> Self {
        Self::DomainNotVerified {
            message: "Domain ownership has not been verified".into(),
            details: json!({ "id": domain_id }),
        }
    }

    pub fn certificate_in_progress(domain_id: i64) -> Self {
        Self::CertificateOperationInProgress {
            message: "A certificate operation is already in progress".into(),
            details: json!({ "id": domain_id }),
        }
    }

    /// Wraps a failed verification probe. Not used for a negative probe result.
    pub fn probe_failed(hostname: &str, err: &ProviderError) -> Self {
        Self::VerificationProbeFailed {
            message: "Verification probe failed, retry later".into(),
            details: json!({ "hostname": hostname, "reason": err.to_string() }),
        }
    }

    fn parts(self) -> (StatusCode, &'static str, String, Value) {
        match self {
            AppError::InvalidHostname { message, details } => {
                (StatusCode::BAD_REQUEST, "invalid_hostname", message, details)
            }
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::Unauthorized { message, details } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", message, details)
            }
            AppError::DomainNotFound { message, details } => {
                (StatusCode::NOT_FOUND, "domain_not_found", message, details)
            }
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::HostnameConflict { message, details } => {
                (StatusCode::CONFLICT, "hostname_conflict", message, details)
            }
            AppError::DomainNotVerified { message, details } => {
                (StatusCode::CONFLICT, "domain_not_verified", message, details)
            }
            AppError::CertificateOperationInProgress { message, details } => (
                StatusCode::CONFLICT,
                "certificate_operation_in_progress",
                message,
                details,
            ),
            AppError::Conflict { message, details } => {
                (StatusCode::CONFLICT, "conflict", message, details)
            }
            AppError::VerificationProbeFailed { message, details } => (
                StatusCode::BAD_GATEWAY,
                "verification_probe_failed",
                message,
                details,
            ),
            AppError::Provider { message, details } => {
                (StatusCode::BAD_GATEWAY, "provider_error", message, details)
            }
            AppError::ProviderUnavailable { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "provider_unavailable",
                message,
                details,
            ),
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }

        tracing::error!(error = %e, "Database error");
        AppError::internal("Database error", json!({}))
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout { .. } => AppError::ProviderUnavailable {
                message: "Provider did not respond in time".into(),
                details: json!({ "reason": e.to_string() }),
            },
            _ => AppError::Provider {
                message: "Provider request failed".into(),
                details: json!({ "reason": e.to_string() }),
            },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Validation failed", json!({ "fields": e.field_errors() }))
    }
}
