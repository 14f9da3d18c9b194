//! Handlers for ownership verification and the TLS certificate lifecycle.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::dto::certificate::{CertificateStatusResponse, VerifyResponse};
use crate::api::middleware::auth::AuthenticatedOwner;
use crate::error::AppError;
use crate::state::AppState;

/// Runs the domain's ownership challenge once.
///
/// # Endpoint
///
/// `POST /api/domains/{id}/verify`
///
/// # Response
///
/// ```json
/// { "verified": false }
/// ```
///
/// `false` means the probe succeeded but the challenge was not found; the
/// caller should retry later. On success certificate issuance starts.
///
/// # Errors
///
/// Returns 404 if domain not found.
/// Returns 502 `verification_probe_failed` if DNS or HTTP could not be queried.
pub async fn verify_domain_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<Json<VerifyResponse>, AppError> {
    let verified = state.verification_service.verify(id, owner_id).await?;

    Ok(Json(VerifyResponse { verified }))
}

/// `GET /api/domains/{id}/ssl/status`
pub async fn certificate_status_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<Json<CertificateStatusResponse>, AppError> {
    let domain = state.domain_service.get(id, owner_id).await?;

    Ok(Json(domain.into()))
}

/// Renews the domain's certificate.
///
/// # Endpoint
///
/// `POST /api/domains/{id}/ssl/renew`
///
/// Returns 202 with the status the operation ended in.
///
/// # Errors
///
/// Returns 404 if domain not found.
/// Returns 409 if the domain is unverified or an operation is already running.
/// Returns 502/503 if the provider failed; the domain is then `FAILED`.
pub async fn renew_certificate_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<(StatusCode, Json<CertificateStatusResponse>), AppError> {
    let domain = state.certificate_service.renew(id, owner_id).await?;

    Ok((StatusCode::ACCEPTED, Json(domain.into())))
}
