//! Handlers for the per-domain DNS record store.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::dns_record::{CreateDnsRecordRequest, DnsRecordResponse};
use crate::api::middleware::auth::AuthenticatedOwner;
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/domains/{id}/dns`
pub async fn dns_record_list_handler(
    Path(domain_id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<Json<Vec<DnsRecordResponse>>, AppError> {
    let records = state.dns_record_service.list(domain_id, owner_id).await?;

    Ok(Json(records.into_iter().map(DnsRecordResponse::from).collect()))
}

/// Adds a DNS record to a domain.
///
/// # Endpoint
///
/// `POST /api/domains/{id}/dns`
///
/// # Errors
///
/// Returns 400 if the record is invalid for its type.
/// Returns 404 if domain not found.
pub async fn create_dns_record_handler(
    Path(domain_id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Json(payload): Json<CreateDnsRecordRequest>,
) -> Result<(StatusCode, Json<DnsRecordResponse>), AppError> {
    payload.validate()?;

    let record = state
        .dns_record_service
        .add(domain_id, owner_id, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// `DELETE /api/domains/{id}/dns/{record_id}`
///
/// Returns 204 on success, 404 when the record or the domain is not owned
/// by the caller.
pub async fn delete_dns_record_handler(
    Path((domain_id, record_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<StatusCode, AppError> {
    state
        .dns_record_service
        .delete(domain_id, owner_id, record_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
