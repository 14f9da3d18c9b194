//! Handlers for domain management endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::domain::{
    CreateDomainRequest, DeletedResponse, DomainResponse, UpdateDomainRequest,
};
use crate::api::middleware::auth::AuthenticatedOwner;
use crate::domain::entities::{Domain, DomainSettings};
use crate::error::AppError;
use crate::state::AppState;

fn detailed_response(state: &AppState, domain: Domain, settings: DomainSettings) -> DomainResponse {
    let verification = state.verification_service.instructions(&domain);
    DomainResponse::from(domain)
        .with_settings(settings)
        .with_verification(verification)
}

/// Lists the caller's domains, newest first.
///
/// # Endpoint
///
/// `GET /api/domains`
pub async fn domain_list_handler(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<Json<Vec<DomainResponse>>, AppError> {
    let domains = state.domain_service.list_for_owner(owner_id).await?;

    Ok(Json(domains.into_iter().map(DomainResponse::from).collect()))
}

/// Registers a new hostname for the caller.
///
/// # Endpoint
///
/// `POST /api/domains`
///
/// # Request Body
///
/// ```json
/// {
///   "hostname": "shop.example.com",
///   "verification_method": "DNS_TXT",
///   "settings": { "redirect_mode": "REDIRECT", "force_ssl": true }
/// }
/// ```
///
/// The response carries the verification token and what to publish.
///
/// # Errors
///
/// Returns 400 `invalid_hostname` if the hostname is malformed.
/// Returns 409 `hostname_conflict` if any owner already registered it.
pub async fn create_domain_handler(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Json(payload): Json<CreateDomainRequest>,
) -> Result<(StatusCode, Json<DomainResponse>), AppError> {
    payload.validate()?;

    let (domain, settings) = state
        .domain_service
        .add(
            owner_id,
            &payload.hostname,
            payload.settings.map(Into::into),
            payload.verification_method,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(detailed_response(&state, domain, settings)),
    ))
}

/// Returns one domain with its settings.
///
/// # Endpoint
///
/// `GET /api/domains/{id}`
///
/// # Errors
///
/// Returns 404 if the domain does not exist or belongs to another owner.
pub async fn get_domain_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<Json<DomainResponse>, AppError> {
    let (domain, settings) = state.domain_service.get_with_settings(id, owner_id).await?;

    Ok(Json(detailed_response(&state, domain, settings)))
}

/// Partially updates a domain and its settings.
///
/// # Endpoint
///
/// `PATCH /api/domains/{id}`
///
/// All fields are optional. `settings.custom_nameservers: null` clears the list.
///
/// # Errors
///
/// Returns 400 if the verification method is changed after verification.
/// Returns 404 if domain not found.
pub async fn update_domain_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Json(payload): Json<UpdateDomainRequest>,
) -> Result<Json<DomainResponse>, AppError> {
    payload.validate()?;

    let (domain, settings) = state
        .domain_service
        .update(id, owner_id, payload.into())
        .await?;

    Ok(Json(detailed_response(&state, domain, settings)))
}

/// Deletes a domain together with its settings and DNS records.
///
/// # Endpoint
///
/// `DELETE /api/domains/{id}`
///
/// # Errors
///
/// Returns 404 if domain not found.
pub async fn delete_domain_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<Json<DeletedResponse>, AppError> {
    state.domain_service.delete(id, owner_id).await?;

    Ok(Json(DeletedResponse { deleted: true }))
}
