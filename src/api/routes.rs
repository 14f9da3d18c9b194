//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`] and are scoped to the caller's domains.

use crate::api::handlers::{
    certificate_status_handler, create_dns_record_handler, create_domain_handler,
    delete_dns_record_handler, delete_domain_handler, dns_record_list_handler,
    domain_health_handler, domain_list_handler, get_domain_handler, renew_certificate_handler,
    update_domain_handler, verify_domain_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /domains`                       - List the caller's domains
/// - `POST   /domains`                       - Register a hostname
/// - `GET    /domains/{id}`                  - Domain with settings and challenge
/// - `PATCH  /domains/{id}`                  - Update mutable fields
/// - `DELETE /domains/{id}`                  - Delete domain, settings and records
/// - `POST   /domains/{id}/verify`           - Run the ownership challenge
/// - `GET    /domains/{id}/dns`              - List DNS records
/// - `POST   /domains/{id}/dns`              - Add a DNS record
/// - `DELETE /domains/{id}/dns/{record_id}`  - Delete a DNS record
/// - `GET    /domains/{id}/ssl/status`       - Certificate status
/// - `POST   /domains/{id}/ssl/renew`        - Renew the certificate
/// - `GET    /domains/{id}/health`           - Run a health check
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/domains",
            get(domain_list_handler).post(create_domain_handler),
        )
        .route(
            "/domains/{id}",
            get(get_domain_handler)
                .patch(update_domain_handler)
                .delete(delete_domain_handler),
        )
        .route("/domains/{id}/verify", post(verify_domain_handler))
        .route(
            "/domains/{id}/dns",
            get(dns_record_list_handler).post(create_dns_record_handler),
        )
        .route(
            "/domains/{id}/dns/{record_id}",
            delete(delete_dns_record_handler),
        )
        .route("/domains/{id}/ssl/status", get(certificate_status_handler))
        .route("/domains/{id}/ssl/renew", post(renew_certificate_handler))
        .route("/domains/{id}/health", get(domain_health_handler))
}
