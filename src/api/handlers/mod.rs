//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod certificates;
pub mod dns_records;
pub mod domains;
pub mod health;

pub use certificates::{
    certificate_status_handler, renew_certificate_handler, verify_domain_handler,
};
pub use dns_records::{
    create_dns_record_handler, delete_dns_record_handler, dns_record_list_handler,
};
pub use domains::{
    create_domain_handler, delete_domain_handler, domain_list_handler, get_domain_handler,
    update_domain_handler,
};
pub use health::{domain_health_handler, health_handler};
