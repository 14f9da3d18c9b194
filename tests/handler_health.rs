mod common;

use common::CertificateReply;
use custom_domains::domain::provider::HttpsProbe;
use serde_json::Value;
use sqlx::PgPool;

// ─── SERVICE HEALTH ──────────────────────────────────────────────────────────

#[sqlx::test]
async fn test_health_endpoint_success(pool: PgPool) {
    let (state, _provider) = common::create_test_state(pool);
    let server = common::make_server(state);

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert!(json["version"].is_string());
}

#[sqlx::test]
async fn test_health_endpoint_needs_no_token(pool: PgPool) {
    let (state, _provider) = common::create_test_state(pool);
    let server = common::make_server(state);

    server.get("/health").await.assert_status_ok();
    server.get("/api/domains").await.assert_status_unauthorized();
}

// ─── DOMAIN HEALTH ───────────────────────────────────────────────────────────

#[sqlx::test]
async fn test_healthy_domain(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let id = common::create_test_domain(&pool, 1, "fine.example.com", true, "ACTIVE").await;
    let (state, _provider) = common::create_test_state(pool.clone());
    let server = common::make_server(state);

    let response = server
        .get(&format!("/api/domains/{id}/health"))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["dns_status"], "ok");
    assert_eq!(json["certificate_status"], "ACTIVE");
    assert!(json["issues"].as_array().unwrap().is_empty());
    assert_eq!(json["metrics"]["response"]["status_code"], 200);
    assert_eq!(json["metrics"]["security"]["hsts"], true);

    let checked: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT last_health_check_at FROM domains WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(checked.is_some());
}

#[sqlx::test]
async fn test_expired_certificate_is_critical_and_persisted(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let id = common::create_test_domain(&pool, 1, "old.example.com", true, "ACTIVE").await;
    let (state, provider) = common::create_test_state(pool.clone());
    provider.set_status(CertificateReply::expired());
    let server = common::make_server(state);

    let response = server
        .get(&format!("/api/domains/{id}/health"))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "critical");
    assert_eq!(json["certificate_status"], "EXPIRED");

    let ssl_issues: Vec<&Value> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|issue| issue["category"] == "ssl")
        .collect();
    assert_eq!(ssl_issues.len(), 1);
    assert_eq!(ssl_issues[0]["severity"], "error");

    assert_eq!(common::certificate_status_of(&pool, id).await, "EXPIRED");
}

#[sqlx::test]
async fn test_unreachable_dns_is_critical(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let id = common::create_test_domain(&pool, 1, "dark.example.com", true, "ACTIVE").await;
    let (state, provider) = common::create_test_state(pool);
    provider.set_dns_down(true);
    let server = common::make_server(state);

    let json = server
        .get(&format!("/api/domains/{id}/health"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();

    assert_eq!(json["status"], "critical");
    assert_eq!(json["dns_status"], "unreachable");
    assert!(
        json["issues"]
            .as_array()
            .unwrap()
            .iter()
            .any(|issue| issue["category"] == "dns")
    );
}

#[sqlx::test]
async fn test_missing_security_headers_reported(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let id = common::create_test_domain(&pool, 1, "loose.example.com", true, "ACTIVE").await;
    let (state, provider) = common::create_test_state(pool);
    provider.set_probe(Some(HttpsProbe {
        status: 200,
        latency_ms: 80,
        hsts: false,
        missing_security_headers: vec!["x-frame-options".to_string()],
    }));
    let server = common::make_server(state);

    let json = server
        .get(&format!("/api/domains/{id}/health"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();

    assert_eq!(json["status"], "issues");
    assert_eq!(json["metrics"]["security"]["hsts"], false);
    let categories: Vec<&str> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["security"]);
}

#[sqlx::test]
async fn test_pending_domain_reports_certificate_warning(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let id = common::create_test_domain(&pool, 1, "new.example.com", false, "PENDING").await;
    let (state, _provider) = common::create_test_state(pool.clone());
    let server = common::make_server(state);

    let json = server
        .get(&format!("/api/domains/{id}/health"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();

    assert_eq!(json["status"], "issues");
    assert_eq!(json["issues"][0]["category"], "ssl");
    assert_eq!(json["issues"][0]["severity"], "warning");
    assert_eq!(common::certificate_status_of(&pool, id).await, "PENDING");
}

#[sqlx::test]
async fn test_domain_health_other_owner_not_found(pool: PgPool) {
    let intruder = common::create_test_token(&pool, 2).await;
    let id = common::create_test_domain(&pool, 1, "hidden.example.com", true, "ACTIVE").await;
    let (state, _provider) = common::create_test_state(pool);
    let server = common::make_server(state);

    server
        .get(&format!("/api/domains/{id}/health"))
        .authorization_bearer(&intruder)
        .await
        .assert_status_not_found();
}
