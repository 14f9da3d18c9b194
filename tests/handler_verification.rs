mod common;

use common::CertificateReply;
use serde_json::{Value, json};
use sqlx::PgPool;

async fn register(server: &axum_test::TestServer, token: &str, body: Value) -> (i64, String) {
    let created = server
        .post("/api/domains")
        .authorization_bearer(token)
        .json(&body)
        .await
        .json::<Value>();

    (
        created["id"].as_i64().unwrap(),
        created["verification_token"].as_str().unwrap().to_string(),
    )
}

#[sqlx::test]
async fn test_txt_challenge_verifies_and_issues_certificate(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let (state, provider) = common::create_test_state(pool.clone());
    let server = common::make_server(state);

    let (id, challenge) = register(&server, &token, json!({ "hostname": "txt.example.com" })).await;
    provider.set_txt("txt.example.com", &["unrelated", challenge.as_str()]);

    let response = server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "verified": true }));

    let domain = server
        .get(&format!("/api/domains/{id}"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(domain["is_verified"], true);
    assert!(domain["verified_at"].is_string());
    assert_eq!(domain["certificate_status"], "ACTIVE");
    assert_eq!(domain["verification_token"], challenge.as_str());
    assert!(domain.get("verification").is_none());
    assert_eq!(provider.certificate_calls(), 1);
}

#[sqlx::test]
async fn test_missing_challenge_returns_false(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let (state, provider) = common::create_test_state(pool.clone());
    let server = common::make_server(state);

    let (id, _) = register(&server, &token, json!({ "hostname": "wait.example.com" })).await;
    provider.set_txt("wait.example.com", &["cd-verify-someone-else"]);

    let response = server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "verified": false }));

    assert_eq!(common::certificate_status_of(&pool, id).await, "PENDING");
    assert_eq!(provider.certificate_calls(), 0);
}

#[sqlx::test]
async fn test_dns_failure_is_probe_error(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let (state, provider) = common::create_test_state(pool.clone());
    let server = common::make_server(state);

    let (id, _) = register(&server, &token, json!({ "hostname": "down.example.com" })).await;
    provider.set_dns_down(true);

    let response = server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "verification_probe_failed"
    );

    let verified: bool = sqlx::query_scalar("SELECT is_verified FROM domains WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!verified);
}

#[sqlx::test]
async fn test_cname_challenge_ignores_case_and_trailing_dot(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let (state, provider) = common::create_test_state(pool);
    let server = common::make_server(state);

    let (id, _) = register(
        &server,
        &token,
        json!({ "hostname": "cname.example.com", "verification_method": "DNS_CNAME" }),
    )
    .await;
    provider.set_cname("cname.example.com", "Verify.Example.NET.");

    server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await
        .assert_json(&json!({ "verified": true }));
}

#[sqlx::test]
async fn test_file_challenge_trims_body(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let (state, provider) = common::create_test_state(pool);
    let server = common::make_server(state);

    let (id, challenge) = register(
        &server,
        &token,
        json!({ "hostname": "file.example.com", "verification_method": "FILE" }),
    )
    .await;
    provider.set_file("file.example.com", &format!("{challenge}\n"));

    server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await
        .assert_json(&json!({ "verified": true }));
}

#[sqlx::test]
async fn test_certificate_failure_does_not_undo_verification(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let (state, provider) = common::create_test_state(pool.clone());
    let server = common::make_server(state);

    let (id, challenge) = register(&server, &token, json!({ "hostname": "ratelimited.example.com" })).await;
    provider.set_txt("ratelimited.example.com", &[challenge.as_str()]);
    provider.set_issue(CertificateReply::ApiError(429, "rate limited".to_string()));

    server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await
        .assert_json(&json!({ "verified": true }));

    assert_eq!(common::certificate_status_of(&pool, id).await, "FAILED");

    let status = server
        .get(&format!("/api/domains/{id}/ssl/status"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(status["status"], "FAILED");
    assert!(status["error"].as_str().unwrap().contains("rate limited"));
}

#[sqlx::test]
async fn test_verify_is_idempotent(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let id = common::create_test_domain(&pool, 1, "again.example.com", true, "ACTIVE").await;
    let (state, provider) = common::create_test_state(pool);
    provider.set_dns_down(true);
    let server = common::make_server(state);

    server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await
        .assert_json(&json!({ "verified": true }));
    assert_eq!(provider.certificate_calls(), 0);
}

#[sqlx::test]
async fn test_verified_domain_with_pending_certificate_starts_issuance(pool: PgPool) {
    let token = common::create_test_token(&pool, 1).await;
    let id = common::create_test_domain(&pool, 1, "resume.example.com", true, "PENDING").await;
    let (state, provider) = common::create_test_state(pool.clone());
    let server = common::make_server(state);

    server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&token)
        .await
        .assert_json(&json!({ "verified": true }));

    assert_eq!(provider.certificate_calls(), 1);
    assert_eq!(common::certificate_status_of(&pool, id).await, "ACTIVE");
}

#[sqlx::test]
async fn test_verify_other_owner_not_found(pool: PgPool) {
    let intruder = common::create_test_token(&pool, 2).await;
    let id = common::create_test_domain(&pool, 1, "theirs.example.com", false, "PENDING").await;
    let (state, provider) = common::create_test_state(pool);
    provider.set_txt("theirs.example.com", &["cd-verify-theirs.example.com"]);
    let server = common::make_server(state);

    server
        .post(&format!("/api/domains/{id}/verify"))
        .authorization_bearer(&intruder)
        .await
        .assert_status_not_found();
}
