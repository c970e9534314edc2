mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{TestApp, TEST_CNPJ};
use identity_service::services::CompanyRecord;
use serde_json::json;

#[tokio::test]
async fn company_registration_returns_session_and_formatted_cnpj() {
    let app = TestApp::spawn();
    let body = app.register_company("owner@acme.com").await;

    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "COMPANY");
    assert_eq!(body["user"]["is_admin"], true);
    assert_eq!(body["company"]["cnpj"], "11.222.333/0001-81");
    assert_eq!(body["company"]["legal_name"], "Acme Transportes Ltda");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::spawn();
    app.register_company("owner@acme.com").await;

    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "Acme Again",
                "email": "owner@acme.com",
                "password": "Str0ng!Pass",
                "cnpj": TEST_CNPJ,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn duplicate_cnpj_conflicts_before_registry_lookup() {
    let app = TestApp::spawn();
    app.register_company("owner@acme.com").await;
    assert_eq!(app.registry.company_lookup_count(), 1);

    // Same number with display formatting; the digits-only index must
    // catch it locally.
    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "Copycat",
                "email": "other@acme.com",
                "password": "Str0ng!Pass",
                "cnpj": "11.222.333/0001-81",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    assert_eq!(app.registry.company_lookup_count(), 1);
}

#[tokio::test]
async fn young_company_violates_business_rule() {
    let app = TestApp::spawn();
    app.registry.add_company(CompanyRecord {
        cnpj: TEST_CNPJ.to_string(),
        name: "Fresh Co".to_string(),
        legal_name: "Fresh Co Ltda".to_string(),
        street: None,
        number: None,
        neighborhood: None,
        city: None,
        state: None,
        zip: None,
        founded_at: Utc::now().date_naive() - chrono::Duration::days(60),
        status: "ATIVA".to_string(),
        activity: None,
        raw: json!({}),
    });

    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "Fresh Co",
                "email": "owner@fresh.com",
                "password": "Str0ng!Pass",
                "cnpj": TEST_CNPJ,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "business_rule_violation");
}

#[tokio::test]
async fn invalid_check_digits_fail_without_lookup() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "Bogus",
                "email": "owner@bogus.com",
                "password": "Str0ng!Pass",
                "cnpj": "11222333000199",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failure");
    assert_eq!(app.registry.company_lookup_count(), 0);
}

#[tokio::test]
async fn unknown_company_is_not_found() {
    let app = TestApp::spawn();
    // Valid check digits, but nothing seeded in the registry.
    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "Ghost",
                "email": "owner@ghost.com",
                "password": "Str0ng!Pass",
                "cnpj": TEST_CNPJ,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let app = TestApp::spawn();
    app.seed_registry_company();

    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "Acme",
                "email": "owner@acme.com",
                "password": "short",
                "cnpj": TEST_CNPJ,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failure");
}

#[tokio::test]
async fn missing_fields_fail_request_validation() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "",
                "email": "owner@acme.com",
                "password": "Str0ng!Pass",
                "cnpj": TEST_CNPJ,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_failure");
}

#[tokio::test]
async fn postal_enrichment_failure_does_not_block_registration() {
    let app = TestApp::spawn();
    app.seed_registry_company();

    // No address seeded for this CEP; enrichment fails but the
    // registration still succeeds.
    let (status, body) = app
        .post_json(
            "/auth/register/company",
            json!({
                "name": "Acme",
                "email": "owner@acme.com",
                "password": "Str0ng!Pass",
                "cnpj": TEST_CNPJ,
                "cep": "01310-100",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
}
