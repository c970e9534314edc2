mod common;

use axum::http::StatusCode;
use common::TestApp;
use identity_service::services::FederatedIdentity;
use serde_json::json;

#[tokio::test]
async fn login_returns_session_for_valid_credentials() {
    let app = TestApp::spawn();
    app.register_company("owner@acme.com").await;

    let (status, body) = app
        .post_json(
            "/auth/login",
            json!({ "email": "owner@acme.com", "password": "Str0ng!Pass" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "owner@acme.com");
    assert_eq!(body["company"]["cnpj"], "11.222.333/0001-81");
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = TestApp::spawn();
    app.register_company("owner@acme.com").await;

    let (status, unknown) = app
        .post_json(
            "/auth/login",
            json!({ "email": "nobody@acme.com", "password": "Str0ng!Pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, wrong) = app
        .post_json(
            "/auth/login",
            json!({ "email": "owner@acme.com", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Identical bodies so the endpoint cannot enumerate accounts.
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json("/auth/login", json!({ "email": "", "password": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failure");
}

#[tokio::test]
async fn google_login_creates_account_on_first_use() {
    let app = TestApp::spawn();
    app.federated.add_identity(
        "good-token",
        FederatedIdentity {
            subject: "g-12345".to_string(),
            email: "fed@acme.com".to_string(),
            email_verified: true,
            name: Some("Fed User".to_string()),
            picture_url: None,
        },
    );

    let (status, first) = app
        .post_json("/auth/google", json!({ "id_token": "good-token" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["email"], "fed@acme.com");

    let (status, second) = app
        .post_json("/auth/google", json!({ "id_token": "good-token" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["user_id"], second["user"]["user_id"]);

    let (status, body) = app
        .post_json("/auth/google", json!({ "id_token": "bad-token" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn verify_endpoint_introspects_tokens() {
    let app = TestApp::spawn();
    let owner = app.register_company("owner@acme.com").await;
    let session = owner["token"].as_str().unwrap();

    let (status, body) = app
        .post_json("/auth/verify", json!({ "token": session }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["email"], "owner@acme.com");
    assert_eq!(body["role"], "COMPANY");

    let (status, body) = app
        .post_json("/auth/verify", json!({ "token": "garbage" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert!(body.get("email").is_none());
}

#[tokio::test]
async fn profile_roundtrip_with_role_specific_updates() {
    let app = TestApp::spawn();
    let owner = app.register_company("owner@acme.com").await;
    let session = owner["token"].as_str().unwrap();

    let (status, body) = app.get_auth("/users/me", session).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "owner@acme.com");
    assert_eq!(body["company"]["name"], "Acme");

    let (status, body) = app
        .patch_json_auth(
            "/users/me",
            json!({ "name": "Acme Renamed", "phone": "+55 11 99999-0000" }),
            session,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["company"]["name"], "Acme Renamed");
    assert_eq!(body["company"]["phone"], "+55 11 99999-0000");
}

#[tokio::test]
async fn password_change_invalidates_old_credential() {
    let app = TestApp::spawn();
    let owner = app.register_company("owner@acme.com").await;
    let session = owner["token"].as_str().unwrap();

    let (status, body) = app
        .post_json_auth(
            "/users/me/password",
            json!({ "current_password": "wrong", "new_password": "NewStr0ng!Pass" }),
            session,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "body: {}", body);

    let (status, _) = app
        .post_json_auth(
            "/users/me/password",
            json!({ "current_password": "Str0ng!Pass", "new_password": "NewStr0ng!Pass" }),
            session,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "owner@acme.com", "password": "Str0ng!Pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "owner@acme.com", "password": "NewStr0ng!Pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let app = TestApp::spawn();

    let (status, body) = app.get_auth("/users/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_invalid");
}

#[tokio::test]
async fn malformed_cors_origin_fails_router_build() {
    let state = common::state_with_origins(&["http://app.example.com", "not an origin\n"]);
    assert!(identity_service::build_router(state).is_err());

    let state = common::state_with_origins(&["http://app.example.com"]);
    assert!(identity_service::build_router(state).is_ok());
}

#[tokio::test]
async fn health_check_reports_service_metadata() {
    let app = TestApp::spawn();

    let (status, body) = app.get_auth("/health", "ignored").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "identity-service");
}
