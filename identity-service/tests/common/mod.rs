//! Test helper module for identity-service integration tests.
//!
//! Builds the full router over in-memory collaborators so tests run
//! without external services.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use identity_service::{
    build_router,
    config::{
        Environment, GoogleConfig, IdentityConfig, InviteConfig, JwtConfig, RegistryConfig,
        SecurityConfig,
    },
    services::{
        CompanyRecord, IdentityService, InMemoryStore, InviteTokenService, JwtService,
        MockIdentityProvider, MockRegistry, RecordingNotifier,
    },
    AppState,
};
use service_core::config as core_config;
use std::sync::Arc;
use tower::util::ServiceExt;

/// A CNPJ with valid check digits, matching the seeded registry record.
pub const TEST_CNPJ: &str = "11222333000181";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub registry: Arc<MockRegistry>,
    pub federated: Arc<MockIdentityProvider>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let (state, store, registry, federated, notifier) = build_state(test_config());
        let router = build_router(state).expect("Failed to build router");

        Self {
            router,
            store,
            registry,
            federated,
            notifier,
        }
    }

    /// Seed the mock registry with a company old enough to register.
    pub fn seed_registry_company(&self) {
        self.registry.add_company(CompanyRecord {
            cnpj: TEST_CNPJ.to_string(),
            name: "Acme Transportes".to_string(),
            legal_name: "Acme Transportes Ltda".to_string(),
            street: Some("Rua das Flores".to_string()),
            number: Some("100".to_string()),
            neighborhood: Some("Centro".to_string()),
            city: Some("São Paulo".to_string()),
            state: Some("SP".to_string()),
            zip: Some("01310100".to_string()),
            founded_at: NaiveDate::from_ymd_opt(2015, 3, 10).unwrap(),
            status: "ATIVA".to_string(),
            activity: Some("Transporte rodoviário de carga".to_string()),
            raw: serde_json::json!({}),
        });
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.request("POST", path, Some(body), None).await
    }

    pub async fn post_json_auth(
        &self,
        path: &str,
        body: serde_json::Value,
        token: &str,
    ) -> (StatusCode, serde_json::Value) {
        self.request("POST", path, Some(body), Some(token)).await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (StatusCode, serde_json::Value) {
        self.request("GET", path, None, Some(token)).await
    }

    pub async fn patch_json_auth(
        &self,
        path: &str,
        body: serde_json::Value,
        token: &str,
    ) -> (StatusCode, serde_json::Value) {
        self.request("PATCH", path, Some(body), Some(token)).await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (StatusCode, serde_json::Value) {
        self.request("DELETE", path, None, Some(token)).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    /// Register the seeded company and return the auth response body.
    pub async fn register_company(&self, email: &str) -> serde_json::Value {
        self.seed_registry_company();
        let (status, body) = self
            .post_json(
                "/auth/register/company",
                serde_json::json!({
                    "name": "Acme",
                    "email": email,
                    "password": "Str0ng!Pass",
                    "cnpj": TEST_CNPJ,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
        body
    }
}

/// Application state over fresh in-memory collaborators, with the
/// given CORS origins in place of the defaults.
pub fn state_with_origins(origins: &[&str]) -> AppState {
    let mut config = test_config();
    config.security.allowed_origins = origins.iter().map(|s| s.to_string()).collect();
    build_state(config).0
}

type Collaborators = (
    AppState,
    Arc<InMemoryStore>,
    Arc<MockRegistry>,
    Arc<MockIdentityProvider>,
    Arc<RecordingNotifier>,
);

fn build_state(config: IdentityConfig) -> Collaborators {
    let store = Arc::new(InMemoryStore::new());
    let registry = Arc::new(MockRegistry::new());
    let federated = Arc::new(MockIdentityProvider::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let jwt = JwtService::new(&config.jwt).expect("Failed to create JWT service");
    let invites = InviteTokenService::new(
        store.clone(),
        notifier.clone(),
        config.invites.default_expiry_days,
    );
    let identity = IdentityService::new(
        store.clone(),
        registry.clone(),
        federated.clone(),
        invites,
        jwt.clone(),
        notifier.clone(),
    );

    let state = AppState {
        config,
        jwt,
        identity,
    };
    (state, store, registry, federated, notifier)
}

fn test_config() -> IdentityConfig {
    IdentityConfig {
        common: core_config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "identity-service".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "error".to_string(),
        jwt: JwtConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            session_expiry_hours: 24,
        },
        registry: RegistryConfig {
            company_base_url: "http://registry.invalid".to_string(),
            postal_base_url: "http://postal.invalid".to_string(),
        },
        google: GoogleConfig {
            tokeninfo_url: "http://tokeninfo.invalid".to_string(),
            client_id: "test-client".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        invites: InviteConfig {
            default_expiry_days: 30,
        },
    }
}
