pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::IdentityConfig;
use crate::services::{IdentityService, JwtService};

#[derive(Clone)]
pub struct AppState {
    pub config: IdentityConfig,
    pub jwt: JwtService,
    pub identity: IdentityService,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    // Refuse to start on a malformed origin instead of widening CORS.
    let mut allowed_origins = Vec::with_capacity(state.config.security.allowed_origins.len());
    for origin in &state.config.security.allowed_origins {
        let value = origin
            .parse::<service_core::axum::http::HeaderValue>()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))
            })?;
        allowed_origins.push(value);
    }

    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(handlers::get_profile).patch(handlers::update_profile),
        )
        .route("/users/me/password", post(handlers::change_password))
        .route(
            "/companies/:company_id/invites",
            post(handlers::issue_invite).get(handlers::list_invites),
        )
        .route(
            "/companies/:company_id/invites/:token",
            delete(handlers::revoke_invite),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(handlers::login))
        .route("/auth/google", post(handlers::google_login))
        .route("/auth/register/company", post(handlers::register_company))
        .route("/auth/register/employee", post(handlers::register_employee))
        .route("/auth/verify", post(handlers::verify_token))
        .merge(protected_routes)
        .with_state(state.clone())
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    service_core::axum::http::Method::GET,
                    service_core::axum::http::Method::POST,
                    service_core::axum::http::Method::PATCH,
                    service_core::axum::http::Method::DELETE,
                    service_core::axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    service_core::axum::http::header::AUTHORIZATION,
                    service_core::axum::http::header::CONTENT_TYPE,
                ]),
        );

    Ok(app)
}

/// Service health check
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> service_core::axum::Json<serde_json::Value> {
    service_core::axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    }))
}
