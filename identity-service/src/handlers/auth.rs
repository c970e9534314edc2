use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{
        GoogleLoginRequest, LoginRequest, RegisterCompanyRequest, RegisterEmployeeRequest,
        TokenStatusResponse, VerifyTokenRequest,
    },
    utils::ValidatedJson,
    AppState,
};

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.identity.login(&req.email, &req.password).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Login with a federated Google identity token
pub async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.identity.login_with_google(&req.id_token).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Register a company with its owner account
pub async fn register_company(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.identity.register_company(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Register an employee through an invite token
pub async fn register_employee(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterEmployeeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.identity.register_employee(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Introspect a session token
pub async fn verify_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyTokenRequest>,
) -> impl IntoResponse {
    let res = match state.identity.verify_token(&req.token) {
        Ok(claims) => TokenStatusResponse {
            valid: true,
            user_id: claims.user_id().ok(),
            email: Some(claims.email),
            role: Some(claims.role.as_str().to_string()),
            expires_at: Some(claims.exp),
        },
        Err(_) => TokenStatusResponse::invalid(),
    };
    Json(res)
}
