use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{ChangePasswordRequest, UpdateProfileRequest},
    dtos::MessageResponse,
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Get the authenticated user's profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user.0.user_id()?;
    let res = state.identity.get_profile(user_id).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Update the authenticated user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user.0.user_id()?;
    let res = state.identity.update_profile(user_id, req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Change the authenticated user's password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user.0.user_id()?;
    state
        .identity
        .change_password(user_id, &req.current_password, &req.new_password)
        .await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password changed successfully".to_string(),
        }),
    ))
}
