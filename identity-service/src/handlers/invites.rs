use service_core::{
    axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};
use uuid::Uuid;

use crate::{
    dtos::auth::{InviteListQuery, IssueInviteRequest},
    dtos::MessageResponse,
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Mint a new invite token for a company
pub async fn issue_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(company_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<IssueInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin_id = user.0.user_id()?;
    let res = state
        .identity
        .generate_invite_token(company_id, admin_id, req.expires_in_days)
        .await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// List a company's invite tokens, redacted
pub async fn list_invites(
    State(state): State<AppState>,
    user: AuthUser,
    Path(company_id): Path<Uuid>,
    Query(query): Query<InviteListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let admin_id = user.0.user_id()?;
    let res = state
        .identity
        .list_invite_tokens(company_id, admin_id, query.include_used, query.include_expired)
        .await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Revoke an invite token
pub async fn revoke_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path((company_id, token)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let admin_id = user.0.user_id()?;
    state
        .identity
        .revoke_invite_token(company_id, admin_id, &token)
        .await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Invite token revoked".to_string(),
        }),
    ))
}
