use axum::Json;
use axum::extract::{Query, State};
use classbase_core::{AppError, ErrorResponse};
use classbase_models::{IdTokenResponse, MessageResponse, RoleQuery, TokenQuery, UidQuery};
use serde_json::Value;
use tracing::instrument;

use super::service::AuthService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;

/// Verify an ID token
///
/// Returns the decoded token. Revoked tokens and tokens of disabled users
/// are rejected.
#[utoipa::path(
    get,
    path = "/auth/verifyToken",
    params(TokenQuery),
    responses(
        (status = 200, description = "Decoded ID token", body = serde_json::Value),
        (status = 400, description = "Missing token", body = ErrorResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 429, description = "Too many requests")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn verify_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Value>, AppError> {
    let decoded = AuthService::verify_token(&state, query.token.as_deref()).await?;
    Ok(Json(serde_json::to_value(decoded)?))
}

/// Obtain an ID token for a user
///
/// Mints a custom token for `uid` and exchanges it for an ID token.
#[utoipa::path(
    get,
    path = "/auth/createCustomToken",
    params(UidQuery),
    responses(
        (status = 200, description = "ID token for the user", body = IdTokenResponse),
        (status = 400, description = "Missing uid", body = ErrorResponse),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Error creating custom token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn create_custom_token(
    State(state): State<AppState>,
    Query(query): Query<UidQuery>,
) -> Result<Json<IdTokenResponse>, AppError> {
    let id_token = AuthService::create_custom_token(&state, query.uid.as_deref()).await?;
    Ok(Json(IdTokenResponse { id_token }))
}

/// Get the role stored on a user document
///
/// Responds with `null` when the user has no document.
#[utoipa::path(
    get,
    path = "/auth/getUserRole",
    params(UidQuery),
    responses(
        (status = 200, description = "Role of the user, or null", body = String),
        (status = 400, description = "Missing uid", body = ErrorResponse),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Token rejected", body = ErrorResponse),
        (status = 500, description = "Error getting user role", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_user_role(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<UidQuery>,
) -> Result<Json<Option<String>>, AppError> {
    let role = AuthService::get_user_role(&state, query.uid.as_deref()).await?;
    Ok(Json(role))
}

/// Assign a role to a user (admin only)
///
/// Updates the user document and the role claim, then revokes the user's
/// sessions.
///
/// The only `/auth` route gated on a role: a signed-in caller is not
/// enough, the caller's own `role` claim must be `admin`.
#[utoipa::path(
    get,
    path = "/auth/setUserRole",
    params(RoleQuery),
    responses(
        (status = 200, description = "Role set", body = MessageResponse),
        (status = 400, description = "Missing uid or role", body = ErrorResponse),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Token rejected or caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Error setting user role", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, admin), fields(admin = %admin.0.uid()))]
pub async fn set_user_role(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<RoleQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::set_user_role(&state, query.uid.as_deref(), query.role.as_deref()).await?;
    Ok(Json(MessageResponse {
        status: 200,
        message: "User role set successfully".to_string(),
    }))
}
