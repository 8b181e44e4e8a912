use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use classbase_core::{AppError, ErrorResponse};
use classbase_models::{CreateUserDto, CreatedUser, UpdateUserDto, UserView};
use tracing::instrument;

use super::service::UsersService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a user (admin only)
///
/// Creates the identity and the `users/<uid>` document, and sets the role
/// claim.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = CreatedUser),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Token rejected or caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Error creating user", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<CreatedUser>), AppError> {
    let uid = UsersService::create_user(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(CreatedUser { uid })))
}

/// Get a user
///
/// The `class` field holds the data of the referenced class.
#[utoipa::path(
    get,
    path = "/users/{uid}",
    params(
        ("uid" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User document", body = serde_json::Value),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Token rejected", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Error getting user", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(uid): Path<String>,
) -> Result<Json<UserView>, AppError> {
    let user = UsersService::get_user(&state, &uid).await?;
    Ok(Json(user))
}

/// Update a user (admin only)
#[utoipa::path(
    put,
    path = "/users/{uid}",
    params(
        ("uid" = String, Path, description = "User id")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 204, description = "User updated"),
        (status = 400, description = "No field given", body = ErrorResponse),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Token rejected or caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Error updating user", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(uid): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<StatusCode, AppError> {
    UsersService::update_user(&state, &uid, dto).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/users/{uid}",
    params(
        ("uid" = String, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Token rejected or caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Error deleting user", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(uid): Path<String>,
) -> Result<StatusCode, AppError> {
    UsersService::delete_user(&state, &uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All user documents", body = Vec<serde_json::Value>),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Token rejected or caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Error getting users", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn get_all_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = UsersService::get_all_users(&state).await?;
    Ok(Json(users))
}
