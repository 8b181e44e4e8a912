//! # Classbase CLI
//!
//! Administrative commands that act on the identity provider and the
//! document store directly, for operators who need to act before any admin
//! exists or outside the HTTP API.
//!
//! Every command goes through the same services as the API, so the user
//! document and the role claim stay in step.

use classbase::modules::auth::service::AuthService;
use classbase::modules::users::service::UsersService;
use classbase::state::AppState;
use classbase_auth::UserRecord;
use classbase_core::AppError;
use classbase_models::{NewUser, UserView, roles};
use serde::Serialize;

/// An identity together with its user document.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub identity: UserRecord,
    /// `None` when the identity has no `users/<uid>` document
    pub document: Option<UserView>,
}

/// Keeps the full cause chain of a failed operation for the operator.
fn into_anyhow(err: AppError) -> anyhow::Error {
    err.error
}

/// Creates an identity and user document with the `admin` role.
pub async fn create_admin(
    state: &AppState,
    email: &str,
    name: &str,
    class_id: &str,
) -> anyhow::Result<String> {
    let user = NewUser {
        email: email.to_string(),
        name: name.to_string(),
        role: roles::ADMIN.to_string(),
        class_id: class_id.to_string(),
    };
    AuthService::create_user(state, user).await.map_err(into_anyhow)
}

pub async fn set_role(state: &AppState, uid: &str, role: &str) -> anyhow::Result<()> {
    AuthService::set_user_role(state, Some(uid), Some(role))
        .await
        .map_err(into_anyhow)
}

pub async fn revoke_sessions(state: &AppState, uid: &str) -> anyhow::Result<()> {
    AuthService::revoke_refresh_tokens(state, uid)
        .await
        .map_err(into_anyhow)
}

pub async fn show_user(state: &AppState, uid: &str) -> anyhow::Result<UserSummary> {
    let identity = AuthService::get_user_record(state, uid)
        .await
        .map_err(into_anyhow)?;

    let document = match UsersService::get_user(state, uid).await {
        Ok(view) => Some(view),
        Err(err) if err.status.as_u16() == 404 => None,
        Err(err) => return Err(into_anyhow(err)),
    };

    Ok(UserSummary { identity, document })
}
