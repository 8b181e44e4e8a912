use anyhow::Context;
use classbase_core::AppError;
use classbase_models::collections::{USERS, user_path};
use classbase_models::{CreateUserDto, UpdateUserDto, UserView};
use classbase_store::{Document, DocumentPath, FieldValue};
use serde_json::Value;
use tracing::instrument;

use crate::modules::auth::service::{AuthService, rewrap, user_document};
use crate::state::AppState;

pub struct UsersService;

impl UsersService {
    /// Creates a user in the class `classId`. Every field is required.
    #[instrument(skip(state, dto))]
    pub async fn create_user(state: &AppState, dto: CreateUserDto) -> Result<String, AppError> {
        let user = dto.complete().ok_or_else(AppError::invalid_input)?;
        AuthService::create_user(state, user).await
    }

    /// `users/<uid>` with its class reference replaced by the class data.
    #[instrument(skip(state))]
    pub async fn get_user(state: &AppState, uid: &str) -> Result<UserView, AppError> {
        let path = user_path(uid).map_err(|err| {
            tracing::warn!(error = %err, "Rejected user id");
            AppError::not_found("User not found")
        })?;

        let document = state
            .store
            .get(&path)
            .await
            .context("Error getting user")
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let class = resolve_class(state, &document)
            .await
            .context("Error getting user")
            .map_err(AppError::internal)?;

        Ok(UserView::from_document(&document, class))
    }

    /// Overwrites the provided non-empty fields. A new role also goes through
    /// [`AuthService::set_user_role`]; the user's sessions are revoked in
    /// every case.
    #[instrument(skip(state, dto))]
    pub async fn update_user(
        state: &AppState,
        uid: &str,
        dto: UpdateUserDto,
    ) -> Result<(), AppError> {
        if !dto.has_any_field() {
            return Err(AppError::invalid_input());
        }

        let path = user_document(uid)?;

        Self::apply_update(state, &path, uid, &dto)
            .await
            .map_err(|err| rewrap(err, "Error updating user"))
    }

    async fn apply_update(
        state: &AppState,
        path: &DocumentPath,
        uid: &str,
        dto: &UpdateUserDto,
    ) -> Result<(), AppError> {
        let fields = dto.to_fields();

        if fields.is_empty() {
            // Only empty values were sent: nothing to write, but the user
            // must still exist.
            state
                .store
                .get(path)
                .await
                .context("Error reading user document")?
                .with_context(|| format!("{path} does not exist"))?;
        } else {
            state
                .store
                .update(path, fields)
                .await
                .context("Error updating user document")?;
        }

        if let Some(role) = dto.new_role() {
            AuthService::set_user_role(state, Some(uid), Some(role)).await?;
        }

        AuthService::revoke_refresh_tokens(state, uid).await?;
        tracing::info!(uid = %uid, "User updated");
        Ok(())
    }

    /// Deletes the identity, then the user document.
    #[instrument(skip(state))]
    pub async fn delete_user(state: &AppState, uid: &str) -> Result<(), AppError> {
        let path = user_document(uid)?;

        let delete = async {
            state.identity.delete_user(uid).await?;
            state.store.delete(&path).await?;
            anyhow::Ok(())
        };

        delete
            .await
            .context("Error deleting user")
            .map_err(AppError::internal)?;

        tracing::info!(uid = %uid, "User deleted");
        Ok(())
    }

    /// Every user document, class references resolved, in document order.
    #[instrument(skip(state))]
    pub async fn get_all_users(state: &AppState) -> Result<Vec<UserView>, AppError> {
        let list = async {
            let documents = state.store.list(USERS).await?;

            let mut users = Vec::with_capacity(documents.len());
            for document in &documents {
                let class = resolve_class(state, document).await?;
                users.push(UserView::from_document(document, class));
            }
            anyhow::Ok(users)
        };

        list.await
            .context("Error getting users")
            .map_err(AppError::internal)
    }
}

/// The data of the class a user document points at.
///
/// A reference is replaced by the referenced document's fields, or dropped
/// when that document does not exist; any other value is passed through.
async fn resolve_class(state: &AppState, document: &Document) -> anyhow::Result<Option<Value>> {
    match document.fields.get("class") {
        None | Some(FieldValue::Null) => Ok(None),
        Some(FieldValue::Reference(path)) => {
            let class = state
                .store
                .get(path)
                .await
                .with_context(|| format!("Error reading {path}"))?;
            Ok(class.map(|c| c.to_json()))
        }
        Some(other) => Ok(Some(other.to_json())),
    }
}
