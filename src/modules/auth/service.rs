use anyhow::Context;
use axum::http::StatusCode;
use classbase_auth::claims::role_claims;
use classbase_auth::{DecodedIdToken, NewIdentity, UserRecord};
use classbase_core::AppError;
use classbase_models::collections::user_path;
use classbase_models::users::document_role;
use classbase_models::{NewUser, UserDocument};
use classbase_store::{DocumentPath, Fields};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::metrics::{track_user_created, track_user_role_set};
use crate::state::AppState;

/// Operations on identities and their roles, shared by the HTTP handlers and
/// the admin CLI.
///
/// Every provider failure surfaces as a fixed message; the underlying error
/// is only logged.
pub struct AuthService;

impl AuthService {
    /// Decodes `token`, rejecting revoked tokens and disabled users.
    #[instrument(skip_all)]
    pub async fn verify_token(
        state: &AppState,
        token: Option<&str>,
    ) -> Result<DecodedIdToken, AppError> {
        let token = token.ok_or_else(AppError::invalid_input)?;

        state
            .identity
            .verify_id_token(token, true)
            .await
            .context("Invalid token")
            .map_err(|err| AppError::new(StatusCode::UNAUTHORIZED, err))
    }

    #[instrument(skip(state))]
    pub async fn get_user_record(state: &AppState, uid: &str) -> Result<UserRecord, AppError> {
        state
            .identity
            .get_user(uid)
            .await
            .context("User not found")
            .map_err(|err| AppError::new(StatusCode::NOT_FOUND, err))
    }

    /// Mints a custom token for `uid` and exchanges it for an ID token, the
    /// way a client would after receiving the custom token.
    #[instrument(skip(state))]
    pub async fn create_custom_token(state: &AppState, uid: Option<&str>) -> Result<String, AppError> {
        let uid = uid.ok_or_else(AppError::invalid_input)?;

        let exchange = async {
            let custom_token = state.identity.create_custom_token(uid).await?;
            let session = state.identity.sign_in_with_custom_token(&custom_token).await?;
            anyhow::Ok(session.id_token)
        };

        exchange
            .await
            .context("Error creating custom token")
            .map_err(AppError::internal)
    }

    #[instrument(skip(state, claims))]
    pub async fn set_custom_user_claims(
        state: &AppState,
        uid: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), AppError> {
        state
            .identity
            .set_custom_user_claims(uid, claims)
            .await
            .context("Error setting custom claims")
            .map_err(AppError::internal)
    }

    #[instrument(skip(state))]
    pub async fn revoke_refresh_tokens(state: &AppState, uid: &str) -> Result<(), AppError> {
        state
            .identity
            .revoke_refresh_tokens(uid)
            .await
            .context("Error revoking refresh tokens")
            .map_err(AppError::internal)
    }

    /// Writes `role` to the user document and the identity's claims, then
    /// revokes the user's sessions so the next ID token carries the new
    /// claim.
    #[instrument(skip(state))]
    pub async fn set_user_role(
        state: &AppState,
        uid: Option<&str>,
        role: Option<&str>,
    ) -> Result<(), AppError> {
        let (Some(uid), Some(role)) = (uid, role) else {
            return Err(AppError::invalid_input());
        };

        let path = user_document(uid)?;

        Self::apply_role(state, &path, uid, role)
            .await
            .map_err(|err| rewrap(err, "Error setting user role"))
    }

    async fn apply_role(
        state: &AppState,
        path: &DocumentPath,
        uid: &str,
        role: &str,
    ) -> Result<(), AppError> {
        let mut fields = Fields::new();
        fields.insert("role".into(), role.into());

        state
            .store
            .update(path, fields)
            .await
            .context("Error updating user document")?;
        Self::set_custom_user_claims(state, uid, &role_claims(role)).await?;
        Self::revoke_refresh_tokens(state, uid).await?;

        track_user_role_set(role);
        tracing::info!(uid = %uid, role = %role, "User role set");
        Ok(())
    }

    /// The `role` field of `users/<uid>`; `None` when the document does not
    /// exist or has no string role.
    #[instrument(skip(state))]
    pub async fn get_user_role(state: &AppState, uid: Option<&str>) -> Result<Option<String>, AppError> {
        let uid = uid.ok_or_else(AppError::invalid_input)?;
        let path = user_document(uid)?;

        let document = state
            .store
            .get(&path)
            .await
            .context("Error getting user role")
            .map_err(AppError::internal)?;

        Ok(document.as_ref().and_then(document_role))
    }

    /// Creates the identity and its `users/<uid>` document, sets the role
    /// claim and revokes any sessions. Returns the new uid.
    #[instrument(skip(state, user), fields(email = %user.email, role = %user.role))]
    pub async fn create_user(state: &AppState, user: NewUser) -> Result<String, AppError> {
        let role = user.role.clone();

        let uid = Self::provision_user(state, user)
            .await
            .map_err(|err| rewrap(err, "Error creating user"))?;

        track_user_created(&role);
        tracing::info!(uid = %uid, "User created");
        Ok(uid)
    }

    async fn provision_user(state: &AppState, user: NewUser) -> Result<String, AppError> {
        let record = state
            .identity
            .create_user(NewIdentity {
                email: user.email.clone(),
                display_name: user.name.clone(),
            })
            .await
            .context("Error creating identity")?;
        let uid = record.uid;
        let path = user_path(&uid).context("Identity provider returned an unusable uid")?;

        let document = UserDocument {
            email: user.email,
            name: user.name,
            role: user.role,
            class_id: user.class_id,
        };
        let role = document.role.clone();

        state
            .store
            .set(&path, document.into_fields())
            .await
            .context("Error writing user document")?;
        Self::set_custom_user_claims(state, &uid, &role_claims(&role)).await?;
        Self::revoke_refresh_tokens(state, &uid).await?;

        Ok(uid)
    }
}

/// `users/<uid>`, or 400 when `uid` cannot name a document.
pub(crate) fn user_document(uid: &str) -> Result<DocumentPath, AppError> {
    user_path(uid).map_err(|err| {
        tracing::warn!(error = %err, "Rejected user id");
        AppError::invalid_input()
    })
}

/// Replaces the public message of a failed step with the message of the
/// operation it belongs to. The step's message stays in the logged chain.
pub(crate) fn rewrap(err: AppError, message: &'static str) -> AppError {
    AppError::internal(err.error.context(message))
}
