use anyhow::Context;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use classbase_auth::DecodedIdToken;
use classbase_core::AppError;

use crate::metrics::track_token_verification;
use crate::state::AppState;

/// The verified identity of the caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub DecodedIdToken);

impl AuthUser {
    pub fn uid(&self) -> &str {
        &self.0.uid
    }

    /// The `role` custom claim, if any
    pub fn role(&self) -> Option<&str> {
        self.0.role()
    }

    pub fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }
}

/// Token of an `Authorization: Bearer <token>` header. The scheme must be
/// exactly `Bearer` and the token must not be empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Verifies the bearer token with the identity provider, checking for
/// revocation.
async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthUser, AppError> {
    let token = bearer_token(headers).ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

    let result = state.identity.verify_id_token(token, true).await;
    track_token_verification(result.is_ok());

    let decoded = result
        .context("Access Denied")
        .map_err(|err| AppError::new(StatusCode::FORBIDDEN, err))?;
    tracing::debug!(uid = %decoded.uid, "Authenticated request");

    Ok(AuthUser(decoded))
}

/// Guard for routers whose every route needs an authenticated caller.
///
/// ```rust,ignore
/// Router::new()
///     .route("/", get(handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(req.headers(), &state).await?;
    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth_user) = parts.extensions.get::<AuthUser>() {
            return Ok(auth_user.clone());
        }

        let auth_user = authenticate(&parts.headers, state).await?;
        parts.extensions.insert(auth_user.clone());
        Ok(auth_user)
    }
}
