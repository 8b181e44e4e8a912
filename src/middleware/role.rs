//! Role-based authorization.
//!
//! A route declares the role it needs; the caller's `role` claim must equal
//! it. Routes that declare no role admit any authenticated caller.
//!
//! Two ways to enforce a role:
//! 1. Extractors generated with [`require_role!`](crate::require_role), e.g. [`RequireAdmin`]
//! 2. The [`check_role`] / [`check_any_role`] helpers inside a handler

use classbase_core::AppError;
use classbase_models::roles;

use crate::middleware::auth::AuthUser;

pub const FORBIDDEN: &str = "Forbidden resource";

/// Fails with 403 unless the caller's role claim equals `role`.
pub fn check_role(auth_user: &AuthUser, role: &str) -> Result<(), AppError> {
    check_any_role(auth_user, &[role])
}

/// Fails with 403 unless the caller's role claim equals one of `allowed`.
/// An empty list admits everyone.
pub fn check_any_role(auth_user: &AuthUser, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.is_empty() {
        return Ok(());
    }

    match auth_user.role() {
        Some(role) if allowed.contains(&role) => Ok(()),
        role => {
            tracing::warn!(uid = %auth_user.uid(), role = ?role, required = ?allowed, "Role check failed");
            Err(AppError::forbidden(FORBIDDEN))
        }
    }
}

/// Declares an extractor that authenticates the caller and then requires a
/// role.
///
/// ```rust,ignore
/// require_role!(RequireTeacher, "teacher");
///
/// async fn handler(RequireTeacher(auth_user): RequireTeacher) { /* ... */ }
/// ```
#[macro_export]
macro_rules! require_role {
    ($name:ident, $role:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = $crate::classbase_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                $crate::middleware::role::check_role(&auth_user, $role)?;
                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireAdmin, roles::ADMIN);
