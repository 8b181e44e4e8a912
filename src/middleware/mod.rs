//! Request guards.
//!
//! - [`auth`]: bearer token verification ([`auth::require_auth`]) and the [`auth::AuthUser`] extractor
//! - [`role`]: role claim checks and role extractors such as [`role::RequireAdmin`]
//!
//! # Authentication Flow
//!
//! 1. Client sends `Authorization: Bearer <id token>`
//! 2. `require_auth` asks the identity provider to verify the token, with a
//!    revocation check, and stores the decoded identity in the request
//! 3. Role extractors compare the identity's `role` claim with the role the
//!    route declares
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::role::RequireAdmin;
//!
//! async fn delete_user(RequireAdmin(auth_user): RequireAdmin) -> impl IntoResponse {
//!     // Only executes for callers whose role claim is "admin"
//! }
//! ```

pub mod auth;
pub mod role;
