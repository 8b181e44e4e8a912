use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::claims::{DecodedIdToken, NewIdentity, SignInResponse, UserRecord};
use crate::IdentityError;

/// Operations the application needs from the managed identity platform.
///
/// Implementations own all identity state; callers never cache what they get
/// back beyond the lifetime of a request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies an ID token and returns its payload.
    ///
    /// With `check_revoked`, the user's record is consulted as well: tokens of
    /// disabled users, and tokens authenticated before the user's refresh
    /// tokens were last revoked, are rejected.
    async fn verify_id_token(
        &self,
        token: &str,
        check_revoked: bool,
    ) -> Result<DecodedIdToken, IdentityError>;

    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError>;

    async fn create_user(&self, user: NewIdentity) -> Result<UserRecord, IdentityError>;

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError>;

    /// Replaces the custom claims of `uid`. They show up in ID tokens minted
    /// after the call.
    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), IdentityError>;

    /// Invalidates every refresh token of `uid`, and with it every ID token
    /// authenticated before now (for callers that check revocation).
    async fn revoke_refresh_tokens(&self, uid: &str) -> Result<(), IdentityError>;

    /// Mints a custom token a client can exchange for an ID token.
    async fn create_custom_token(&self, uid: &str) -> Result<String, IdentityError>;

    /// Exchanges a custom token for an ID token, as a client SDK would.
    async fn sign_in_with_custom_token(
        &self,
        custom_token: &str,
    ) -> Result<SignInResponse, IdentityError>;
}
