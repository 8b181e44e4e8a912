//! Custom tokens signed with the service account key.
//!
//! A custom token is not accepted by the API directly: a client exchanges it
//! with the identity provider for a regular ID token.

use classbase_config::ServiceAccountKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;

use crate::IdentityError;
use crate::claims::validate_uid;

pub const CUSTOM_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

const CUSTOM_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
pub struct CustomTokenClaims<'a> {
    pub iss: &'a str,
    pub sub: &'a str,
    pub aud: &'a str,
    pub iat: i64,
    pub exp: i64,
    pub uid: &'a str,
}

pub fn mint_custom_token(
    key: &ServiceAccountKey,
    uid: &str,
    now: i64,
) -> Result<String, IdentityError> {
    validate_uid(uid)?;

    let claims = CustomTokenClaims {
        iss: &key.client_email,
        sub: &key.client_email,
        aud: CUSTOM_TOKEN_AUDIENCE,
        iat: now,
        exp: now + CUSTOM_TOKEN_LIFETIME_SECS,
        uid,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| IdentityError::Credential(format!("unusable service account key: {e}")))?;

    encode(&header, &claims, &encoding_key).map_err(IdentityError::Signing)
}
