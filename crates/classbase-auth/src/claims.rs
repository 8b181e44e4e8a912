//! Identity types exchanged with the identity provider.
//!
//! - [`DecodedIdToken`]: the verified payload of a Firebase ID token
//! - [`UserRecord`]: an identity as stored by the provider
//! - [`NewIdentity`]: input for creating an identity
//! - [`SignInResponse`]: result of exchanging a custom token

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::IdentityError;

/// Custom claim carrying the user's role.
pub const ROLE_CLAIM: &str = "role";

/// Longest uid the provider accepts.
pub const MAX_UID_LENGTH: usize = 128;

/// Custom claims are capped at this many bytes once serialized.
pub const MAX_CLAIMS_PAYLOAD: usize = 1000;

/// Claim names the provider reserves for itself.
const RESERVED_CLAIMS: &[&str] = &[
    "acr", "amr", "at_hash", "aud", "auth_time", "azp", "cnf", "c_hash", "exp", "firebase", "iat",
    "iss", "jti", "nbf", "nonce", "sub",
];

/// Provider-specific section of an ID token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirebaseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default)]
    pub identities: Map<String, Value>,
}

/// Verified ID token payload.
///
/// Standard claims are typed; everything else, including custom claims such
/// as [`ROLE_CLAIM`], lands in `claims`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedIdToken {
    /// Same as `sub`; filled in after verification
    #[serde(default)]
    pub uid: String,
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub auth_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub firebase: FirebaseInfo,
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl DecodedIdToken {
    /// The role claim, if the identity carries one as a string.
    pub fn role(&self) -> Option<&str> {
        self.claims.get(ROLE_CLAIM).and_then(Value::as_str)
    }

    /// Checks the claims a signature check cannot: subject shape and
    /// timestamps that must not lie in the future.
    pub fn check_subject_and_times(&self, now: i64, leeway: i64) -> Result<(), IdentityError> {
        if self.sub.is_empty() {
            return Err(IdentityError::InvalidToken(
                "token has an empty \"sub\" claim".to_string(),
            ));
        }
        if self.sub.len() > MAX_UID_LENGTH {
            return Err(IdentityError::InvalidToken(
                "token has a \"sub\" claim longer than 128 characters".to_string(),
            ));
        }
        if self.iat > now + leeway {
            return Err(IdentityError::InvalidToken(
                "token was issued in the future".to_string(),
            ));
        }
        if self.auth_time > now + leeway {
            return Err(IdentityError::InvalidToken(
                "token has an \"auth_time\" in the future".to_string(),
            ));
        }
        Ok(())
    }
}

/// An identity as held by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub disabled: bool,
    pub custom_claims: Map<String, Value>,
    /// Tokens authenticated before this Unix time (seconds) are revoked
    pub tokens_valid_after: Option<i64>,
}

impl UserRecord {
    pub fn role(&self) -> Option<&str> {
        self.custom_claims.get(ROLE_CLAIM).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub id_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of the ID token in seconds
    pub expires_in: Option<u64>,
}

pub fn validate_uid(uid: &str) -> Result<(), IdentityError> {
    if uid.is_empty() || uid.len() > MAX_UID_LENGTH {
        return Err(IdentityError::InvalidUid(
            "uid must be a non-empty string with at most 128 characters".to_string(),
        ));
    }
    Ok(())
}

/// Serializes custom claims the way the provider stores them, rejecting
/// reserved names and oversized payloads.
pub fn encode_custom_claims(claims: &Map<String, Value>) -> Result<String, IdentityError> {
    if let Some(reserved) = claims.keys().find(|k| RESERVED_CLAIMS.contains(&k.as_str())) {
        return Err(IdentityError::InvalidClaims(format!(
            "claim \"{reserved}\" is reserved"
        )));
    }

    let payload = serde_json::to_string(claims)
        .map_err(|e| IdentityError::InvalidClaims(e.to_string()))?;
    if payload.len() > MAX_CLAIMS_PAYLOAD {
        return Err(IdentityError::InvalidClaims(format!(
            "claims payload must not exceed {MAX_CLAIMS_PAYLOAD} bytes"
        )));
    }
    Ok(payload)
}

/// Builds the `{ "role": <role> }` claim set.
pub fn role_claims(role: &str) -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert(ROLE_CLAIM.to_string(), Value::String(role.to_string()));
    claims
}
