//! OAuth2 access tokens for the platform's admin APIs.
//!
//! Admin endpoints (user management, Firestore) require a Google OAuth2
//! access token. It is obtained with the JWT-bearer grant: a short-lived
//! assertion signed with the service account key is posted to the token
//! endpoint. The returned token is reused until shortly before it expires.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use classbase_config::ServiceAccountKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::IdentityError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform \
https://www.googleapis.com/auth/datastore \
https://www.googleapis.com/auth/firebase \
https://www.googleapis.com/auth/identitytoolkit \
https://www.googleapis.com/auth/userinfo.email";

/// Lifetime requested for each assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before their stated expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    refresh_at: i64,
}

enum Source {
    ServiceAccount {
        http: reqwest::Client,
        key: ServiceAccountKey,
        token_url: String,
        cached: Mutex<Option<CachedToken>>,
    },
    Fixed(String),
}

/// Supplies bearer tokens for admin API calls.
pub struct AccessTokenSource {
    source: Source,
}

impl fmt::Debug for AccessTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::ServiceAccount { key, token_url, .. } => f
                .debug_struct("AccessTokenSource")
                .field("client_email", &key.client_email)
                .field("token_url", token_url)
                .finish_non_exhaustive(),
            Source::Fixed(_) => f.debug_struct("AccessTokenSource").finish_non_exhaustive(),
        }
    }
}

impl AccessTokenSource {
    pub fn service_account(
        http: reqwest::Client,
        key: ServiceAccountKey,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            source: Source::ServiceAccount {
                http,
                key,
                token_url: token_url.into(),
                cached: Mutex::new(None),
            },
        }
    }

    /// A source that always hands out the same token (emulators, tests).
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: Source::Fixed(token.into()),
        }
    }

    pub async fn access_token(&self) -> Result<String, IdentityError> {
        match &self.source {
            Source::Fixed(token) => Ok(token.clone()),
            Source::ServiceAccount {
                http,
                key,
                token_url,
                cached,
            } => {
                let mut cached = cached.lock().await;
                let now = Utc::now().timestamp();
                if let Some(token) = cached.as_ref().filter(|t| t.refresh_at > now) {
                    return Ok(token.value.clone());
                }

                let fresh = fetch_token(http, key, token_url, now).await?;
                let value = fresh.value.clone();
                *cached = Some(fresh);
                Ok(value)
            }
        }
    }
}

/// Signs the JWT-bearer assertion for `key`.
pub fn sign_assertion(
    key: &ServiceAccountKey,
    audience: &str,
    now: i64,
) -> Result<String, IdentityError> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: SCOPES,
        aud: audience,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| IdentityError::Credential(format!("unusable service account key: {e}")))?;

    encode(&header, &claims, &encoding_key).map_err(IdentityError::Signing)
}

async fn fetch_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
    token_url: &str,
    now: i64,
) -> Result<CachedToken, IdentityError> {
    let assertion = sign_assertion(key, token_url, now)?;

    let response = http
        .post(token_url)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|source| IdentityError::Http {
            endpoint: "oauth2/token".into(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IdentityError::Credential(format!(
            "token endpoint returned {}: {body}",
            status.as_u16()
        )));
    }

    let token: TokenResponse = response.json().await.map_err(|source| IdentityError::Http {
        endpoint: "oauth2/token".into(),
        source,
    })?;

    debug!(expires_in = token.expires_in, "Obtained platform access token");

    Ok(CachedToken {
        value: token.access_token,
        refresh_at: now + token.expires_in - EXPIRY_MARGIN_SECS,
    })
}

/// HTTP client shared by the platform clients.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, IdentityError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|source| IdentityError::Http {
            endpoint: "client_init".into(),
            source,
        })
}
