//! Firebase Authentication over its REST APIs.
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | verify ID token | local RS256 check against the securetoken JWKS |
//! | get user | `POST /v1/projects/{project}/accounts:lookup` |
//! | create user | `POST /v1/projects/{project}/accounts` |
//! | delete user | `POST /v1/projects/{project}/accounts:delete` |
//! | set claims / revoke | `POST /v1/projects/{project}/accounts:update` |
//! | exchange custom token | `POST /v1/accounts:signInWithCustomToken?key={api key}` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use classbase_config::FirebaseConfig;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::claims::{
    DecodedIdToken, NewIdentity, SignInResponse, UserRecord, encode_custom_claims, validate_uid,
};
use crate::credentials::AccessTokenSource;
use crate::custom_token::mint_custom_token;
use crate::keys::PublicKeyCache;
use crate::{IdentityError, IdentityProvider};

/// Clock skew tolerated on token timestamps, in seconds.
const CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    custom_attributes: Option<String>,
    /// Seconds since the epoch, as a decimal string
    #[serde(default)]
    valid_since: Option<String>,
}

impl AccountInfo {
    fn into_record(self) -> UserRecord {
        let custom_claims = self
            .custom_attributes
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Map<String, Value>>(raw).ok())
            .unwrap_or_default();

        UserRecord {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name,
            disabled: self.disabled,
            custom_claims,
            tokens_valid_after: self.valid_since.and_then(|s| s.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    local_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithCustomTokenResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug)]
pub struct FirebaseIdentity {
    http: reqwest::Client,
    config: FirebaseConfig,
    tokens: Arc<AccessTokenSource>,
    keys: PublicKeyCache,
}

impl FirebaseIdentity {
    pub fn new(config: FirebaseConfig, http: reqwest::Client, tokens: Arc<AccessTokenSource>) -> Self {
        let keys = PublicKeyCache::new(http.clone(), config.jwks_url.clone());
        Self {
            http,
            config,
            tokens,
            keys,
        }
    }

    fn accounts_url(&self, action: &str) -> String {
        format!(
            "{}/v1/projects/{}/accounts{}",
            self.config.identity_toolkit_url.trim_end_matches('/'),
            self.config.project_id,
            action
        )
    }

    /// Authenticated call to an Identity Toolkit admin endpoint.
    async fn admin_post<T: DeserializeOwned>(
        &self,
        action: &str,
        body: &Value,
    ) -> Result<T, IdentityError> {
        let endpoint = format!("accounts{action}");
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(self.accounts_url(action))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|source| IdentityError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        read_json(response, endpoint).await
    }

    async fn update_account(&self, body: Value) -> Result<(), IdentityError> {
        let _: Value = self.admin_post(":update", &body).await?;
        Ok(())
    }

    fn decode_token(&self, token: &str, key: &jsonwebtoken::DecodingKey) -> Result<DecodedIdToken, IdentityError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_SECS as u64;
        validation.set_audience(&[self.config.project_id.as_str()]);
        validation.set_issuer(&[self.config.token_issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let data = decode::<DecodedIdToken>(token, key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[instrument(skip(self, token))]
    async fn verify_id_token(
        &self,
        token: &str,
        check_revoked: bool,
    ) -> Result<DecodedIdToken, IdentityError> {
        let header =
            decode_header(token).map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!(
                "expected RS256 signature, found {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("token has no \"kid\" header".to_string()))?;

        let key = self.keys.decoding_key(&kid).await?;
        let mut decoded = self.decode_token(token, &key)?;
        decoded.check_subject_and_times(Utc::now().timestamp(), CLOCK_SKEW_SECS)?;
        decoded.uid = decoded.sub.clone();

        if check_revoked {
            let user = self.get_user(&decoded.uid).await?;
            if user.disabled {
                return Err(IdentityError::UserDisabled(user.uid));
            }
            if user
                .tokens_valid_after
                .is_some_and(|valid_after| decoded.auth_time < valid_after)
            {
                return Err(IdentityError::TokenRevoked);
            }
        }

        Ok(decoded)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError> {
        validate_uid(uid)?;
        let response: LookupResponse = self
            .admin_post(":lookup", &json!({ "localId": [uid] }))
            .await
            .map_err(|e| not_found_as(e, uid))?;

        response
            .users
            .into_iter()
            .next()
            .map(AccountInfo::into_record)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewIdentity) -> Result<UserRecord, IdentityError> {
        let created: CreateResponse = self
            .admin_post(
                "",
                &json!({ "email": user.email, "displayName": user.display_name }),
            )
            .await?;

        debug!(uid = %created.local_id, "Created identity");

        Ok(UserRecord {
            uid: created.local_id,
            email: Some(user.email),
            display_name: Some(user.display_name),
            disabled: false,
            custom_claims: Map::new(),
            tokens_valid_after: None,
        })
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        validate_uid(uid)?;
        let _: Value = self
            .admin_post(":delete", &json!({ "localId": uid }))
            .await
            .map_err(|e| not_found_as(e, uid))?;
        Ok(())
    }

    #[instrument(skip(self, claims))]
    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), IdentityError> {
        validate_uid(uid)?;
        let payload = encode_custom_claims(claims)?;
        self.update_account(json!({ "localId": uid, "customAttributes": payload }))
            .await
            .map_err(|e| not_found_as(e, uid))
    }

    #[instrument(skip(self))]
    async fn revoke_refresh_tokens(&self, uid: &str) -> Result<(), IdentityError> {
        validate_uid(uid)?;
        let valid_since = Utc::now().timestamp().to_string();
        self.update_account(json!({ "localId": uid, "validSince": valid_since }))
            .await
            .map_err(|e| not_found_as(e, uid))
    }

    #[instrument(skip(self))]
    async fn create_custom_token(&self, uid: &str) -> Result<String, IdentityError> {
        mint_custom_token(&self.config.service_account, uid, Utc::now().timestamp())
    }

    #[instrument(skip(self, custom_token))]
    async fn sign_in_with_custom_token(
        &self,
        custom_token: &str,
    ) -> Result<SignInResponse, IdentityError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| IdentityError::Config("FIREBASE_API_KEY is not set".to_string()))?;

        let endpoint = "accounts:signInWithCustomToken".to_string();
        let url = format!(
            "{}/v1/accounts:signInWithCustomToken",
            self.config.identity_toolkit_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(url)
            .query(&[("key", api_key)])
            .json(&json!({ "token": custom_token, "returnSecureToken": true }))
            .send()
            .await
            .map_err(|source| IdentityError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let signed_in: SignInWithCustomTokenResponse = read_json(response, endpoint).await?;

        Ok(SignInResponse {
            id_token: signed_in.id_token,
            refresh_token: signed_in.refresh_token,
            expires_in: signed_in.expires_in.and_then(|s| s.parse().ok()),
        })
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: String,
) -> Result<T, IdentityError> {
    let status = response.status();
    if !status.is_success() {
        return Err(IdentityError::Api {
            endpoint,
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    response
        .json()
        .await
        .map_err(|source| IdentityError::Http { endpoint, source })
}

/// Identity Toolkit reports unknown users as `{"error": {"message": "USER_NOT_FOUND"}}`.
fn not_found_as(error: IdentityError, uid: &str) -> IdentityError {
    match error {
        IdentityError::Api { ref body, .. } if body.contains("USER_NOT_FOUND") => {
            IdentityError::UserNotFound(uid.to_string())
        }
        other => other,
    }
}
