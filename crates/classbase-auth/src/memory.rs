//! In-process identity provider.
//!
//! Mirrors the observable behavior of the managed provider closely enough to
//! drive the HTTP layer in tests: ID tokens snapshot the user's claims at
//! issuance, and revoking refresh tokens invalidates every token issued
//! before the revocation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::claims::{
    DecodedIdToken, FirebaseInfo, NewIdentity, SignInResponse, UserRecord, encode_custom_claims,
    role_claims, validate_uid,
};
use crate::{IdentityError, IdentityProvider};

const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug)]
struct MemoryUser {
    record: UserRecord,
    /// Bumped on every revocation; tokens remember the value they were issued under
    generation: u64,
}

#[derive(Debug)]
struct IssuedToken {
    decoded: DecodedIdToken,
    generation: u64,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, MemoryUser>,
    id_tokens: HashMap<String, IssuedToken>,
    custom_tokens: HashMap<String, String>,
}

#[derive(Debug)]
pub struct MemoryIdentity {
    project_id: String,
    state: RwLock<State>,
}

impl MemoryIdentity {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            state: RwLock::new(State::default()),
        }
    }

    /// Seeds a user, optionally carrying a role claim.
    pub async fn insert_user(&self, uid: &str, email: &str, role: Option<&str>) -> UserRecord {
        let record = UserRecord {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            display_name: None,
            disabled: false,
            custom_claims: role.map(role_claims).unwrap_or_default(),
            tokens_valid_after: None,
        };
        self.state.write().await.users.insert(
            uid.to_string(),
            MemoryUser {
                record: record.clone(),
                generation: 0,
            },
        );
        record
    }

    pub async fn disable_user(&self, uid: &str) -> Result<(), IdentityError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        user.record.disabled = true;
        Ok(())
    }

    /// Issues an ID token carrying the user's current custom claims.
    pub async fn issue_id_token(&self, uid: &str) -> Result<String, IdentityError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;

        let now = Utc::now().timestamp();
        let decoded = DecodedIdToken {
            uid: uid.to_string(),
            sub: uid.to_string(),
            aud: self.project_id.clone(),
            iss: format!("https://securetoken.google.com/{}", self.project_id),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
            auth_time: now,
            email: user.record.email.clone(),
            email_verified: Some(false),
            firebase: FirebaseInfo {
                sign_in_provider: Some("custom".to_string()),
                tenant: None,
                identities: Map::new(),
            },
            claims: user.record.custom_claims.clone(),
        };
        let generation = user.generation;

        let token = format!("memory-id-token-{}", Uuid::new_v4().simple());
        state
            .id_tokens
            .insert(token.clone(), IssuedToken { decoded, generation });
        Ok(token)
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// ID tokens still held, revoked ones included.
    pub async fn issued_token_count(&self) -> usize {
        self.state.read().await.id_tokens.len()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn verify_id_token(
        &self,
        token: &str,
        check_revoked: bool,
    ) -> Result<DecodedIdToken, IdentityError> {
        let state = self.state.read().await;
        let issued = state
            .id_tokens
            .get(token)
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))?;

        if issued.decoded.exp < Utc::now().timestamp() {
            return Err(IdentityError::InvalidToken("token has expired".to_string()));
        }

        if check_revoked {
            let user = state
                .users
                .get(&issued.decoded.uid)
                .ok_or_else(|| IdentityError::UserNotFound(issued.decoded.uid.clone()))?;
            if user.record.disabled {
                return Err(IdentityError::UserDisabled(user.record.uid.clone()));
            }
            if issued.generation < user.generation {
                return Err(IdentityError::TokenRevoked);
            }
        }

        Ok(issued.decoded.clone())
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError> {
        validate_uid(uid)?;
        self.state
            .read()
            .await
            .users
            .get(uid)
            .map(|u| u.record.clone())
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    async fn create_user(&self, user: NewIdentity) -> Result<UserRecord, IdentityError> {
        let mut state = self.state.write().await;
        let taken = state
            .users
            .values()
            .any(|u| u.record.email.as_deref() == Some(user.email.as_str()));
        if taken {
            return Err(IdentityError::Api {
                endpoint: "accounts".into(),
                status: 400,
                body: r#"{"error":{"code":400,"message":"EMAIL_EXISTS"}}"#.into(),
            });
        }

        let record = UserRecord {
            uid: Uuid::new_v4().simple().to_string(),
            email: Some(user.email),
            display_name: Some(user.display_name),
            disabled: false,
            custom_claims: Map::new(),
            tokens_valid_after: None,
        };
        state.users.insert(
            record.uid.clone(),
            MemoryUser {
                record: record.clone(),
                generation: 0,
            },
        );
        Ok(record)
    }

    /// Also forgets every ID token and unused custom token of the user.
    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        validate_uid(uid)?;
        let mut state = self.state.write().await;
        state
            .users
            .remove(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        state.id_tokens.retain(|_, issued| issued.decoded.uid != uid);
        state.custom_tokens.retain(|_, owner| owner.as_str() != uid);
        Ok(())
    }

    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), IdentityError> {
        validate_uid(uid)?;
        encode_custom_claims(claims)?;

        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        user.record.custom_claims = claims.clone();
        Ok(())
    }

    async fn revoke_refresh_tokens(&self, uid: &str) -> Result<(), IdentityError> {
        validate_uid(uid)?;
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        user.generation += 1;
        user.record.tokens_valid_after = Some(Utc::now().timestamp());
        Ok(())
    }

    async fn create_custom_token(&self, uid: &str) -> Result<String, IdentityError> {
        validate_uid(uid)?;
        let token = format!("memory-custom-token-{}", Uuid::new_v4().simple());
        self.state
            .write()
            .await
            .custom_tokens
            .insert(token.clone(), uid.to_string());
        Ok(token)
    }

    async fn sign_in_with_custom_token(
        &self,
        custom_token: &str,
    ) -> Result<SignInResponse, IdentityError> {
        let uid = self
            .state
            .write()
            .await
            .custom_tokens
            .remove(custom_token)
            .ok_or_else(|| IdentityError::Api {
                endpoint: "accounts:signInWithCustomToken".into(),
                status: 400,
                body: r#"{"error":{"code":400,"message":"INVALID_CUSTOM_TOKEN"}}"#.into(),
            })?;

        // Signing in with a custom token for an unknown uid creates the account.
        if self.get_user(&uid).await.is_err() {
            self.state.write().await.users.insert(
                uid.clone(),
                MemoryUser {
                    record: UserRecord {
                        uid: uid.clone(),
                        email: None,
                        display_name: None,
                        disabled: false,
                        custom_claims: Map::new(),
                        tokens_valid_after: None,
                    },
                    generation: 0,
                },
            );
        }

        Ok(SignInResponse {
            id_token: self.issue_id_token(&uid).await?,
            refresh_token: Some(format!("memory-refresh-token-{}", Uuid::new_v4().simple())),
            expires_in: Some(TOKEN_LIFETIME_SECS as u64),
        })
    }
}
