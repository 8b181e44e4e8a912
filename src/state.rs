use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use classbase_auth::credentials::http_client;
use classbase_auth::{AccessTokenSource, FirebaseIdentity, IdentityProvider};
use classbase_config::{CorsConfig, FirebaseConfig, RateLimitConfig};
use classbase_store::{DocumentStore, FirestoreStore};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("cors_config", &self.cors_config)
            .field("rate_limit_config", &self.rate_limit_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State over the given providers with default CORS and no rate limits,
    /// for callers that do not serve with peer addresses (tools, tests).
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            identity,
            store,
            cors_config: CorsConfig::default(),
            rate_limit_config: RateLimitConfig::disabled(),
        }
    }
}

/// Builds the production state: Firebase Authentication and Firestore
/// clients sharing one HTTP client and one OAuth2 token source.
pub fn init_app_state(firebase: &FirebaseConfig) -> anyhow::Result<AppState> {
    let http = http_client(firebase.http_timeout_secs).context("Failed to build HTTP client")?;
    let tokens = Arc::new(AccessTokenSource::service_account(
        http.clone(),
        firebase.service_account.clone(),
        firebase.oauth_token_url.clone(),
    ));

    let identity = FirebaseIdentity::new(firebase.clone(), http.clone(), tokens.clone());
    let store = FirestoreStore::new(firebase, http, tokens);

    Ok(AppState {
        identity: Arc::new(identity),
        store: Arc::new(store),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
    })
}
