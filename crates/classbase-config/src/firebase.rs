//! Firebase (identity provider + document store) configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `GOOGLE_APPLICATION_CREDENTIALS` / `FIREBASE_SERVICE_ACCOUNT_PATH` | required | Service account JSON key |
//! | `FIREBASE_PROJECT_ID` | service account `project_id` | Project whose users and documents are served |
//! | `FIREBASE_API_KEY` | unset | Web API key, needed to exchange custom tokens |
//! | `FIREBASE_IDENTITY_TOOLKIT_URL` | `https://identitytoolkit.googleapis.com` | Identity Toolkit base URL |
//! | `FIREBASE_JWKS_URL` | securetoken JWKS | Public keys for ID token signatures |
//! | `FIRESTORE_URL` | `https://firestore.googleapis.com` | Firestore REST base URL |
//! | `FIRESTORE_DATABASE` | `(default)` | Firestore database id |
//! | `FIREBASE_OAUTH_TOKEN_URL` | service account `token_uri` | OAuth2 token endpoint |
//! | `FIREBASE_HTTP_TIMEOUT_SECS` | `10` | Timeout for every platform call |

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{ConfigError, env_or};

pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_DATABASE: &str = "(default)";

/// Service account key file, as downloaded from the Firebase console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_OAUTH_TOKEN_URL.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ServiceAccountRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ServiceAccountParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Clone, Debug)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub service_account: ServiceAccountKey,
    pub identity_toolkit_url: String,
    pub jwks_url: String,
    pub firestore_url: String,
    pub database: String,
    pub oauth_token_url: String,
    pub http_timeout_secs: u64,
}

impl FirebaseConfig {
    /// Builds a configuration pointing at the production endpoints.
    pub fn new(service_account: ServiceAccountKey) -> Self {
        Self {
            project_id: service_account.project_id.clone(),
            api_key: None,
            oauth_token_url: service_account.token_uri.clone(),
            service_account,
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            http_timeout_secs: 10,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("FIREBASE_SERVICE_ACCOUNT_PATH")
            .or_else(|_| std::env::var("GOOGLE_APPLICATION_CREDENTIALS"))
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("GOOGLE_APPLICATION_CREDENTIALS"))?;

        let mut config = Self::new(ServiceAccountKey::from_file(&path)?);

        if let Some(project_id) = non_empty_var("FIREBASE_PROJECT_ID") {
            config.project_id = project_id;
        }
        config.api_key = non_empty_var("FIREBASE_API_KEY");
        if let Some(url) = non_empty_var("FIREBASE_IDENTITY_TOOLKIT_URL") {
            config.identity_toolkit_url = url;
        }
        if let Some(url) = non_empty_var("FIREBASE_JWKS_URL") {
            config.jwks_url = url;
        }
        if let Some(url) = non_empty_var("FIRESTORE_URL") {
            config.firestore_url = url;
        }
        if let Some(database) = non_empty_var("FIRESTORE_DATABASE") {
            config.database = database;
        }
        if let Some(url) = non_empty_var("FIREBASE_OAUTH_TOKEN_URL") {
            config.oauth_token_url = url;
        }
        config.http_timeout_secs = env_or("FIREBASE_HTTP_TIMEOUT_SECS", config.http_timeout_secs);

        Ok(config)
    }

    /// Issuer every ID token of this project must carry.
    pub fn token_issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
