//! Public keys used to check ID token signatures.
//!
//! The key set is fetched from the provider's JWKS endpoint and kept until the
//! `max-age` of its `Cache-Control` header runs out.

use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use reqwest::header::CACHE_CONTROL;
use tokio::sync::RwLock;
use tracing::debug;

use crate::IdentityError;

/// Used when the endpoint does not say how long its keys stay valid.
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);

struct CachedKeys {
    keys: JwkSet,
    expires_at: Instant,
}

pub struct PublicKeyCache {
    http: reqwest::Client,
    url: String,
    cached: RwLock<Option<CachedKeys>>,
}

impl std::fmt::Debug for PublicKeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKeyCache")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl PublicKeyCache {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            cached: RwLock::new(None),
        }
    }

    /// Returns the decoding key for `kid`, refreshing the key set if it expired.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        {
            let cached = self.cached.read().await;
            if let Some(cached) = cached.as_ref().filter(|c| c.expires_at > Instant::now()) {
                return key_for(&cached.keys, kid);
            }
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(current) = cached.as_ref().filter(|c| c.expires_at > Instant::now()) {
            return key_for(&current.keys, kid);
        }

        let fresh = self.fetch().await?;
        let key = key_for(&fresh.keys, kid);
        *cached = Some(fresh);
        key
    }

    async fn fetch(&self) -> Result<CachedKeys, IdentityError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|source| IdentityError::Http {
                endpoint: "jwks".into(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Api {
                endpoint: "jwks".into(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let max_age = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_MAX_AGE);

        let keys: JwkSet = response.json().await.map_err(|source| IdentityError::Http {
            endpoint: "jwks".into(),
            source,
        })?;

        debug!(keys = keys.keys.len(), max_age_secs = max_age.as_secs(), "Fetched token signing keys");

        Ok(CachedKeys {
            keys,
            expires_at: Instant::now() + max_age,
        })
    }
}

fn key_for(keys: &JwkSet, kid: &str) -> Result<DecodingKey, IdentityError> {
    let jwk = keys.find(kid).ok_or_else(|| {
        IdentityError::InvalidToken(format!("no signing key matches kid \"{kid}\""))
    })?;
    DecodingKey::from_jwk(jwk)
        .map_err(|e| IdentityError::InvalidToken(format!("unusable signing key: {e}")))
}

/// Extracts `max-age` from a `Cache-Control` header value.
pub fn parse_max_age(header: &str) -> Option<Duration> {
    header
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
