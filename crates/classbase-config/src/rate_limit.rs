use governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::{ConfigError, env_flag, env_or};

pub type PeerIpGovernorConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Rate limit configuration for the API
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Limits need the peer address; disabled when serving without connect info
    pub enabled: bool,
    /// Requests per second for general endpoints
    pub general_per_second: u64,
    /// Burst size for general endpoints
    pub general_burst_size: u32,
    /// Requests per second for the unauthenticated token endpoints (stricter)
    pub auth_per_second: u64,
    /// Burst size for the unauthenticated token endpoints (stricter)
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 2,
            general_burst_size: 30,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Create GovernorConfig for general API endpoints
    pub fn general_governor_config(&self) -> Result<PeerIpGovernorConfig, ConfigError> {
        GovernorConfigBuilder::default()
            .per_second(self.general_per_second)
            .burst_size(self.general_burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .ok_or(ConfigError::RateLimit("general"))
    }

    /// Create GovernorConfig for the token endpoints (stricter limits)
    pub fn auth_governor_config(&self) -> Result<PeerIpGovernorConfig, ConfigError> {
        GovernorConfigBuilder::default()
            .per_second(self.auth_per_second)
            .burst_size(self.auth_burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .ok_or(ConfigError::RateLimit("auth"))
    }
}
