//! # Classbase Config
//!
//! Configuration types for the Classbase API, each loaded from environment
//! variables through a `from_env()` constructor:
//!
//! - [`firebase`]: project, service account and endpoint settings for the managed platform
//! - [`server`]: listen address and metrics toggle
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`rate_limit`]: API rate limiting configuration
//! - [`logging`]: log level, format and optional file output
//!
//! # Example
//!
//! ```ignore
//! use classbase_config::{CorsConfig, FirebaseConfig, RateLimitConfig, ServerConfig};
//!
//! let firebase = FirebaseConfig::from_env()?;
//! let server = ServerConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

pub mod cors;
pub mod error;
pub mod firebase;
pub mod logging;
pub mod rate_limit;
pub mod server;

pub use cors::CorsConfig;
pub use error::ConfigError;
pub use firebase::{FirebaseConfig, ServiceAccountKey};
pub use logging::{LogConfig, LogFormat};
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

/// Reads an environment variable and parses it, falling back to `default`
/// when the variable is unset or unparsable.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Reads a boolean flag; anything other than `false`/`0` counts as enabled.
pub(crate) fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(default)
}
