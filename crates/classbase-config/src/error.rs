use std::path::PathBuf;

/// Errors raised while assembling configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("failed to read service account file {path}: {source}")]
    ServiceAccountRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid service account file {path}: {source}")]
    ServiceAccountParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid rate limit settings for the {0} bucket")]
    RateLimit(&'static str),
}
