use std::path::PathBuf;
use std::str::FromStr;

use crate::env_or;

/// Console output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Default level for this application's targets when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to daily rolling files in this directory
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            dir: None,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env_or("LOG_FORMAT", LogFormat::Compact),
            dir: std::env::var("LOG_DIR")
                .ok()
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
        }
    }
}
