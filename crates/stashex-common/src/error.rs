use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("no endpoints configured")]
    NoEndpoints,
    #[error("invalid listen address: {0}")]
    InvalidListenAddress(String),
    #[error("invalid telemetry path: {0}")]
    InvalidTelemetryPath(String),
    #[error("http timeout must be greater than zero")]
    ZeroTimeout,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
