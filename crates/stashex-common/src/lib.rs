pub mod config;
pub mod error;

pub use config::{ExporterConfig, HttpConfig, WebConfig};
pub use error::{ConfigError, Result};
