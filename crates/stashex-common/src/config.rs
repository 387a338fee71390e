use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub const DEFAULT_LISTEN_ADDRESS: &str = ":8080";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
pub const HEALTH_PATH: &str = "/-/healthy";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_seconds: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout_secs(),
        }
    }
}

impl ExporterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Endpoints with surrounding whitespace removed; blank entries are dropped.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.trim())
            .filter(|endpoint| !endpoint.is_empty())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.endpoints().next().is_none() {
            return Err(ConfigError::NoEndpoints);
        }
        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let telemetry_path = self.web.telemetry_path.as_str();
        if !telemetry_path.starts_with('/') || telemetry_path == "/" || telemetry_path == HEALTH_PATH {
            return Err(ConfigError::InvalidTelemetryPath(
                self.web.telemetry_path.clone(),
            ));
        }
        self.web.bind_address()?;
        Ok(())
    }
}

impl WebConfig {
    /// Resolves `listen_address` into something a TCP listener accepts. A bare `:port`
    /// binds every interface.
    pub fn bind_address(&self) -> Result<String> {
        let address = self.listen_address.trim();
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidListenAddress(address.to_string()))?;

        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidListenAddress(address.to_string()));
        }

        if host.is_empty() {
            Ok(format!("0.0.0.0:{port}"))
        } else {
            Ok(address.to_string())
        }
    }
}

fn default_listen_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_telemetry_path() -> String {
    DEFAULT_TELEMETRY_PATH.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::error::ConfigError;

    use super::ExporterConfig;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ExporterConfig::from_yaml_str("endpoints:\n  - http://127.0.0.1:9600\n")
            .expect("config should parse");

        assert_eq!(config.endpoints().collect::<Vec<_>>(), vec!["http://127.0.0.1:9600"]);
        assert_eq!(config.web.bind_address().unwrap(), "0.0.0.0:8080");
        assert_eq!(config.web.telemetry_path, "/metrics");
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn blank_endpoints_are_skipped() {
        let raw = r#"
endpoints:
  - "  http://a:9600  "
  - ""
  - "   "
  - http://b:9600
web:
  listen_address: "127.0.0.1:9198"
http:
  timeout_seconds: 2
"#;
        let config = ExporterConfig::from_yaml_str(raw).expect("config should parse");

        assert_eq!(
            config.endpoints().collect::<Vec<_>>(),
            vec!["http://a:9600", "http://b:9600"]
        );
        assert_eq!(config.web.bind_address().unwrap(), "127.0.0.1:9198");
        assert_eq!(config.http_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn rejects_empty_endpoint_list() {
        let err = ExporterConfig::from_yaml_str("endpoints: [\" \"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::NoEndpoints));
    }

    #[test]
    fn rejects_bad_listen_address() {
        let raw = "endpoints: [http://a:9600]\nweb:\n  listen_address: nowhere\n";
        let err = ExporterConfig::from_yaml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidListenAddress(_)));
    }

    #[test]
    fn rejects_telemetry_path_taken_by_other_routes() {
        for path in ["/", "/-/healthy", "metrics"] {
            let raw = format!("endpoints: [\"http://a:9600\"]\nweb:\n  telemetry_path: \"{path}\"\n");
            let err = ExporterConfig::from_yaml_str(&raw).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTelemetryPath(ref rejected) if rejected == path));
        }
    }

    #[test]
    fn rejects_unknown_keys() {
        let raw = "endpoints: [http://a:9600]\nlisten: \":8080\"\n";
        let err = ExporterConfig::from_yaml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
