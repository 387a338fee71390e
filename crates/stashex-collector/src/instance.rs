use url::Url;

use crate::error::{CollectError, Result};

/// One monitored node: its endpoint and the `instance` label every sample for it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredInstance {
    base_url: String,
    label: String,
}

impl MonitoredInstance {
    pub fn parse(endpoint: &str) -> Result<Self> {
        let raw = endpoint.trim();
        let url = Url::parse(raw).map_err(|source| CollectError::InvalidEndpoint {
            endpoint: raw.to_string(),
            source,
        })?;

        Ok(Self {
            label: derive_instance_label(raw, &url),
            base_url: raw.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint as configured, without a trailing slash. API paths are appended to it.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// The authority exactly as configured, so a spelled-out default port such as `:80` is kept.
fn derive_instance_label(raw: &str, url: &Url) -> String {
    let Some(host) = url.host_str().filter(|host| !host.is_empty()) else {
        return raw.to_string();
    };

    let authority = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = authority.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);

    if authority.is_empty() {
        host.to_string()
    } else {
        authority.to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CollectError;

    use super::MonitoredInstance;

    #[test]
    fn label_is_host_and_port() {
        let instance = MonitoredInstance::parse("http://h1:9600").unwrap();
        assert_eq!(instance.label(), "h1:9600");
        assert_eq!(instance.base_url(), "http://h1:9600");
    }

    #[test]
    fn label_without_explicit_port_is_host_only() {
        let instance = MonitoredInstance::parse("https://logstash.internal/").unwrap();
        assert_eq!(instance.label(), "logstash.internal");
        assert_eq!(instance.base_url(), "https://logstash.internal");
    }

    #[test]
    fn default_port_written_out_is_kept() {
        assert_eq!(MonitoredInstance::parse("http://h1:80").unwrap().label(), "h1:80");
        assert_eq!(MonitoredInstance::parse("https://h1:443/").unwrap().label(), "h1:443");
        assert_eq!(MonitoredInstance::parse("http://user:pw@h1:9600/x").unwrap().label(), "h1:9600");
    }

    #[test]
    fn label_falls_back_to_raw_endpoint_without_host() {
        let instance = MonitoredInstance::parse("h1:9600").unwrap();
        assert_eq!(instance.label(), "h1:9600");
    }

    #[test]
    fn ipv6_hosts_keep_brackets() {
        let instance = MonitoredInstance::parse("http://[::1]:9600").unwrap();
        assert_eq!(instance.label(), "[::1]:9600");
    }

    #[test]
    fn malformed_endpoint_is_rejected() {
        let err = MonitoredInstance::parse("not a url").unwrap_err();
        assert!(matches!(err, CollectError::InvalidEndpoint { endpoint, .. } if endpoint == "not a url"));
    }
}
