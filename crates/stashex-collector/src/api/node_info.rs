use std::collections::BTreeMap;

use serde::Deserialize;

use super::nullable;

/// `GET /_node`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeInfoResponse {
    #[serde(deserialize_with = "nullable")]
    pub host: String,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub http_address: String,
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    pub snapshot: bool,
    #[serde(deserialize_with = "nullable")]
    pub pipelines: BTreeMap<String, PipelineSettings>,
    #[serde(deserialize_with = "nullable")]
    pub os: OsInfo,
    #[serde(deserialize_with = "nullable")]
    pub jvm: JvmInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub workers: f64,
    pub batch_size: f64,
    pub batch_delay: f64,
    pub config_reload_automatic: bool,
    pub dead_letter_queue_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OsInfo {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub arch: String,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    pub available_processors: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmInfo {
    pub pid: u32,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub vm_name: String,
    #[serde(deserialize_with = "nullable")]
    pub vm_version: String,
    #[serde(deserialize_with = "nullable")]
    pub vm_vendor: String,
    pub start_time_in_millis: f64,
}
