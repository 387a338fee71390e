use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{
    api::{NodeInfoResponse, NodeStatsResponse},
    error::{CollectError, Result},
};

pub const NODE_INFO_PATH: &str = "/_node";
pub const NODE_STATS_PATH: &str = "/_node/stats";

/// Shared transport for every configured instance.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(CollectError::Client)
}

/// Fetches and decodes snapshots from one node's monitoring API.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    base_url: String,
    client: reqwest::Client,
}

impl SnapshotClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub async fn node_info(&self) -> Result<NodeInfoResponse> {
        self.fetch(NODE_INFO_PATH).await
    }

    pub async fn node_stats(&self) -> Result<NodeStatsResponse> {
        self.fetch(NODE_STATS_PATH).await
    }

    pub async fn fetch<T: DeserializeOwned>(&self, sub_path: &str) -> Result<T> {
        let url = format!("{}{sub_path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| CollectError::Fetch {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::Status { url, status });
        }

        let body = response.bytes().await.map_err(|source| CollectError::Fetch {
            url: url.clone(),
            source,
        })?;
        decode_snapshot(&url, &body)
    }
}

/// Decodes a whole payload or nothing.
pub fn decode_snapshot<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| CollectError::Decode {
        url: url.to_string(),
        source,
    })
}
