use std::sync::Arc;

use axum::{Router, routing::get};
use stashex_collector::{
    CollectorAggregate, MetricDescriptor, MetricSample,
    aggregate::SCRAPE_SUBSYSTEM,
    metrics::{DescriptorRegistry, NAMESPACE},
};
use stashex_common::{ExporterConfig, config::HEALTH_PATH};
use tracing::{info, warn};

use crate::handlers;

pub struct ExporterState {
    pub aggregates: Vec<CollectorAggregate>,
    pub telemetry_path: String,
    build_info: Arc<MetricDescriptor>,
}

impl ExporterState {
    /// Builds one aggregate per configured endpoint. An endpoint that cannot be parsed is
    /// logged and left out; the others are still served.
    pub fn new(config: &ExporterConfig, http: reqwest::Client) -> stashex_collector::Result<Self> {
        let aggregates = config
            .endpoints()
            .filter_map(|endpoint| match CollectorAggregate::new(endpoint, http.clone()) {
                Ok(aggregate) => {
                    info!(endpoint, instance = aggregate.instance().label(), "monitoring instance");
                    Some(aggregate)
                }
                Err(err) => {
                    warn!(endpoint, error = %err, "skipping endpoint");
                    None
                }
            })
            .collect();

        Self::with_aggregates(aggregates, &config.web.telemetry_path)
    }

    pub fn with_aggregates(
        aggregates: Vec<CollectorAggregate>,
        telemetry_path: &str,
    ) -> stashex_collector::Result<Self> {
        let mut registry = DescriptorRegistry::new(NAMESPACE, SCRAPE_SUBSYSTEM);
        let build_info = registry.register(
            "build_info",
            "A metric with a constant '1' value labeled by the exporter version.",
            &["version"],
        )?;

        Ok(Self {
            aggregates,
            telemetry_path: telemetry_path.to_string(),
            build_info,
        })
    }

    pub fn build_info_sample(&self) -> MetricSample {
        MetricSample::gauge(&self.build_info, 1.0, &[env!("CARGO_PKG_VERSION")])
    }
}

pub fn exporter_router(state: Arc<ExporterState>) -> Router {
    let telemetry_path = state.telemetry_path.clone();
    Router::new()
        .route("/", get(handlers::health::landing))
        .route(HEALTH_PATH, get(handlers::health::healthy))
        .route(&telemetry_path, get(handlers::metrics::telemetry))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{Router, http::StatusCode, routing::get};
    use stashex_collector::{CollectorAggregate, build_http_client};
    use stashex_common::ExporterConfig;
    use tokio::net::TcpListener;

    use super::{ExporterState, exporter_router};

    const NODE_INFO: &str = r#"{"version": "8.12.0", "pipelines": {"main": {"workers": 2}}}"#;
    const NODE_STATS: &str = r#"{"jvm": {"threads": {"count": 12}}, "pipelines": {"main": {}}}"#;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn exporter() -> (String, String) {
        let node = serve(
            Router::new()
                .route("/_node", get(|| async { NODE_INFO }))
                .route("/_node/stats", get(|| async { NODE_STATS })),
        )
        .await;

        let http = build_http_client(Duration::from_secs(2)).unwrap();
        let aggregate = CollectorAggregate::new(&node, http).unwrap();
        let instance = aggregate.instance().label().to_string();
        let state = ExporterState::with_aggregates(vec![aggregate], "/metrics").unwrap();
        (serve(exporter_router(Arc::new(state))).await, instance)
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn telemetry_renders_every_family() {
        let (exporter, instance) = exporter().await;
        let response = client().get(format!("{exporter}/metrics")).send().await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/plain; version=0.0.4")
        );

        let body = response.text().await.unwrap();
        assert!(body.contains(&format!("logstash_info_node{{version=\"8.12.0\",instance=\"{instance}\"}} 1\n")));
        assert!(body.contains(&format!("logstash_node_jvm_threads_count{{instance=\"{instance}\"}} 12\n")));
        assert!(body.contains("# TYPE logstash_exporter_scrape_duration_seconds summary\n"));
        assert!(body.contains(&format!(
            "logstash_exporter_scrape_duration_seconds_count{{collector=\"node\",result=\"success\",instance=\"{instance}\"}} 1\n"
        )));
        assert!(body.contains(&format!(
            "logstash_exporter_build_info{{version=\"{}\"}} 1\n",
            env!("CARGO_PKG_VERSION")
        )));
    }

    #[tokio::test]
    async fn landing_page_redirects_to_telemetry() {
        let (exporter, _) = exporter().await;
        let response = client().get(format!("{exporter}/")).send().await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()["location"], "/metrics");
    }

    #[tokio::test]
    async fn health_endpoint_is_ok() {
        let (exporter, _) = exporter().await;
        let response = client().get(format!("{exporter}/-/healthy")).send().await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn unparseable_endpoints_are_skipped() {
        let config = ExporterConfig::from_yaml_str(
            "endpoints: [\"http://127.0.0.1:9600\", \"::broken\"]\n",
        )
        .unwrap();
        let http = build_http_client(Duration::from_secs(1)).unwrap();
        let state = ExporterState::new(&config, http).unwrap();

        assert_eq!(state.aggregates.len(), 1);
        assert_eq!(state.aggregates[0].instance().label(), "127.0.0.1:9600");
    }
}
