use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    api::NodeInfoResponse,
    client::SnapshotClient,
    collectors::SampleBuffer,
    error::Result,
    metrics::{DescriptorRegistry, MetricDescriptor, MetricSample, MetricSink, NAMESPACE},
};

pub const SUBSYSTEM: &str = "info";

const PIPELINE: &[&str] = &["pipeline", "instance"];

struct NodeInfoMetrics {
    node: Arc<MetricDescriptor>,
    os: Arc<MetricDescriptor>,
    jvm: Arc<MetricDescriptor>,
    pipeline_workers: Arc<MetricDescriptor>,
    pipeline_batch_size: Arc<MetricDescriptor>,
    pipeline_batch_delay: Arc<MetricDescriptor>,
}

impl NodeInfoMetrics {
    fn register(registry: &mut DescriptorRegistry) -> Result<Self> {
        Ok(Self {
            node: registry.register(
                "node",
                "A metric with a constant '1' value labeled by the node version.",
                &["version", "instance"],
            )?,
            os: registry.register(
                "os",
                "A metric with a constant '1' value labeled by the host operating system.",
                &["name", "arch", "version", "available_processors", "instance"],
            )?,
            jvm: registry.register(
                "jvm",
                "A metric with a constant '1' value labeled by the JVM name, version and vendor.",
                &["name", "version", "vendor", "instance"],
            )?,
            pipeline_workers: registry.register(
                "pipeline_workers",
                "Number of worker threads configured for the pipeline.",
                PIPELINE,
            )?,
            pipeline_batch_size: registry.register(
                "pipeline_batch_size",
                "Maximum number of events a pipeline worker collects per batch.",
                PIPELINE,
            )?,
            pipeline_batch_delay: registry.register(
                "pipeline_batch_delay",
                "Milliseconds a pipeline worker waits for a batch to fill.",
                PIPELINE,
            )?,
        })
    }
}

/// Static node identity and pipeline settings from `/_node`.
pub struct NodeInfoCollector {
    client: SnapshotClient,
    instance: String,
    registry: DescriptorRegistry,
    metrics: NodeInfoMetrics,
}

impl NodeInfoCollector {
    pub fn new(client: SnapshotClient, instance: impl Into<String>) -> Result<Self> {
        let mut registry = DescriptorRegistry::new(NAMESPACE, SUBSYSTEM);
        let metrics = NodeInfoMetrics::register(&mut registry)?;

        Ok(Self {
            client,
            instance: instance.into(),
            registry,
            metrics,
        })
    }

    pub fn descriptors(&self) -> &[Arc<MetricDescriptor>] {
        self.registry.descriptors()
    }

    pub async fn collect(&self, sink: &MetricSink) -> Result<()> {
        let info = match self.client.node_info().await {
            Ok(info) => info,
            Err(err) => {
                error!(error = %err, "failed collecting node info metrics");
                return Err(err);
            }
        };

        let samples = self.project(&info);
        debug!(samples = samples.len(), version = %info.version, "projected node info");
        sink.emit_all(samples);
        Ok(())
    }

    pub fn project(&self, info: &NodeInfoResponse) -> Vec<MetricSample> {
        let m = &self.metrics;
        let mut out = SampleBuffer::new(&self.instance);

        out.counter(&m.node, 1.0, &[info.version.as_str()]);

        let os = &info.os;
        let processors = os.available_processors.to_string();
        out.counter(
            &m.os,
            1.0,
            &[os.name.as_str(), os.arch.as_str(), os.version.as_str(), processors.as_str()],
        );

        let jvm = &info.jvm;
        out.counter(
            &m.jvm,
            1.0,
            &[jvm.vm_name.as_str(), jvm.vm_version.as_str(), jvm.vm_vendor.as_str()],
        );

        for (pipeline_id, settings) in &info.pipelines {
            let labels = [pipeline_id.as_str()];
            out.gauge(&m.pipeline_workers, settings.workers, &labels);
            out.gauge(&m.pipeline_batch_size, settings.batch_size, &labels);
            out.gauge(&m.pipeline_batch_delay, settings.batch_delay, &labels);
        }

        out.into_samples()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::NodeInfoResponse,
        client::{SnapshotClient, build_http_client, decode_snapshot},
        metrics::MetricType,
    };

    use super::NodeInfoCollector;

    fn collector() -> NodeInfoCollector {
        let http = build_http_client(std::time::Duration::from_secs(1)).unwrap();
        NodeInfoCollector::new(SnapshotClient::new("http://h1:9600", http), "h1:9600").unwrap()
    }

    fn info(json: &str) -> NodeInfoResponse {
        decode_snapshot("test", json.as_bytes()).unwrap()
    }

    const NODE: &str = r#"{
        "host": "ls-1", "version": "8.12.0", "http_address": "127.0.0.1:9600",
        "pipelines": {
            "main": {"workers": 8, "batch_size": 125, "batch_delay": 50},
            "audit": {"workers": 1, "batch_size": 250, "batch_delay": 5}
        },
        "os": {"name": "Linux", "arch": "amd64", "version": "6.1.0", "available_processors": 8},
        "jvm": {"pid": 1, "version": "17.0.9", "vm_name": "OpenJDK 64-Bit Server VM", "vm_version": "17.0.9+9", "vm_vendor": "Eclipse Adoptium"}
    }"#;

    #[test]
    fn identity_metrics_carry_labels_and_constant_one() {
        let samples = collector().project(&info(NODE));
        let by_name = |name: &str| {
            samples
                .iter()
                .find(|sample| sample.name() == name)
                .unwrap_or_else(|| panic!("missing {name}"))
        };

        let node = by_name("logstash_info_node");
        assert_eq!(node.metric_type(), MetricType::Counter);
        assert_eq!(node.scalar(), Some(1.0));
        assert_eq!(node.label("version"), Some("8.12.0"));
        assert_eq!(node.label("instance"), Some("h1:9600"));

        let os = by_name("logstash_info_os");
        assert_eq!(
            os.labels().collect::<Vec<_>>(),
            vec![
                ("name", "Linux"),
                ("arch", "amd64"),
                ("version", "6.1.0"),
                ("available_processors", "8"),
                ("instance", "h1:9600"),
            ]
        );

        let jvm = by_name("logstash_info_jvm");
        assert_eq!(jvm.label("name"), Some("OpenJDK 64-Bit Server VM"));
        assert_eq!(jvm.label("version"), Some("17.0.9+9"));
        assert_eq!(jvm.label("vendor"), Some("Eclipse Adoptium"));
    }

    #[test]
    fn pipeline_settings_are_gauges_per_pipeline() {
        let samples = collector().project(&info(NODE));
        let workers = samples
            .iter()
            .filter(|sample| sample.name() == "logstash_info_pipeline_workers")
            .map(|sample| (sample.label("pipeline").unwrap(), sample.scalar().unwrap()))
            .collect::<Vec<_>>();

        assert_eq!(workers, vec![("audit", 1.0), ("main", 8.0)]);
        assert!(
            samples
                .iter()
                .filter(|sample| sample.name().starts_with("logstash_info_pipeline_"))
                .all(|sample| sample.metric_type() == MetricType::Gauge)
        );
        assert_eq!(samples.len(), 3 + 2 * 3);
    }

    #[test]
    fn sparse_payload_still_projects_identity() {
        let samples = collector().project(&info(r#"{"version": "7.17.0", "os": null}"#));

        assert_eq!(samples.len(), 3);
        let os = samples.iter().find(|sample| sample.name() == "logstash_info_os").unwrap();
        assert_eq!(os.label("name"), Some(""));
        assert_eq!(os.label("available_processors"), Some("0"));
    }

    #[test]
    fn descriptors_cover_projection() {
        let collector = collector();
        let samples = collector.project(&info(NODE));

        assert_eq!(collector.descriptors().len(), 6);
        for sample in &samples {
            assert!(
                collector
                    .descriptors()
                    .iter()
                    .any(|descriptor| descriptor.name == sample.name())
            );
        }
    }
}
