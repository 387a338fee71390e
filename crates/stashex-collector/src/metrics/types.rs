use std::sync::Arc;

/// Process-wide metric namespace shared by every family this exporter emits.
pub const NAMESPACE: &str = "logstash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Summary,
}

impl MetricType {
    pub fn as_prometheus_type(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub variable_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter(f64),
    Gauge(f64),
    Summary { count: u64, sum: f64 },
}

impl MetricValue {
    pub fn metric_type(&self) -> MetricType {
        match self {
            Self::Counter(_) => MetricType::Counter,
            Self::Gauge(_) => MetricType::Gauge,
            Self::Summary { .. } => MetricType::Summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub descriptor: Arc<MetricDescriptor>,
    pub value: MetricValue,
    pub label_values: Vec<String>,
}

impl MetricSample {
    pub fn new(descriptor: &Arc<MetricDescriptor>, value: MetricValue, label_values: &[&str]) -> Self {
        debug_assert_eq!(
            descriptor.variable_labels.len(),
            label_values.len(),
            "label arity mismatch for {}",
            descriptor.name
        );

        Self {
            descriptor: Arc::clone(descriptor),
            value,
            label_values: label_values.iter().map(|value| (*value).to_string()).collect(),
        }
    }

    pub fn counter(descriptor: &Arc<MetricDescriptor>, value: f64, label_values: &[&str]) -> Self {
        Self::new(descriptor, MetricValue::Counter(value), label_values)
    }

    pub fn gauge(descriptor: &Arc<MetricDescriptor>, value: f64, label_values: &[&str]) -> Self {
        Self::new(descriptor, MetricValue::Gauge(value), label_values)
    }

    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.descriptor
            .variable_labels
            .iter()
            .position(|label| label == name)
            .and_then(|index| self.label_values.get(index))
            .map(String::as_str)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.descriptor
            .variable_labels
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Scalar value of a counter or gauge sample; `None` for summaries.
    pub fn scalar(&self) -> Option<f64> {
        match self.value {
            MetricValue::Counter(value) | MetricValue::Gauge(value) => Some(value),
            MetricValue::Summary { .. } => None,
        }
    }
}

/// Joins the non-empty name parts with `_`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{MetricDescriptor, MetricSample, MetricType, build_fq_name};

    #[test]
    fn fq_name_skips_empty_parts() {
        assert_eq!(build_fq_name("logstash", "node", "queue_events"), "logstash_node_queue_events");
        assert_eq!(build_fq_name("logstash", "", "up"), "logstash_up");
    }

    #[test]
    fn sample_labels_follow_descriptor_order() {
        let descriptor = Arc::new(MetricDescriptor {
            name: "logstash_node_mem_pool_used_bytes".to_string(),
            help: "used".to_string(),
            variable_labels: vec!["pool".to_string(), "instance".to_string()],
        });
        let sample = MetricSample::gauge(&descriptor, 3.0, &["old", "h1:9600"]);

        assert_eq!(sample.metric_type(), MetricType::Gauge);
        assert_eq!(sample.label("pool"), Some("old"));
        assert_eq!(sample.label("instance"), Some("h1:9600"));
        assert_eq!(sample.label("pipeline"), None);
        assert_eq!(
            sample.labels().collect::<Vec<_>>(),
            vec![("pool", "old"), ("instance", "h1:9600")]
        );
    }
}
