pub mod registry;
pub mod sink;
pub mod types;

pub use registry::{DescriptorRegistry, SummaryMetric};
pub use sink::{MetricReceiver, MetricSink, drain};
pub use types::{MetricDescriptor, MetricSample, MetricType, MetricValue, NAMESPACE, build_fq_name};
