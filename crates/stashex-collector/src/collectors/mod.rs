pub mod node_info;
pub mod node_stats;

use std::sync::Arc;

pub use node_info::NodeInfoCollector;
pub use node_stats::NodeStatsCollector;

use crate::{
    error::Result,
    metrics::{MetricDescriptor, MetricSample, MetricSink},
};

/// The fixed set of snapshot collectors an aggregate can own.
pub enum SubCollector {
    Stats(NodeStatsCollector),
    Info(NodeInfoCollector),
}

impl SubCollector {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stats(_) => node_stats::SUBSYSTEM,
            Self::Info(_) => node_info::SUBSYSTEM,
        }
    }

    pub fn descriptors(&self) -> &[Arc<MetricDescriptor>] {
        match self {
            Self::Stats(collector) => collector.descriptors(),
            Self::Info(collector) => collector.descriptors(),
        }
    }

    pub async fn collect(&self, sink: &MetricSink) -> Result<()> {
        match self {
            Self::Stats(collector) => collector.collect(sink).await,
            Self::Info(collector) => collector.collect(sink).await,
        }
    }
}

pub(crate) fn millis_to_seconds(millis: f64) -> f64 {
    millis / 1000.0
}

/// Accumulates projected samples, appending the instance label last.
pub(crate) struct SampleBuffer<'a> {
    instance: &'a str,
    samples: Vec<MetricSample>,
}

impl<'a> SampleBuffer<'a> {
    pub(crate) fn new(instance: &'a str) -> Self {
        Self {
            instance,
            samples: Vec::new(),
        }
    }

    pub(crate) fn counter(&mut self, descriptor: &Arc<MetricDescriptor>, value: f64, labels: &[&str]) {
        let labels = self.with_instance(labels);
        self.samples.push(MetricSample::counter(descriptor, value, &labels));
    }

    pub(crate) fn gauge(&mut self, descriptor: &Arc<MetricDescriptor>, value: f64, labels: &[&str]) {
        let labels = self.with_instance(labels);
        self.samples.push(MetricSample::gauge(descriptor, value, &labels));
    }

    pub(crate) fn into_samples(self) -> Vec<MetricSample> {
        self.samples
    }

    fn with_instance<'b>(&self, labels: &[&'b str]) -> Vec<&'b str>
    where
        'a: 'b,
    {
        let mut values = Vec::with_capacity(labels.len() + 1);
        values.extend_from_slice(labels);
        values.push(self.instance);
        values
    }
}
