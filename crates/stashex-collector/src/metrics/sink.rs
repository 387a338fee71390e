use tokio::sync::mpsc;
use tracing::trace;

use crate::metrics::types::MetricSample;

/// Producer side of the sample channel. Cloned into every collector task of a scrape.
#[derive(Debug, Clone)]
pub struct MetricSink {
    sender: mpsc::UnboundedSender<MetricSample>,
}

pub type MetricReceiver = mpsc::UnboundedReceiver<MetricSample>;

impl MetricSink {
    pub fn channel() -> (Self, MetricReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, sample: MetricSample) {
        if let Err(err) = self.sender.send(sample) {
            trace!(metric = %err.0.descriptor.name, "sample receiver dropped");
        }
    }

    pub fn emit_all(&self, samples: impl IntoIterator<Item = MetricSample>) {
        for sample in samples {
            self.emit(sample);
        }
    }
}

/// Drains whatever has been sent so far without waiting for more.
pub fn drain(receiver: &mut MetricReceiver) -> Vec<MetricSample> {
    let mut samples = Vec::new();
    while let Ok(sample) = receiver.try_recv() {
        samples.push(sample);
    }
    samples
}
