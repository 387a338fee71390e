use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    sync::Mutex,
    task::{self, JoinSet},
};
use tracing::{Instrument, debug, error, info_span, warn};

use crate::{
    client::SnapshotClient,
    collectors::{NodeInfoCollector, NodeStatsCollector, SubCollector},
    error::Result,
    instance::MonitoredInstance,
    metrics::{DescriptorRegistry, MetricDescriptor, MetricSink, NAMESPACE, SummaryMetric},
};

pub const SCRAPE_SUBSYSTEM: &str = "exporter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeResult {
    Success,
    Error,
}

impl ScrapeResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ScrapeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one sub-collector within one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeDurationRecord {
    pub collector: &'static str,
    pub result: ScrapeResult,
    pub instance: String,
    pub elapsed: Duration,
}

/// Every sub-collector for one monitored instance, plus the scrape duration summary they
/// report into.
pub struct CollectorAggregate {
    instance: MonitoredInstance,
    collectors: BTreeMap<&'static str, Arc<SubCollector>>,
    scrape_durations: Arc<SummaryMetric>,
    scrape_lock: Mutex<()>,
}

impl CollectorAggregate {
    pub fn new(endpoint: &str, http: reqwest::Client) -> Result<Self> {
        let instance = MonitoredInstance::parse(endpoint)?;
        let client = SnapshotClient::new(instance.base_url(), http);
        let label = instance.label();

        let collectors = [
            SubCollector::Stats(NodeStatsCollector::new(client.clone(), label)?),
            SubCollector::Info(NodeInfoCollector::new(client, label)?),
        ]
        .into_iter()
        .map(|collector| (collector.name(), Arc::new(collector)))
        .collect();

        let mut registry = DescriptorRegistry::new(NAMESPACE, SCRAPE_SUBSYSTEM);
        let scrape_durations = registry.register(
            "scrape_duration_seconds",
            "Duration of a collector scrape, by collector and result.",
            &["collector", "result", "instance"],
        )?;

        Ok(Self {
            instance,
            collectors,
            scrape_durations: Arc::new(SummaryMetric::new(scrape_durations)),
            scrape_lock: Mutex::new(()),
        })
    }

    pub fn instance(&self) -> &MonitoredInstance {
        &self.instance
    }

    pub fn collector_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.collectors.keys().copied()
    }

    /// Everything this aggregate can emit, the duration summary included.
    pub fn descriptors(&self) -> Vec<Arc<MetricDescriptor>> {
        self.collectors
            .values()
            .flat_map(|collector| collector.descriptors().iter().cloned())
            .chain(std::iter::once(Arc::clone(self.scrape_durations.descriptor())))
            .collect()
    }

    /// Runs one scrape cycle: every sub-collector in its own task, all joined before the
    /// duration summary is updated and emitted. Overlapping calls run one after the other.
    /// Dropping the returned future aborts the collector tasks still in flight.
    pub async fn scrape(&self, sink: &MetricSink) -> Vec<ScrapeDurationRecord> {
        let _guard = self.scrape_lock.lock().await;
        let started = Instant::now();
        let instance = self.instance.label();

        let mut cycle = CycleTasks::new(instance);
        for (&name, collector) in &self.collectors {
            let collector = Arc::clone(collector);
            let sink = sink.clone();
            let instance = instance.to_string();
            let span = info_span!("collect", collector = name, instance = %instance);

            cycle.spawn(
                name,
                async move {
                    let begun = Instant::now();
                    let result = match collector.collect(&sink).await {
                        Ok(()) => ScrapeResult::Success,
                        Err(_) => ScrapeResult::Error,
                    };
                    ScrapeDurationRecord {
                        collector: name,
                        result,
                        instance,
                        elapsed: begun.elapsed(),
                    }
                }
                .instrument(span),
            );
        }

        let mut records = Vec::with_capacity(self.collectors.len());
        while let Some(joined) = cycle.tasks.join_next_with_id().await {
            match joined {
                Ok((_, record)) => records.push(record),
                Err(err) => {
                    let name = cycle.names.get(&err.id()).copied().unwrap_or("unknown");
                    error!(collector = name, instance, error = %err, "collector task aborted");
                    records.push(ScrapeDurationRecord {
                        collector: name,
                        result: ScrapeResult::Error,
                        instance: instance.to_string(),
                        elapsed: started.elapsed(),
                    });
                }
            }
        }
        records.sort_by_key(|record| record.collector);

        for record in &records {
            let seconds = record.elapsed.as_secs_f64();
            match record.result {
                ScrapeResult::Success => {
                    debug!(collector = record.collector, instance, seconds, "collector succeeded")
                }
                ScrapeResult::Error => {
                    warn!(collector = record.collector, instance, seconds, "collector failed")
                }
            }
            self.scrape_durations
                .observe(&[record.collector, record.result.as_str(), record.instance.as_str()], seconds);
        }

        sink.emit_all(self.scrape_durations.collect());
        records
    }
}

/// Collector tasks of one cycle. Whatever has not been joined when this is dropped is aborted.
struct CycleTasks {
    instance: String,
    tasks: JoinSet<ScrapeDurationRecord>,
    names: HashMap<task::Id, &'static str>,
}

impl CycleTasks {
    fn new(instance: &str) -> Self {
        Self {
            instance: instance.to_string(),
            tasks: JoinSet::new(),
            names: HashMap::new(),
        }
    }

    fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ScrapeDurationRecord> + Send + 'static,
    {
        let handle = self.tasks.spawn(task);
        self.names.insert(handle.id(), name);
    }
}

impl Drop for CycleTasks {
    fn drop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        warn!(
            instance = %self.instance,
            pending = self.tasks.len(),
            "scrape abandoned before every collector finished, aborting"
        );
        self.tasks.abort_all();
    }
}
