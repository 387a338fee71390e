use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    error::{CollectError, Result},
    metrics::types::{MetricDescriptor, MetricSample, MetricValue, build_fq_name},
};

type LabelValues = Vec<String>;

/// Catalog of the descriptors one collector may emit. Filled in by the collector's
/// constructor and read-only afterwards.
#[derive(Debug)]
pub struct DescriptorRegistry {
    namespace: &'static str,
    subsystem: &'static str,
    descriptors: Vec<Arc<MetricDescriptor>>,
    names: HashSet<String>,
}

impl DescriptorRegistry {
    pub fn new(namespace: &'static str, subsystem: &'static str) -> Self {
        Self {
            namespace,
            subsystem,
            descriptors: Vec::new(),
            names: HashSet::new(),
        }
    }

    pub fn register(
        &mut self,
        name: &str,
        help: &str,
        variable_labels: &[&str],
    ) -> Result<Arc<MetricDescriptor>> {
        let full_name = build_fq_name(self.namespace, self.subsystem, name);
        if !self.names.insert(full_name.clone()) {
            return Err(CollectError::DuplicateMetric(full_name));
        }

        let descriptor = Arc::new(MetricDescriptor {
            name: full_name,
            help: help.to_string(),
            variable_labels: variable_labels.iter().map(|label| (*label).to_string()).collect(),
        });
        self.descriptors.push(Arc::clone(&descriptor));
        Ok(descriptor)
    }

    pub fn descriptors(&self) -> &[Arc<MetricDescriptor>] {
        &self.descriptors
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Latency summary exposed as `_sum` and `_count` per label set. Safe to observe from
/// concurrent tasks.
pub struct SummaryMetric {
    descriptor: Arc<MetricDescriptor>,
    series: RwLock<HashMap<LabelValues, Arc<SummarySeries>>>,
}

struct SummarySeries {
    count: AtomicU64,
    sum: Mutex<f64>,
}

impl SummarySeries {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: Mutex::new(0.0),
        }
    }
}

impl SummaryMetric {
    pub fn new(descriptor: Arc<MetricDescriptor>) -> Self {
        Self {
            descriptor,
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn descriptor(&self) -> &Arc<MetricDescriptor> {
        &self.descriptor
    }

    pub fn observe(&self, labels: &[&str], value: f64) {
        let series = self.get_or_create_series(labels);
        series.count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut sum) = series.sum.lock() {
            *sum += value;
        }
    }

    pub fn collect(&self) -> Vec<MetricSample> {
        let series = match self.series.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };

        let mut samples = series
            .iter()
            .map(|(label_values, entry)| {
                let sum = match entry.sum.lock() {
                    Ok(value) => *value,
                    Err(_) => 0.0,
                };

                MetricSample {
                    descriptor: Arc::clone(&self.descriptor),
                    value: MetricValue::Summary {
                        count: entry.count.load(Ordering::Relaxed),
                        sum,
                    },
                    label_values: label_values.clone(),
                }
            })
            .collect::<Vec<_>>();

        samples.sort_by(|left, right| left.label_values.cmp(&right.label_values));
        samples
    }

    fn get_or_create_series(&self, labels: &[&str]) -> Arc<SummarySeries> {
        let label_values = normalize_labels(&self.descriptor, labels);
        if let Ok(guard) = self.series.read()
            && let Some(existing) = guard.get(&label_values)
        {
            return existing.clone();
        }

        match self.series.write() {
            Ok(mut guard) => guard
                .entry(label_values)
                .or_insert_with(|| Arc::new(SummarySeries::new()))
                .clone(),
            Err(_) => Arc::new(SummarySeries::new()),
        }
    }
}

fn normalize_labels(descriptor: &MetricDescriptor, labels: &[&str]) -> LabelValues {
    let expected = descriptor.variable_labels.len();
    (0..expected)
        .map(|index| labels.get(index).copied().unwrap_or_default().to_string())
        .collect()
}
