//! Concurrent scrape pipeline for node monitoring APIs: fetch snapshots, project them onto
//! metric descriptors and stream the samples into a sink.

pub mod aggregate;
pub mod api;
pub mod client;
pub mod collectors;
pub mod error;
pub mod instance;
pub mod metrics;

pub use aggregate::{CollectorAggregate, ScrapeDurationRecord, ScrapeResult};
pub use client::{SnapshotClient, build_http_client};
pub use collectors::{NodeInfoCollector, NodeStatsCollector, SubCollector};
pub use error::{CollectError, Result};
pub use instance::MonitoredInstance;
pub use metrics::{MetricDescriptor, MetricSample, MetricSink, MetricType, MetricValue};
