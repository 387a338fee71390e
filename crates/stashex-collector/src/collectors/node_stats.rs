use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    api::{NodeStatsResponse, PipelineStats},
    client::SnapshotClient,
    collectors::{SampleBuffer, millis_to_seconds},
    error::Result,
    metrics::{DescriptorRegistry, MetricDescriptor, MetricSample, MetricSink, NAMESPACE},
};

pub const SUBSYSTEM: &str = "node";

const INSTANCE: &[&str] = &["instance"];
const POOL: &[&str] = &["pool", "instance"];
const GC_COLLECTOR: &[&str] = &["collector", "instance"];
const PIPELINE: &[&str] = &["pipeline", "instance"];
const PLUGIN: &[&str] = &["pipeline", "plugin", "plugin_id", "plugin_type", "instance"];

struct NodeStatsMetrics {
    jvm_threads_count: Arc<MetricDescriptor>,
    jvm_threads_peak_count: Arc<MetricDescriptor>,
    jvm_uptime_seconds: Arc<MetricDescriptor>,

    mem_heap_used_percent: Arc<MetricDescriptor>,
    mem_heap_used_bytes: Arc<MetricDescriptor>,
    mem_heap_committed_bytes: Arc<MetricDescriptor>,
    mem_heap_max_bytes: Arc<MetricDescriptor>,
    mem_nonheap_used_bytes: Arc<MetricDescriptor>,
    mem_nonheap_committed_bytes: Arc<MetricDescriptor>,

    mem_pool_used_bytes: Arc<MetricDescriptor>,
    mem_pool_peak_used_bytes: Arc<MetricDescriptor>,
    mem_pool_max_bytes: Arc<MetricDescriptor>,
    mem_pool_peak_max_bytes: Arc<MetricDescriptor>,
    mem_pool_committed_bytes: Arc<MetricDescriptor>,

    gc_collection_duration_seconds: Arc<MetricDescriptor>,
    gc_collection_count: Arc<MetricDescriptor>,

    process_open_fds: Arc<MetricDescriptor>,
    process_peak_open_fds: Arc<MetricDescriptor>,
    process_max_fds: Arc<MetricDescriptor>,
    process_mem_total_virtual_bytes: Arc<MetricDescriptor>,
    process_cpu_percent: Arc<MetricDescriptor>,
    process_cpu_total_seconds: Arc<MetricDescriptor>,

    reloads_successes: Arc<MetricDescriptor>,
    reloads_failures: Arc<MetricDescriptor>,

    pipeline_duration_seconds: Arc<MetricDescriptor>,
    pipeline_events_in: Arc<MetricDescriptor>,
    pipeline_events_filtered: Arc<MetricDescriptor>,
    pipeline_events_out: Arc<MetricDescriptor>,
    pipeline_reloads_successes: Arc<MetricDescriptor>,
    pipeline_reloads_failures: Arc<MetricDescriptor>,
    pipeline_dead_letter_queue_size_bytes: Arc<MetricDescriptor>,

    plugin_duration_seconds: Arc<MetricDescriptor>,
    plugin_events_in: Arc<MetricDescriptor>,
    plugin_events_out: Arc<MetricDescriptor>,
    plugin_matches: Arc<MetricDescriptor>,
    plugin_failures: Arc<MetricDescriptor>,

    queue_events: Arc<MetricDescriptor>,
    queue_page_capacity_bytes: Arc<MetricDescriptor>,
    queue_max_size_bytes: Arc<MetricDescriptor>,
}

impl NodeStatsMetrics {
    fn register(registry: &mut DescriptorRegistry) -> Result<Self> {
        Ok(Self {
            jvm_threads_count: registry.register(
                "jvm_threads_count",
                "Number of live JVM threads.",
                INSTANCE,
            )?,
            jvm_threads_peak_count: registry.register(
                "jvm_threads_peak_count",
                "Peak number of live JVM threads.",
                INSTANCE,
            )?,
            jvm_uptime_seconds: registry.register(
                "jvm_uptime_seconds_total",
                "JVM uptime in seconds.",
                INSTANCE,
            )?,
            mem_heap_used_percent: registry.register(
                "mem_heap_used_percent",
                "Share of the maximum heap currently in use, in percent.",
                INSTANCE,
            )?,
            mem_heap_used_bytes: registry.register(
                "mem_heap_used_bytes",
                "Heap memory in use, in bytes.",
                INSTANCE,
            )?,
            mem_heap_committed_bytes: registry.register(
                "mem_heap_committed_bytes",
                "Heap memory committed, in bytes.",
                INSTANCE,
            )?,
            mem_heap_max_bytes: registry.register(
                "mem_heap_max_bytes",
                "Maximum heap size, in bytes.",
                INSTANCE,
            )?,
            mem_nonheap_used_bytes: registry.register(
                "mem_nonheap_used_bytes",
                "Non-heap memory in use, in bytes.",
                INSTANCE,
            )?,
            mem_nonheap_committed_bytes: registry.register(
                "mem_nonheap_committed_bytes",
                "Non-heap memory committed, in bytes.",
                INSTANCE,
            )?,
            mem_pool_used_bytes: registry.register(
                "mem_pool_used_bytes",
                "Memory in use by the pool, in bytes.",
                POOL,
            )?,
            mem_pool_peak_used_bytes: registry.register(
                "mem_pool_peak_used_bytes",
                "Peak memory used by the pool, in bytes.",
                POOL,
            )?,
            mem_pool_max_bytes: registry.register(
                "mem_pool_max_bytes",
                "Maximum size of the pool, in bytes.",
                POOL,
            )?,
            mem_pool_peak_max_bytes: registry.register(
                "mem_pool_peak_max_bytes",
                "Peak maximum size of the pool, in bytes.",
                POOL,
            )?,
            mem_pool_committed_bytes: registry.register(
                "mem_pool_committed_bytes",
                "Memory committed to the pool, in bytes.",
                POOL,
            )?,
            gc_collection_duration_seconds: registry.register(
                "gc_collection_duration_seconds_total",
                "Time spent in garbage collection, in seconds.",
                GC_COLLECTOR,
            )?,
            gc_collection_count: registry.register(
                "gc_collection_total",
                "Number of garbage collections.",
                GC_COLLECTOR,
            )?,
            process_open_fds: registry.register(
                "process_open_filedescriptors",
                "Number of open file descriptors.",
                INSTANCE,
            )?,
            process_peak_open_fds: registry.register(
                "process_peak_open_filedescriptors",
                "Peak number of open file descriptors.",
                INSTANCE,
            )?,
            process_max_fds: registry.register(
                "process_max_filedescriptors",
                "Maximum number of open file descriptors.",
                INSTANCE,
            )?,
            process_mem_total_virtual_bytes: registry.register(
                "process_mem_total_virtual_bytes",
                "Total virtual memory of the process, in bytes.",
                INSTANCE,
            )?,
            process_cpu_percent: registry.register(
                "process_cpu_percent",
                "Recent CPU usage of the process, in percent.",
                INSTANCE,
            )?,
            process_cpu_total_seconds: registry.register(
                "process_cpu_total_seconds_total",
                "Total CPU time used by the process, in seconds.",
                INSTANCE,
            )?,
            reloads_successes: registry.register(
                "reloads_successes_total",
                "Number of successful configuration reloads.",
                INSTANCE,
            )?,
            reloads_failures: registry.register(
                "reloads_failures_total",
                "Number of failed configuration reloads.",
                INSTANCE,
            )?,
            pipeline_duration_seconds: registry.register(
                "pipeline_duration_seconds_total",
                "Time spent processing events in the pipeline, in seconds.",
                PIPELINE,
            )?,
            pipeline_events_in: registry.register(
                "pipeline_events_in_total",
                "Events received by the pipeline.",
                PIPELINE,
            )?,
            pipeline_events_filtered: registry.register(
                "pipeline_events_filtered_total",
                "Events that went through the pipeline filters.",
                PIPELINE,
            )?,
            pipeline_events_out: registry.register(
                "pipeline_events_out_total",
                "Events emitted by the pipeline.",
                PIPELINE,
            )?,
            pipeline_reloads_successes: registry.register(
                "pipeline_reloads_successes_total",
                "Number of successful pipeline reloads.",
                PIPELINE,
            )?,
            pipeline_reloads_failures: registry.register(
                "pipeline_reloads_failures_total",
                "Number of failed pipeline reloads.",
                PIPELINE,
            )?,
            pipeline_dead_letter_queue_size_bytes: registry.register(
                "pipeline_dead_letter_queue_size_bytes",
                "Size of the pipeline dead letter queue, in bytes.",
                PIPELINE,
            )?,
            plugin_duration_seconds: registry.register(
                "plugin_duration_seconds_total",
                "Time spent in the plugin, in seconds.",
                PLUGIN,
            )?,
            plugin_events_in: registry.register(
                "plugin_events_in_total",
                "Events received by the plugin.",
                PLUGIN,
            )?,
            plugin_events_out: registry.register(
                "plugin_events_out_total",
                "Events emitted by the plugin.",
                PLUGIN,
            )?,
            plugin_matches: registry.register(
                "plugin_matches_total",
                "Events matched by the filter plugin.",
                PLUGIN,
            )?,
            plugin_failures: registry.register(
                "plugin_failures_total",
                "Events the filter plugin failed on.",
                PLUGIN,
            )?,
            queue_events: registry.register(
                "queue_events",
                "Events waiting in the persisted queue.",
                PIPELINE,
            )?,
            queue_page_capacity_bytes: registry.register(
                "queue_page_capacity_bytes",
                "Page capacity of the persisted queue, in bytes.",
                PIPELINE,
            )?,
            queue_max_size_bytes: registry.register(
                "queue_max_size_bytes",
                "Maximum size of the persisted queue, in bytes.",
                PIPELINE,
            )?,
        })
    }
}

/// Runtime statistics from `/_node/stats`.
pub struct NodeStatsCollector {
    client: SnapshotClient,
    instance: String,
    registry: DescriptorRegistry,
    metrics: NodeStatsMetrics,
}

impl NodeStatsCollector {
    pub fn new(client: SnapshotClient, instance: impl Into<String>) -> Result<Self> {
        let mut registry = DescriptorRegistry::new(NAMESPACE, SUBSYSTEM);
        let metrics = NodeStatsMetrics::register(&mut registry)?;

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
        let stats = match self.client.node_stats().await {
            Ok(stats) => stats,
            Err(err) => {
                error!(error = %err, "failed collecting node stats metrics");
                return Err(err);
            }
        };

        let samples = self.project(&stats);
        debug!(samples = samples.len(), pipelines = stats.pipelines.len(), "projected node stats");
        sink.emit_all(samples);
        Ok(())
    }

    pub fn project(&self, stats: &NodeStatsResponse) -> Vec<MetricSample> {
        let m = &self.metrics;
        let mut out = SampleBuffer::new(&self.instance);

        let jvm = &stats.jvm;
        out.gauge(&m.jvm_threads_count, jvm.threads.count, &[]);
        out.gauge(&m.jvm_threads_peak_count, jvm.threads.peak_count, &[]);
        out.counter(&m.jvm_uptime_seconds, millis_to_seconds(jvm.uptime_in_millis), &[]);

        out.gauge(&m.mem_heap_used_percent, jvm.mem.heap_used_percent, &[]);
        out.gauge(&m.mem_heap_used_bytes, jvm.mem.heap_used_in_bytes, &[]);
        out.gauge(&m.mem_heap_committed_bytes, jvm.mem.heap_committed_in_bytes, &[]);
        out.gauge(&m.mem_heap_max_bytes, jvm.mem.heap_max_in_bytes, &[]);
        out.gauge(&m.mem_nonheap_used_bytes, jvm.mem.non_heap_used_in_bytes, &[]);
        out.gauge(&m.mem_nonheap_committed_bytes, jvm.mem.non_heap_committed_in_bytes, &[]);

        for (pool, usage) in jvm.mem.pools.by_name() {
            out.gauge(&m.mem_pool_used_bytes, usage.used_in_bytes, &[pool]);
            out.gauge(&m.mem_pool_peak_used_bytes, usage.peak_used_in_bytes, &[pool]);
            out.gauge(&m.mem_pool_max_bytes, usage.max_in_bytes, &[pool]);
            out.gauge(&m.mem_pool_peak_max_bytes, usage.peak_max_in_bytes, &[pool]);
            out.gauge(&m.mem_pool_committed_bytes, usage.committed_in_bytes, &[pool]);
        }

        for (collector, gc) in jvm.gc.collectors.by_name() {
            out.counter(
                &m.gc_collection_duration_seconds,
                millis_to_seconds(gc.collection_time_in_millis),
                &[collector],
            );
            out.gauge(&m.gc_collection_count, gc.collection_count, &[collector]);
        }

        let process = &stats.process;
        out.gauge(&m.process_open_fds, process.open_file_descriptors, &[]);
        out.gauge(&m.process_peak_open_fds, process.peak_open_file_descriptors, &[]);
        out.gauge(&m.process_max_fds, process.max_file_descriptors, &[]);
        out.gauge(&m.process_mem_total_virtual_bytes, process.mem.total_virtual_in_bytes, &[]);
        out.gauge(&m.process_cpu_percent, process.cpu.percent, &[]);
        out.counter(
            &m.process_cpu_total_seconds,
            millis_to_seconds(process.cpu.total_in_millis),
            &[],
        );

        out.counter(&m.reloads_successes, stats.reloads.successes, &[]);
        out.counter(&m.reloads_failures, stats.reloads.failures, &[]);

        for (pipeline_id, pipeline) in &stats.pipelines {
            self.project_pipeline(&mut out, pipeline_id, pipeline);
        }

        out.into_samples()
    }

    fn project_pipeline(&self, out: &mut SampleBuffer<'_>, pipeline_id: &str, pipeline: &PipelineStats) {
        let m = &self.metrics;
        let labels = [pipeline_id];

        out.counter(
            &m.pipeline_duration_seconds,
            millis_to_seconds(pipeline.events.duration_in_millis),
            &labels,
        );
        out.counter(&m.pipeline_events_in, pipeline.events.r#in, &labels);
        out.counter(&m.pipeline_events_filtered, pipeline.events.filtered, &labels);
        out.counter(&m.pipeline_events_out, pipeline.events.out, &labels);
        out.counter(&m.pipeline_reloads_successes, pipeline.reloads.successes, &labels);
        out.counter(&m.pipeline_reloads_failures, pipeline.reloads.failures, &labels);
        out.gauge(
            &m.pipeline_dead_letter_queue_size_bytes,
            pipeline.dead_letter_queue.queue_size_in_bytes,
            &labels,
        );

        // Inputs do not report `in`; their `out` stands in for both directions.
        for plugin in &pipeline.plugins.inputs {
            let labels = [pipeline_id, plugin.name.as_str(), plugin.id.as_str(), "input"];
            out.counter(&m.plugin_events_in, plugin.events.out, &labels);
            out.counter(&m.plugin_events_out, plugin.events.out, &labels);
        }

        for plugin in &pipeline.plugins.filters {
            let labels = [pipeline_id, plugin.name.as_str(), plugin.id.as_str(), "filter"];
            out.counter(
                &m.plugin_duration_seconds,
                millis_to_seconds(plugin.events.duration_in_millis),
                &labels,
            );
            out.counter(&m.plugin_events_in, plugin.events.r#in, &labels);
            out.counter(&m.plugin_events_out, plugin.events.out, &labels);
            out.counter(&m.plugin_matches, plugin.matches, &labels);
            out.counter(&m.plugin_failures, plugin.failures, &labels);
        }

        for plugin in &pipeline.plugins.outputs {
            let labels = [pipeline_id, plugin.name.as_str(), plugin.id.as_str(), "output"];
            out.counter(&m.plugin_events_in, plugin.events.r#in, &labels);
            out.counter(&m.plugin_events_out, plugin.events.out, &labels);
        }

        if pipeline.queue.is_persisted() {
            out.gauge(&m.queue_events, pipeline.queue.events(), &labels);
            out.gauge(&m.queue_page_capacity_bytes, pipeline.queue.page_capacity_bytes(), &labels);
            out.gauge(&m.queue_max_size_bytes, pipeline.queue.max_size_bytes(), &labels);
        }
    }
}
