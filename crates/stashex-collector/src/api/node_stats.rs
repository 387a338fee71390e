use std::collections::BTreeMap;

use serde::Deserialize;

use super::nullable;

pub const MEMORY_QUEUE_TYPE: &str = "memory";

/// `GET /_node/stats`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeStatsResponse {
    #[serde(deserialize_with = "nullable")]
    pub host: String,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    #[serde(deserialize_with = "nullable")]
    pub jvm: JvmStats,
    #[serde(deserialize_with = "nullable")]
    pub process: ProcessStats,
    #[serde(deserialize_with = "nullable")]
    pub reloads: ReloadStats,
    #[serde(deserialize_with = "nullable")]
    pub pipelines: BTreeMap<String, PipelineStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmStats {
    #[serde(deserialize_with = "nullable")]
    pub threads: ThreadStats,
    #[serde(deserialize_with = "nullable")]
    pub mem: JvmMemStats,
    #[serde(deserialize_with = "nullable")]
    pub gc: GcStats,
    pub uptime_in_millis: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadStats {
    pub count: f64,
    pub peak_count: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmMemStats {
    pub heap_used_percent: f64,
    pub heap_used_in_bytes: f64,
    pub heap_committed_in_bytes: f64,
    pub heap_max_in_bytes: f64,
    pub non_heap_used_in_bytes: f64,
    pub non_heap_committed_in_bytes: f64,
    #[serde(deserialize_with = "nullable")]
    pub pools: MemPools,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemPools {
    #[serde(deserialize_with = "nullable")]
    pub young: MemPoolStats,
    #[serde(deserialize_with = "nullable")]
    pub old: MemPoolStats,
    #[serde(deserialize_with = "nullable")]
    pub survivor: MemPoolStats,
}

impl MemPools {
    /// Pools in the order they are exported, keyed by their `pool` label value.
    pub fn by_name(&self) -> [(&'static str, &MemPoolStats); 3] {
        [
            ("old", &self.old),
            ("young", &self.young),
            ("survivor", &self.survivor),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemPoolStats {
    pub used_in_bytes: f64,
    pub peak_used_in_bytes: f64,
    pub max_in_bytes: f64,
    pub peak_max_in_bytes: f64,
    pub committed_in_bytes: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GcStats {
    #[serde(deserialize_with = "nullable")]
    pub collectors: GcCollectors,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GcCollectors {
    #[serde(deserialize_with = "nullable")]
    pub old: GcCollectorStats,
    #[serde(deserialize_with = "nullable")]
    pub young: GcCollectorStats,
}

impl GcCollectors {
    pub fn by_name(&self) -> [(&'static str, &GcCollectorStats); 2] {
        [("old", &self.old), ("young", &self.young)]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GcCollectorStats {
    pub collection_time_in_millis: f64,
    pub collection_count: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessStats {
    pub open_file_descriptors: f64,
    pub peak_open_file_descriptors: f64,
    pub max_file_descriptors: f64,
    #[serde(deserialize_with = "nullable")]
    pub mem: ProcessMemStats,
    #[serde(deserialize_with = "nullable")]
    pub cpu: ProcessCpuStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessMemStats {
    pub total_virtual_in_bytes: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessCpuStats {
    pub total_in_millis: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventStats {
    pub r#in: f64,
    pub filtered: f64,
    pub out: f64,
    pub duration_in_millis: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReloadStats {
    pub successes: f64,
    pub failures: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineStats {
    #[serde(deserialize_with = "nullable")]
    pub events: EventStats,
    #[serde(deserialize_with = "nullable")]
    pub plugins: PluginStats,
    #[serde(deserialize_with = "nullable")]
    pub reloads: ReloadStats,
    #[serde(deserialize_with = "nullable")]
    pub queue: QueueStats,
    #[serde(deserialize_with = "nullable")]
    pub dead_letter_queue: DeadLetterQueueStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginStats {
    #[serde(deserialize_with = "nullable")]
    pub inputs: Vec<InputPluginStats>,
    #[serde(deserialize_with = "nullable")]
    pub filters: Vec<FilterPluginStats>,
    #[serde(deserialize_with = "nullable")]
    pub outputs: Vec<OutputPluginStats>,
}

/// Input plugins only report what they pushed downstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputPluginStats {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub events: InputEvents,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputEvents {
    pub out: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterPluginStats {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub events: PluginEvents,
    pub matches: f64,
    pub failures: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputPluginStats {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub events: PluginEvents,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginEvents {
    pub r#in: f64,
    pub out: f64,
    pub duration_in_millis: f64,
}

/// Queue section. Older nodes nest sizes under `capacity` and report depth as `events`;
/// newer ones flatten sizes and report `events_count`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueueStats {
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub queue_type: String,
    pub events: Option<f64>,
    pub events_count: Option<f64>,
    pub queue_size_in_bytes: Option<f64>,
    pub max_queue_size_in_bytes: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub capacity: QueueCapacity,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueueCapacity {
    pub page_capacity_in_bytes: Option<f64>,
    pub max_queue_size_in_bytes: Option<f64>,
}

impl QueueStats {
    pub fn is_persisted(&self) -> bool {
        self.queue_type != MEMORY_QUEUE_TYPE
    }

    pub fn events(&self) -> f64 {
        self.events_count.or(self.events).unwrap_or_default()
    }

    pub fn page_capacity_bytes(&self) -> f64 {
        self.capacity
            .page_capacity_in_bytes
            .or(self.queue_size_in_bytes)
            .unwrap_or_default()
    }

    pub fn max_size_bytes(&self) -> f64 {
        self.capacity
            .max_queue_size_in_bytes
            .or(self.max_queue_size_in_bytes)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeadLetterQueueStats {
    pub queue_size_in_bytes: f64,
}

#[cfg(test)]
mod tests {
    use crate::client::decode_snapshot;

    use super::NodeStatsResponse;

    #[test]
    fn newer_queue_layout() {
        let stats: NodeStatsResponse = decode_snapshot(
            "test",
            br#"{"pipelines":{"main":{"queue":{"type":"persisted","events_count":7,"queue_size_in_bytes":4096,"max_queue_size_in_bytes":1073741824}}}}"#,
        )
        .unwrap();
        let queue = &stats.pipelines["main"].queue;

        assert!(queue.is_persisted());
        assert_eq!(queue.events(), 7.0);
        assert_eq!(queue.page_capacity_bytes(), 4096.0);
        assert_eq!(queue.max_size_bytes(), 1073741824.0);
    }

    #[test]
    fn older_queue_layout() {
        let stats: NodeStatsResponse = decode_snapshot(
            "test",
            br#"{"pipelines":{"main":{"queue":{"type":"persisted","events":5,"capacity":{"page_capacity_in_bytes":67108864,"max_queue_size_in_bytes":1024,"max_unread_events":0}}}}}"#,
        )
        .unwrap();
        let queue = &stats.pipelines["main"].queue;

        assert_eq!(queue.events(), 5.0);
        assert_eq!(queue.page_capacity_bytes(), 67108864.0);
        assert_eq!(queue.max_size_bytes(), 1024.0);
    }

    #[test]
    fn nulls_and_missing_sections_decode_to_zero() {
        let stats: NodeStatsResponse = decode_snapshot(
            "test",
            br#"{"jvm":null,"pipelines":{"main":{"plugins":{"inputs":null,"filters":[],"outputs":null},"reloads":{"last_error":null,"successes":2}}}}"#,
        )
        .unwrap();

        assert_eq!(stats.jvm.threads.count, 0.0);
        let main = &stats.pipelines["main"];
        assert!(main.plugins.inputs.is_empty());
        assert!(main.plugins.outputs.is_empty());
        assert_eq!(main.reloads.successes, 2.0);
        assert!(main.queue.is_persisted());
        assert_eq!(main.queue.events(), 0.0);
    }

    #[test]
    fn unprojected_sections_are_ignored() {
        let stats: NodeStatsResponse = decode_snapshot(
            "test",
            br#"{"events":{"in":9,"queue_push_duration_in_millis":3},"pipelines":{"main":{"plugins":{"inputs":[{"id":"in1","events":{"out":4,"queue_push_duration_in_millis":2}}]}}}}"#,
        )
        .unwrap();

        assert_eq!(stats.pipelines["main"].plugins.inputs[0].events.out, 4.0);
    }

    #[test]
    fn truncated_payload_fails_whole_decode() {
        let result =
            decode_snapshot::<NodeStatsResponse>("test", br#"{"jvm":{"threads":{"count":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_shape_fails_whole_decode() {
        let result = decode_snapshot::<NodeStatsResponse>(
            "test",
            br#"{"jvm":{"threads":{"count":"many"}}}"#,
        );
        assert!(result.is_err());
    }
}
