//! Payloads of the node monitoring API.
//!
//! Field sets span several server releases. Anything a given release omits decodes to its
//! zero value and a `null` in an object, list or string position decodes the same way, so a
//! projector never has to branch on presence. Unknown fields are ignored.

pub mod node_info;
pub mod node_stats;

use serde::{Deserialize, Deserializer};

pub use node_info::{JvmInfo, NodeInfoResponse, OsInfo, PipelineSettings};
pub use node_stats::{
    DeadLetterQueueStats, EventStats, FilterPluginStats, GcCollectorStats, InputPluginStats,
    JvmStats, MemPoolStats, NodeStatsResponse, OutputPluginStats, PipelineStats, PluginEvents,
    PluginStats, ProcessStats, QueueStats, ReloadStats,
};

pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
