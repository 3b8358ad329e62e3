//! Pipeline tuning knobs. Loaded by the embedding service (every field has a
//! default, so a partial config section is fine).

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of each resource actor's request channel.
    pub channel_capacity: usize,
    /// Budget for every collection accessor call.
    pub accessor_timeout_ms: u64,
    /// Budget for the post-create follow-up task.
    pub side_effect_timeout_ms: u64,
    pub cache_enabled: bool,
    /// Caps `list` page size. `None` leaves listings unbounded.
    pub max_list_limit: Option<usize>,
    /// How far an event listener may lag before losing events.
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
            accessor_timeout_ms: 5_000,
            side_effect_timeout_ms: 10_000,
            cache_enabled: true,
            max_list_limit: None,
            event_capacity: 256,
        }
    }
}

impl PipelineConfig {
    pub fn accessor_timeout(&self) -> Duration {
        Duration::from_millis(self.accessor_timeout_ms)
    }

    pub fn side_effect_timeout(&self) -> Duration {
        Duration::from_millis(self.side_effect_timeout_ms)
    }
}
