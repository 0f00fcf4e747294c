//! Query engine configuration.

use serde::{Deserialize, Serialize};

/// Query engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default result limit for index-based lookups.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Default result limit for date-range scans.
    #[serde(default = "default_date_range_limit")]
    pub date_range_limit: usize,
    /// How many days back the event-type scan covers. There is no
    /// event-type index, so this bounds the partition walk.
    #[serde(default = "default_event_scan_days")]
    pub event_scan_days: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            date_range_limit: default_date_range_limit(),
            event_scan_days: default_event_scan_days(),
        }
    }
}

fn default_limit() -> usize {
    100
}

fn default_date_range_limit() -> usize {
    1000
}

fn default_event_scan_days() -> u32 {
    30
}
