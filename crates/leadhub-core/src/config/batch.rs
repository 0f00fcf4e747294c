//! Batch queue configuration.

use serde::{Deserialize, Serialize};

/// Batch queue settings controlling the debounce window and the size
/// trip-wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Debounce delay in milliseconds before a buffered batch is flushed.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Queue length at which a flush is triggered immediately.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_size: default_max_size(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_max_size() -> usize {
    50
}
