//! Flush retry configuration.

use serde::{Deserialize, Serialize};

/// Retry policy applied when a batch flush fails.
///
/// The default policy retries forever, which preserves the at-least-once
/// delivery guarantee at the cost of unbounded retry loops under a
/// persistently failing store. Setting `max_attempts` moves a batch to the
/// dead-letter buffer after that many consecutive failed flushes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Backoff in milliseconds between failed flush attempts.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Maximum consecutive failed flushes before dead-lettering.
    /// `None` retries indefinitely.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_ms: default_backoff_ms(),
            max_attempts: None,
        }
    }
}

fn default_backoff_ms() -> u64 {
    5000
}
