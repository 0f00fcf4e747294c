//! Audit engine configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a default so an empty configuration yields
//! the stock behavior of the engine.

pub mod batch;
pub mod query;
pub mod redaction;
pub mod retry;

use serde::{Deserialize, Serialize};

use self::batch::BatchConfig;
use self::query::QueryConfig;
use self::redaction::RedactionConfig;
use self::retry::RetryConfig;

use crate::error::AppError;

/// Root audit engine configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Batch queue settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Flush retry settings.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Query engine settings.
    #[serde(default)]
    pub query: QueryConfig,
    /// Value serialization and redaction settings.
    #[serde(default)]
    pub redaction: RedactionConfig,
}

impl AuditConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `LEADHUB_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LEADHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.batch.delay_ms, 1000);
        assert_eq!(config.batch.max_size, 50);
        assert_eq!(config.retry.backoff_ms, 5000);
        assert_eq!(config.retry.max_attempts, None);
        assert_eq!(config.query.default_limit, 100);
        assert_eq!(config.redaction.max_value_len, 1000);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AuditConfig =
            serde_json::from_str(r#"{"batch": {"max_size": 10}}"#).expect("should deserialize");
        assert_eq!(config.batch.max_size, 10);
        assert_eq!(config.batch.delay_ms, 1000);
    }
}
