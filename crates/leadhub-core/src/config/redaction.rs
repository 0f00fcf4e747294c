//! Value serialization and redaction configuration.

use serde::{Deserialize, Serialize};

/// Marker stored in place of a sensitive value.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Settings for serializing field values before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Maximum character length of a serialized object value. Longer
    /// values are truncated with a trailing ellipsis marker.
    #[serde(default = "default_max_value_len")]
    pub max_value_len: usize,
    /// Substrings that mark a field path or string value as sensitive.
    /// Matched case-insensitively.
    #[serde(default = "default_sensitive_patterns")]
    pub sensitive_patterns: Vec<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            max_value_len: default_max_value_len(),
            sensitive_patterns: default_sensitive_patterns(),
        }
    }
}

fn default_max_value_len() -> usize {
    1000
}

fn default_sensitive_patterns() -> Vec<String> {
    vec![
        "password".to_string(),
        "token".to_string(),
        "secret".to_string(),
    ]
}
