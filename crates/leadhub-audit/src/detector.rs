//! Field-level change detection between record snapshots.

use chrono::Utc;
use serde_json::{Map, Value};

use leadhub_core::config::redaction::{REDACTION_MARKER, RedactionConfig};
use leadhub_core::types::FieldChange;

/// Computes field-level diffs between two record snapshots and
/// serializes leaf values for storage.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    config: RedactionConfig,
}

impl ChangeDetector {
    /// Create a detector with the given redaction settings.
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    /// Compute the field-level diff between two snapshots.
    ///
    /// Both snapshots must be JSON objects; anything else yields an empty
    /// diff. A create or delete has no before/after pair to compare, so
    /// the caller logs those events without a diff.
    ///
    /// The walk unions the key sets of both sides at every level and
    /// recurses only where the value is an object on **both** sides.
    /// Arrays and mixed kinds are atomic leaves compared by value
    /// equality; a key present on only one side is a real change whose
    /// absent side serializes to null.
    pub fn detect(&self, before: &Value, after: &Value) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        let (Some(before_map), Some(after_map)) = (before.as_object(), after.as_object()) else {
            return changes;
        };
        self.compare(before_map, after_map, "", &mut changes);
        changes
    }

    fn compare(
        &self,
        before: &Map<String, Value>,
        after: &Map<String, Value>,
        path: &str,
        out: &mut Vec<FieldChange>,
    ) {
        let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
        keys.sort();
        keys.dedup();

        for key in keys {
            let current_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            let before_value = before.get(key);
            let after_value = after.get(key);

            match (
                before_value.and_then(Value::as_object),
                after_value.and_then(Value::as_object),
            ) {
                (Some(before_nested), Some(after_nested)) => {
                    self.compare(before_nested, after_nested, &current_path, out);
                }
                _ => {
                    if before_value != after_value {
                        out.push(FieldChange {
                            old_value: self.serialize(&current_path, before_value),
                            new_value: self.serialize(&current_path, after_value),
                            field: current_path,
                            timestamp: Utc::now(),
                        });
                    }
                }
            }
        }
    }

    /// Serialize a leaf value for storage.
    ///
    /// Sensitive values become the redaction marker; object and array
    /// values become a size-bounded JSON string; scalars pass through
    /// unchanged. Absent values serialize to null.
    pub fn serialize(&self, field: &str, value: Option<&Value>) -> Value {
        let Some(value) = value else {
            return Value::Null;
        };
        if value.is_null() {
            return Value::Null;
        }

        if self.is_sensitive(field, value) {
            return Value::String(REDACTION_MARKER.to_string());
        }

        match value {
            Value::Object(_) | Value::Array(_) => {
                let serialized = value.to_string();
                if serialized.chars().count() > self.config.max_value_len {
                    let truncated: String =
                        serialized.chars().take(self.config.max_value_len).collect();
                    Value::String(format!("{truncated}..."))
                } else {
                    Value::String(serialized)
                }
            }
            other => other.clone(),
        }
    }

    /// Whether the field path or a string value matches a sensitive
    /// pattern (case-insensitive).
    fn is_sensitive(&self, field: &str, value: &Value) -> bool {
        let field_lower = field.to_lowercase();
        let value_lower = value.as_str().map(str::to_lowercase);

        self.config.sensitive_patterns.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            field_lower.contains(&pattern)
                || value_lower
                    .as_deref()
                    .is_some_and(|v| v.contains(&pattern))
        })
    }
}
