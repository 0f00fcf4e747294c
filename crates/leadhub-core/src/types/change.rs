//! Field-level change records produced by the change detector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One leaf-level mutation inside a record.
///
/// Values have already passed through serialization: sensitive values are
/// replaced by the redaction marker and object values are stringified and
/// size-bounded. A `FieldChange` is immutable once created and is persisted
/// either inside a [`LogEntry`](crate::types::LogEntry) or as a standalone
/// keyed entry under a record's audit path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Dot-delimited path into the record (e.g. `contact.name`).
    pub field: String,
    /// Serialized value before the change. Null when the key was absent.
    pub old_value: Value,
    /// Serialized value after the change. Null when the key was removed.
    pub new_value: Value,
    /// When the change was detected.
    pub timestamp: DateTime<Utc>,
}
