//! Persisted log entry shapes.
//!
//! These structs are the de facto on-store schema: history viewers,
//! restore tooling, and dashboards read the JSON these serialize to, so
//! field names stay camelCase and optional fields serialize as explicit
//! nulls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::change::FieldChange;
use crate::types::id::{RecordId, UserId};
use crate::types::severity::Severity;

/// One logged mutation event, possibly bundling several field changes
/// from a single logical update.
///
/// A `LogEntry` with an empty `changes` list is never persisted. Entries
/// are keyed by a process-generated log id and partitioned by the UTC
/// calendar date of their timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Kind of event (e.g. `field_changed`, `bulk_delete`, `login_failed`).
    pub event_type: String,
    /// Severity of the event.
    #[serde(default)]
    pub severity: Severity,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who made the change, if known.
    pub user_id: Option<UserId>,
    /// The user's email, if known.
    pub user_email: Option<String>,
    /// The user's display name, if known.
    pub username: Option<String>,
    /// The record the event concerns. Security events carry none.
    pub record_id: Option<RecordId>,
    /// The kind of record (`lead`, `customer`, ...).
    pub record_type: String,
    /// The individual field changes bundled in this event.
    #[serde(default)]
    pub changes: Vec<FieldChange>,
    /// Number of field changes. Always equals `changes.len()`.
    pub change_count: usize,
    /// Free-form context about where the change came from.
    #[serde(default)]
    pub metadata: LogMetadata,
}

/// Context metadata attached to a [`LogEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetadata {
    /// Origin of the change (`inline_edit`, `bulk_edit`, `form_submit`, ...).
    pub source: String,
    /// Browser session the change was made in, if known.
    pub session_id: Option<String>,
    /// Any additional keys supplied by the caller.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LogMetadata {
    fn default() -> Self {
        Self {
            source: "unknown".to_string(),
            session_id: None,
            extra: Map::new(),
        }
    }
}

/// Lightweight pointer stored under the recordId and userId indices.
///
/// An `IndexEntry` exists if and only if its referenced [`LogEntry`]
/// exists; both are written in the same atomic multi-path update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Timestamp of the referenced log entry.
    pub timestamp: DateTime<Utc>,
    /// Event type of the referenced log entry.
    pub event_type: String,
    /// Date partition the referenced log entry lives under.
    pub date_key: String,
}

/// Per-field historical record stored under
/// `audit/{recordId}/changes/{field}/{timestamp}`.
///
/// This is an independent write path from the batched [`LogEntry`]
/// mechanism; the two coexist and are not derived from each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChangeEntry {
    /// Dot-delimited field path.
    pub field: String,
    /// Serialized value before the change.
    pub old_value: Value,
    /// Serialized value after the change.
    pub new_value: Value,
    /// The user who made the change, if known.
    pub user_id: Option<UserId>,
    /// The user's email, if known.
    #[serde(default)]
    pub user_email: Option<String>,
    /// The user's display name, if known.
    #[serde(default)]
    pub username: Option<String>,
    /// The record the change belongs to.
    pub record_id: RecordId,
    /// When the change occurred.
    pub timestamp: DateTime<Utc>,
    /// Any additional keys supplied by the caller.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
