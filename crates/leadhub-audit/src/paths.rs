//! Storage layout of the audit engine.
//!
//! ```text
//! logs/{dateKey}/{logId}                          primary entries
//! index/recordId/{recordId}/{logId}               record index
//! index/userId/{userId}/{logId}                   user index
//! audit/{recordId}/changes/{field}/{timestamp}    per-field history
//! security/{dateKey}/{key}                        security events
//! ```
//!
//! `dateKey` is the UTC calendar date of the entry's timestamp, which
//! bounds the cost of date-range scans to the partitions they touch.

use chrono::{DateTime, Utc};

use leadhub_core::types::{LogId, RecordId, UserId};

/// Root of the partitioned primary entries.
pub const LOGS_ROOT: &str = "logs";
/// Root of the secondary indices.
pub const INDEX_ROOT: &str = "index";
/// Root of the per-field audit tree.
pub const AUDIT_ROOT: &str = "audit";
/// Root of the partitioned security events.
pub const SECURITY_ROOT: &str = "security";

/// UTC calendar date partition key (`YYYY-MM-DD`).
pub fn date_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// ISO-8601 instant with millisecond precision, usable as a child key.
/// Lexicographic order of these keys is chronological order.
pub fn timestamp_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Path of one primary log entry.
pub fn log_entry(date_key: &str, log_id: &LogId) -> String {
    format!("{LOGS_ROOT}/{date_key}/{log_id}")
}

/// Path of one date partition of primary log entries.
pub fn log_partition(date_key: &str) -> String {
    format!("{LOGS_ROOT}/{date_key}")
}

/// Path of the recordId index for one record.
pub fn record_index(record_id: &RecordId) -> String {
    format!("{INDEX_ROOT}/recordId/{record_id}")
}

/// Path of one recordId index entry.
pub fn record_index_entry(record_id: &RecordId, log_id: &LogId) -> String {
    format!("{INDEX_ROOT}/recordId/{record_id}/{log_id}")
}

/// Path of the userId index for one user.
pub fn user_index(user_id: &UserId) -> String {
    format!("{INDEX_ROOT}/userId/{user_id}")
}

/// Path of one userId index entry.
pub fn user_index_entry(user_id: &UserId, log_id: &LogId) -> String {
    format!("{INDEX_ROOT}/userId/{user_id}/{log_id}")
}

/// Path of the per-field change tree of one record.
pub fn audit_changes(record_id: &RecordId) -> String {
    format!("{AUDIT_ROOT}/{record_id}/changes")
}

/// Path of one per-field audit change entry.
pub fn audit_change(record_id: &RecordId, field: &str, timestamp: &DateTime<Utc>) -> String {
    format!(
        "{AUDIT_ROOT}/{record_id}/changes/{field}/{}",
        timestamp_key(timestamp)
    )
}

/// Path of one date partition of security events.
pub fn security_partition(date_key: &str) -> String {
    format!("{SECURITY_ROOT}/{date_key}")
}

/// Path of one security event.
pub fn security_event(date_key: &str, key: &str) -> String {
    format!("{SECURITY_ROOT}/{date_key}/{key}")
}
