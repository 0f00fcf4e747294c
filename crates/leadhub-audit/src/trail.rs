//! Chronological audit trail reconstruction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use leadhub_core::result::AppResult;
use leadhub_core::traits::store::RecordStore;
use leadhub_core::types::{AuditChangeEntry, RecordId};

use crate::paths;

/// Options narrowing an audit trail.
///
/// `limit` and the date bounds are mutually exclusive in practice: when
/// either bound is set, the trail is filtered by timestamp and the limit
/// is ignored.
#[derive(Debug, Clone, Default)]
pub struct TrailOptions {
    /// Keep only the last N changes (the most recent N, still oldest
    /// first). Ignored when a date bound is set.
    pub limit: Option<usize>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
}

impl TrailOptions {
    /// The whole trail.
    pub fn all() -> Self {
        Self::default()
    }

    /// The most recent `n` changes, oldest first.
    pub fn last(n: usize) -> Self {
        Self {
            limit: Some(n),
            ..Self::default()
        }
    }

    /// Changes whose timestamp falls within `[start, end]`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }
}

/// Reconstructs the per-field change history of one record.
///
/// Reads the record's whole audit subtree and flattens the two-level
/// field/timestamp structure into one list sorted by timestamp
/// **ascending**, the inverse of [`LogQuery`](crate::query::LogQuery)
/// ordering: this builder exists for chronological playback rather than
/// recent-activity lookup.
#[derive(Debug, Clone)]
pub struct AuditTrailBuilder {
    store: Arc<dyn RecordStore>,
}

impl AuditTrailBuilder {
    /// Create a trail builder against the given store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Reconstruct the chronological change history of a record.
    pub async fn generate(
        &self,
        record_id: &RecordId,
        options: TrailOptions,
    ) -> AppResult<Vec<AuditChangeEntry>> {
        let Some(subtree) = self.store.get(&paths::audit_changes(record_id)).await? else {
            return Ok(Vec::new());
        };
        let Some(fields) = subtree.as_object() else {
            return Ok(Vec::new());
        };

        let mut changes = Vec::new();
        for (field, timestamps) in fields {
            let Some(timestamps) = timestamps.as_object() else {
                continue;
            };
            for (key, value) in timestamps {
                match serde_json::from_value::<AuditChangeEntry>(value.clone()) {
                    Ok(change) => changes.push(change),
                    Err(e) => {
                        warn!(%field, %key, error = %e, "Skipping malformed audit change");
                    }
                }
            }
        }

        changes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        if options.start_date.is_some() || options.end_date.is_some() {
            let start = options.start_date.unwrap_or(DateTime::<Utc>::MIN_UTC);
            let end = options.end_date.unwrap_or_else(Utc::now);
            changes.retain(|change| change.timestamp >= start && change.timestamp <= end);
        } else if let Some(limit) = options.limit {
            if changes.len() > limit {
                changes.drain(..changes.len() - limit);
            }
        }

        Ok(changes)
    }
}
