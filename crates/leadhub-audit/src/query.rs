//! Index- and partition-based log entry lookups.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use leadhub_core::config::query::QueryConfig;
use leadhub_core::result::AppResult;
use leadhub_core::traits::store::{RangeQuery, RecordStore};
use leadhub_core::types::{IndexEntry, LogEntry, LogId, RecordId, UserId};

use crate::paths;

/// Read side of the log store.
///
/// Every lookup returns entries sorted by timestamp descending (newest
/// first) and reports store failures as typed errors. The
/// [`AuditLogger`](crate::logger::AuditLogger) facade wraps these in
/// fail-open variants that swallow errors to an empty list for UI
/// callers.
#[derive(Debug, Clone)]
pub struct LogQuery {
    store: Arc<dyn RecordStore>,
    config: QueryConfig,
}

impl LogQuery {
    /// Create a query engine against the given store.
    pub fn new(store: Arc<dyn RecordStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// The most recent entries touching a record, newest first.
    pub async fn by_record_id(
        &self,
        record_id: &RecordId,
        limit: usize,
    ) -> AppResult<Vec<LogEntry>> {
        self.by_index(&paths::record_index(record_id), limit).await
    }

    /// The most recent entries made by a user, newest first.
    pub async fn by_user_id(&self, user_id: &UserId, limit: usize) -> AppResult<Vec<LogEntry>> {
        self.by_index(&paths::user_index(user_id), limit).await
    }

    /// Resolve up to `limit` of the most recent index entries under
    /// `index_path` into their primary log entries.
    async fn by_index(&self, index_path: &str, limit: usize) -> AppResult<Vec<LogEntry>> {
        let rows = self
            .store
            .query_range(index_path, RangeQuery::by_key().limit_to_last(limit))
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for (log_id, value) in rows {
            let index: IndexEntry = match serde_json::from_value(value) {
                Ok(index) => index,
                Err(e) => {
                    warn!(%log_id, error = %e, "Skipping malformed index entry");
                    continue;
                }
            };

            let path = paths::log_entry(&index.date_key, &LogId::new(log_id.clone()));
            match self.store.get(&path).await? {
                Some(value) => match serde_json::from_value::<LogEntry>(value) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => warn!(%log_id, error = %e, "Skipping malformed log entry"),
                },
                // The atomic multi-path write makes this unreachable
                // through the engine itself, but the store is shared.
                None => warn!(%log_id, "Index points at a missing log entry"),
            }
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Entries whose timestamp falls within `[start, end]`, newest first.
    ///
    /// Walks one date partition per calendar day in the range; no index
    /// is needed because the date is the partition key.
    pub async fn by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut date = start.date_naive();
        let last = end.date_naive();

        while date <= last {
            let partition = paths::log_partition(&date.format("%Y-%m-%d").to_string());
            let rows = self
                .store
                .query_range(&partition, RangeQuery::by_key().limit_to_last(limit))
                .await?;

            for (log_id, value) in rows {
                match serde_json::from_value::<LogEntry>(value) {
                    Ok(entry) if entry.timestamp >= start && entry.timestamp <= end => {
                        entries.push(entry);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(%log_id, error = %e, "Skipping malformed log entry"),
                }
            }

            let Some(next) = date.succ_opt() else { break };
            date = next;
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    /// The most recent entries of one event type, newest first.
    ///
    /// There is no event-type index; this scans the configured recent
    /// window with an oversampled limit and filters client-side, so it
    /// promises nothing beyond that window.
    pub async fn by_event_type(&self, event_type: &str, limit: usize) -> AppResult<Vec<LogEntry>> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(self.config.event_scan_days));

        let mut entries = self
            .by_date_range(start, end, limit.saturating_mul(10))
            .await?;
        entries.retain(|entry| entry.event_type == event_type);
        entries.truncate(limit);
        Ok(entries)
    }

    /// The configured default limit for index-based lookups.
    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    /// The configured default limit for date-range scans.
    pub fn date_range_limit(&self) -> usize {
        self.config.date_range_limit
    }
}
