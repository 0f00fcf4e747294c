//! Partitioned batch writer.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use leadhub_core::error::{AppError, ErrorKind};
use leadhub_core::result::AppResult;
use leadhub_core::traits::store::RecordStore;
use leadhub_core::types::{IndexEntry, LogEntry, LogId};

use crate::paths;

/// One queued log entry awaiting flush.
///
/// The `log_id` is generated when the entry is accepted and reused on
/// every retry, so replaying a batch overwrites the same keys instead of
/// duplicating entries.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Storage key of the entry.
    pub log_id: LogId,
    /// The entry itself.
    pub entry: LogEntry,
}

/// Turns a batch of log entries into one atomic multi-path store update.
///
/// Each entry contributes its primary path plus a recordId-index and a
/// userId-index path when those ids are present. All pairs across the
/// whole batch go into a single `update` call, so a flush either persists
/// every entry and its indices or none of them. The writer performs no
/// retries; failures are returned to the batch queue.
#[derive(Debug, Clone)]
pub struct PartitionedWriter {
    store: Arc<dyn RecordStore>,
}

impl PartitionedWriter {
    /// Create a writer against the given store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Build the multi-path update map for a batch.
    ///
    /// The date partition of every entry comes from the entry's own
    /// timestamp, so entries buffered across a UTC midnight land in the
    /// partition their timestamp names.
    pub fn build_updates(batch: &[BatchItem]) -> AppResult<HashMap<String, Value>> {
        let mut updates = HashMap::new();

        for item in batch {
            let date_key = paths::date_key(&item.entry.timestamp);
            updates.insert(
                paths::log_entry(&date_key, &item.log_id),
                serde_json::to_value(&item.entry)?,
            );

            let index = IndexEntry {
                timestamp: item.entry.timestamp,
                event_type: item.entry.event_type.clone(),
                date_key,
            };
            let index_value = serde_json::to_value(&index)?;

            if let Some(record_id) = &item.entry.record_id {
                updates.insert(
                    paths::record_index_entry(record_id, &item.log_id),
                    index_value.clone(),
                );
            }
            if let Some(user_id) = &item.entry.user_id {
                updates.insert(paths::user_index_entry(user_id, &item.log_id), index_value);
            }
        }

        Ok(updates)
    }

    /// Write a batch as one atomic multi-path update.
    pub async fn write(&self, batch: &[BatchItem]) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let updates = Self::build_updates(batch)?;
        self.store.update(updates).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Write,
                format!("Batch write of {} entries failed", batch.len()),
                e,
            )
        })?;

        debug!(entries = batch.len(), "Flushed log batch");
        Ok(())
    }
}
