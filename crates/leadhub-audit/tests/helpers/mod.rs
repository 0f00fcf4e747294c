//! Shared test helpers for audit engine integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use leadhub_audit::writer::{BatchItem, PartitionedWriter};
use leadhub_core::config::AuditConfig;
use leadhub_core::error::AppError;
use leadhub_core::result::AppResult;
use leadhub_core::traits::store::{RangeQuery, RecordStore};
use leadhub_core::types::{FieldChange, LogEntry, LogId, LogMetadata, RecordId, Severity, UserId};
use leadhub_store::MemoryStore;

/// A store that can be told to fail writes a number of times, or to fail
/// all reads, to exercise the retry and fail-open paths.
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_updates: AtomicU32,
    failing_reads: AtomicBool,
}

impl FlakyStore {
    /// A store whose next `failing_updates` multi-path updates fail.
    pub fn failing_updates(failing_updates: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_updates: AtomicU32::new(failing_updates),
            failing_reads: AtomicBool::new(false),
        }
    }

    /// A store whose reads all fail.
    pub fn failing_reads() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_updates: AtomicU32::new(0),
            failing_reads: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(AppError::query("Simulated read outage"));
        }
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> AppResult<()> {
        self.inner.set(path, value).await
    }

    async fn update(&self, updates: HashMap<String, Value>) -> AppResult<()> {
        let remaining = self.failing_updates.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_updates.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::write("Simulated store outage"));
        }
        self.inner.update(updates).await
    }

    fn generate_key(&self, path: &str) -> String {
        self.inner.generate_key(path)
    }

    async fn query_range(&self, path: &str, query: RangeQuery) -> AppResult<Vec<(String, Value)>> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(AppError::query("Simulated read outage"));
        }
        self.inner.query_range(path, query).await
    }
}

/// Configuration with short timers so tests stay fast.
pub fn fast_config() -> AuditConfig {
    let mut config = AuditConfig::default();
    config.batch.delay_ms = 50;
    config.batch.max_size = 5;
    config.retry.backoff_ms = 100;
    config
}

/// A log entry with one field change, for direct writer/queue tests.
pub fn make_entry(
    event_type: &str,
    record_id: Option<&str>,
    user_id: Option<&str>,
    timestamp: DateTime<Utc>,
) -> LogEntry {
    LogEntry {
        event_type: event_type.to_string(),
        severity: Severity::Info,
        timestamp,
        user_id: user_id.map(UserId::new),
        user_email: None,
        username: None,
        record_id: record_id.map(RecordId::new),
        record_type: "lead".to_string(),
        changes: vec![FieldChange {
            field: "status".to_string(),
            old_value: json!("new"),
            new_value: json!("contacted"),
            timestamp,
        }],
        change_count: 1,
        metadata: LogMetadata::default(),
    }
}

/// Write entries through the partitioned writer, returning their log ids.
pub async fn seed_entries(store: &Arc<MemoryStore>, entries: Vec<LogEntry>) -> Vec<LogId> {
    let writer = PartitionedWriter::new(Arc::clone(store) as Arc<dyn RecordStore>);
    let batch: Vec<BatchItem> = entries
        .into_iter()
        .map(|entry| BatchItem {
            log_id: LogId::new(store.generate_key("logs")),
            entry,
        })
        .collect();
    writer.write(&batch).await.expect("seed write");
    batch.into_iter().map(|item| item.log_id).collect()
}

/// Total number of primary log entries across all date partitions.
pub async fn count_log_entries(store: &dyn RecordStore) -> usize {
    match store.get("logs").await.expect("read logs root") {
        Some(Value::Object(partitions)) => partitions
            .values()
            .filter_map(Value::as_object)
            .map(|entries| entries.len())
            .sum(),
        _ => 0,
    }
}
