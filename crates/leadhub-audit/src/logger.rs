//! The audit logger facade.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use leadhub_core::config::AuditConfig;
use leadhub_core::traits::store::RecordStore;
use leadhub_core::types::{
    AuditChangeEntry, LogEntry, LogId, LogMetadata, RecordId, Severity, UserContext, UserId,
};

use crate::detector::ChangeDetector;
use crate::paths;
use crate::query::LogQuery;
use crate::queue::BatchQueue;
use crate::trail::{AuditTrailBuilder, TrailOptions};
use crate::writer::{BatchItem, PartitionedWriter};

/// Per-call context describing who made a change and where it came from.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    /// The user attributed to the change.
    pub user: UserContext,
    /// Kind of record being changed. Defaults to `lead`.
    pub record_type: Option<String>,
    /// Origin of the change (`inline_edit`, `bulk_edit`, ...). Defaults
    /// to `unknown`.
    pub source: Option<String>,
    /// Browser session the change was made in.
    pub session_id: Option<String>,
    /// Severity recorded on the entry.
    pub severity: Severity,
    /// Additional metadata keys persisted with the entry.
    pub extra: Map<String, Value>,
}

impl LogContext {
    /// Context attributing the change to `user`.
    pub fn for_user(user: UserContext) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    /// Set the record type.
    pub fn record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Set the change origin.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the browser session id.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the entry severity.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach an extra metadata key.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Everything that needs an attached store.
#[derive(Debug)]
pub(crate) struct Components {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) queue: BatchQueue,
    pub(crate) query: LogQuery,
    pub(crate) trail: AuditTrailBuilder,
}

/// Facade over the whole audit engine.
///
/// Owns the batch queue lifecycle and applies the fail-open policy: on a
/// logger without a store, and on any query failure, the facade logs a
/// warning and carries on, so an audit problem never interrupts the
/// caller's business operation. Callers that need to distinguish
/// failures from empty history use the typed components via
/// [`queries`](Self::queries) and [`trail_builder`](Self::trail_builder).
#[derive(Debug)]
pub struct AuditLogger {
    components: Option<Components>,
    detector: ChangeDetector,
    config: AuditConfig,
}

impl AuditLogger {
    /// Create a logger writing to `store`.
    pub fn new(store: Arc<dyn RecordStore>, config: AuditConfig) -> Self {
        let writer = PartitionedWriter::new(Arc::clone(&store));
        let queue = BatchQueue::new(writer, config.batch.clone(), config.retry.clone());
        let query = LogQuery::new(Arc::clone(&store), config.query.clone());
        let trail = AuditTrailBuilder::new(Arc::clone(&store));

        Self {
            components: Some(Components {
                store,
                queue,
                query,
                trail,
            }),
            detector: ChangeDetector::new(config.redaction.clone()),
            config,
        }
    }

    /// Create a logger with no store attached.
    ///
    /// Deployments without a configured store still construct a logger:
    /// every write is skipped with a warning and every query returns
    /// empty.
    pub fn disabled() -> Self {
        Self {
            components: None,
            detector: ChangeDetector::default(),
            config: AuditConfig::default(),
        }
    }

    /// Whether a store is attached.
    pub fn is_enabled(&self) -> bool {
        self.components.is_some()
    }

    /// The change detector in use.
    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// The typed query engine, when a store is attached.
    pub fn queries(&self) -> Option<&LogQuery> {
        self.components.as_ref().map(|c| &c.query)
    }

    /// The typed trail builder, when a store is attached.
    pub fn trail_builder(&self) -> Option<&AuditTrailBuilder> {
        self.components.as_ref().map(|c| &c.trail)
    }

    /// The batch queue, when a store is attached.
    pub fn queue(&self) -> Option<&BatchQueue> {
        self.components.as_ref().map(|c| &c.queue)
    }

    pub(crate) fn components(&self) -> Option<&Components> {
        self.components.as_ref()
    }

    pub(crate) fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Diff two record snapshots and enqueue a log entry for the result.
    ///
    /// Returns the number of detected field changes. An empty diff
    /// constructs and writes nothing.
    pub async fn log_field_changes(
        &self,
        event_type: &str,
        record_id: &RecordId,
        before: &Value,
        after: &Value,
        ctx: LogContext,
    ) -> usize {
        let Some(components) = &self.components else {
            warn!("Audit logger has no store attached, skipping field change log");
            return 0;
        };

        let changes = self.detector.detect(before, after);
        if changes.is_empty() {
            return 0;
        }
        let change_count = changes.len();

        let entry = LogEntry {
            event_type: event_type.to_string(),
            severity: ctx.severity,
            timestamp: Utc::now(),
            user_id: ctx.user.user_id.clone(),
            user_email: ctx.user.email.clone(),
            username: ctx.user.username.clone(),
            record_id: Some(record_id.clone()),
            record_type: ctx.record_type.unwrap_or_else(|| "lead".to_string()),
            changes,
            change_count,
            metadata: LogMetadata {
                source: ctx.source.unwrap_or_else(|| "unknown".to_string()),
                session_id: ctx.session_id,
                extra: ctx.extra,
            },
        };

        let log_id = LogId::new(components.store.generate_key(paths::LOGS_ROOT));
        components.queue.enqueue(BatchItem { log_id, entry }).await;
        change_count
    }

    /// Write one standalone per-field change to the record's audit path.
    ///
    /// This is the fine-grained write path consumed by
    /// [`generate_audit_trail`](Self::generate_audit_trail); it is
    /// independent of the batched log entry mechanism and is written
    /// immediately.
    pub async fn log_field_change(
        &self,
        record_id: &RecordId,
        field: &str,
        old_value: Option<&Value>,
        new_value: Option<&Value>,
        ctx: LogContext,
    ) {
        let Some(components) = &self.components else {
            warn!("Audit logger has no store attached, skipping field change log");
            return;
        };

        let timestamp = Utc::now();
        let change = AuditChangeEntry {
            field: field.to_string(),
            old_value: self.detector.serialize(field, old_value),
            new_value: self.detector.serialize(field, new_value),
            user_id: ctx.user.user_id.clone(),
            user_email: ctx.user.email.clone(),
            username: ctx.user.username.clone(),
            record_id: record_id.clone(),
            timestamp,
            extra: ctx.extra,
        };

        let path = paths::audit_change(record_id, field, &timestamp);
        match serde_json::to_value(&change) {
            Ok(value) => {
                if let Err(e) = components.store.set(&path, value).await {
                    warn!(record_id = %record_id, field, error = %e, "Failed to write audit change");
                }
            }
            Err(e) => {
                warn!(record_id = %record_id, field, error = %e, "Failed to serialize audit change");
            }
        }
    }

    /// Recent entries touching a record, newest first. Fail-open.
    pub async fn query_by_record_id(
        &self,
        record_id: &RecordId,
        limit: Option<usize>,
    ) -> Vec<LogEntry> {
        let Some(components) = &self.components else {
            warn!("Audit logger has no store attached, returning empty result");
            return Vec::new();
        };
        let limit = limit.unwrap_or(self.config.query.default_limit);
        match components.query.by_record_id(record_id, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(record_id = %record_id, error = %e, "Record history query failed");
                Vec::new()
            }
        }
    }

    /// Recent entries made by a user, newest first. Fail-open.
    pub async fn query_by_user_id(&self, user_id: &UserId, limit: Option<usize>) -> Vec<LogEntry> {
        let Some(components) = &self.components else {
            warn!("Audit logger has no store attached, returning empty result");
            return Vec::new();
        };
        let limit = limit.unwrap_or(self.config.query.default_limit);
        match components.query.by_user_id(user_id, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "User history query failed");
                Vec::new()
            }
        }
    }

    /// Entries within `[start, end]`, newest first. Fail-open.
    pub async fn query_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Vec<LogEntry> {
        let Some(components) = &self.components else {
            warn!("Audit logger has no store attached, returning empty result");
            return Vec::new();
        };
        let limit = limit.unwrap_or(self.config.query.date_range_limit);
        match components.query.by_date_range(start, end, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Date range query failed");
                Vec::new()
            }
        }
    }

    /// Recent entries of one event type, newest first. Fail-open.
    pub async fn query_by_event_type(
        &self,
        event_type: &str,
        limit: Option<usize>,
    ) -> Vec<LogEntry> {
        let Some(components) = &self.components else {
            warn!("Audit logger has no store attached, returning empty result");
            return Vec::new();
        };
        let limit = limit.unwrap_or(self.config.query.default_limit);
        match components.query.by_event_type(event_type, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(event_type, error = %e, "Event type query failed");
                Vec::new()
            }
        }
    }

    /// Chronological change history of a record, oldest first. Fail-open.
    pub async fn generate_audit_trail(
        &self,
        record_id: &RecordId,
        options: TrailOptions,
    ) -> Vec<AuditChangeEntry> {
        let Some(components) = &self.components else {
            warn!("Audit logger has no store attached, returning empty result");
            return Vec::new();
        };
        match components.trail.generate(record_id, options).await {
            Ok(changes) => changes,
            Err(e) => {
                warn!(record_id = %record_id, error = %e, "Audit trail generation failed");
                Vec::new()
            }
        }
    }

    /// Flush any buffered entries now.
    pub async fn flush(&self) {
        if let Some(components) = &self.components {
            components.queue.flush().await;
        }
    }

    /// Drain the queue before shutdown.
    pub async fn close(&self) {
        if let Some(components) = &self.components {
            components.queue.close().await;
        }
    }
}
