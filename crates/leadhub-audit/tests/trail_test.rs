//! Integration tests for audit trail reconstruction.

mod helpers;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use leadhub_audit::logger::{AuditLogger, LogContext};
use leadhub_audit::trail::{AuditTrailBuilder, TrailOptions};
use leadhub_core::traits::store::RecordStore;
use leadhub_core::types::{AuditChangeEntry, RecordId, UserContext, UserId};
use leadhub_store::MemoryStore;

use helpers::fast_config;

/// Write one audit change entry directly at its canonical path.
async fn seed_change(
    store: &MemoryStore,
    record_id: &str,
    field: &str,
    old_value: &str,
    new_value: &str,
    timestamp: DateTime<Utc>,
) {
    let change = AuditChangeEntry {
        field: field.to_string(),
        old_value: json!(old_value),
        new_value: json!(new_value),
        user_id: Some(UserId::new("u-1")),
        user_email: None,
        username: None,
        record_id: RecordId::new(record_id),
        timestamp,
        extra: serde_json::Map::new(),
    };
    let key = timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ");
    store
        .set(
            &format!("audit/{record_id}/changes/{field}/{key}"),
            serde_json::to_value(&change).expect("serialize"),
        )
        .await
        .expect("seed change");
}

async fn seed_history(store: &MemoryStore, record_id: &str) {
    seed_change(
        store,
        record_id,
        "status",
        "new",
        "contacted",
        Utc.with_ymd_and_hms(2026, 8, 4, 9, 0, 0).unwrap(),
    )
    .await;
    seed_change(
        store,
        record_id,
        "contact.name",
        "John",
        "Jane",
        Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap(),
    )
    .await;
    seed_change(
        store,
        record_id,
        "status",
        "contacted",
        "qualified",
        Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap(),
    )
    .await;
}

#[tokio::test]
async fn test_trail_is_chronological_across_fields() {
    let store = Arc::new(MemoryStore::new());
    seed_history(store.as_ref(), "lead-1").await;

    let trail = AuditTrailBuilder::new(store)
        .generate(&RecordId::new("lead-1"), TrailOptions::all())
        .await
        .expect("generate");

    // The two-level field/timestamp structure flattens into one list,
    // oldest first.
    assert_eq!(trail.len(), 3);
    let fields: Vec<_> = trail.iter().map(|change| change.field.as_str()).collect();
    assert_eq!(fields, vec!["status", "contact.name", "status"]);
    assert!(
        trail
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp),
        "trail must be non-decreasing by timestamp"
    );
}

#[tokio::test]
async fn test_trail_limit_keeps_most_recent_still_ascending() {
    let store = Arc::new(MemoryStore::new());
    seed_history(store.as_ref(), "lead-1").await;

    let trail = AuditTrailBuilder::new(store)
        .generate(&RecordId::new("lead-1"), TrailOptions::last(2))
        .await
        .expect("generate");

    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].field, "contact.name");
    assert_eq!(trail[1].field, "status");
    assert!(trail[0].timestamp <= trail[1].timestamp);
}

#[tokio::test]
async fn test_trail_date_filter_overrides_limit() {
    let store = Arc::new(MemoryStore::new());
    seed_history(store.as_ref(), "lead-1").await;

    let options = TrailOptions {
        limit: Some(1),
        start_date: Some(Utc.with_ymd_and_hms(2026, 8, 4, 0, 0, 0).unwrap()),
        end_date: Some(Utc.with_ymd_and_hms(2026, 8, 5, 23, 59, 59).unwrap()),
    };
    let trail = AuditTrailBuilder::new(store)
        .generate(&RecordId::new("lead-1"), options)
        .await
        .expect("generate");

    // Both changes inside the range come back; the limit is ignored.
    assert_eq!(trail.len(), 2);
}

#[tokio::test]
async fn test_trail_date_bounds_are_inclusive() {
    let store = Arc::new(MemoryStore::new());
    seed_history(store.as_ref(), "lead-1").await;

    let exact = Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap();
    let trail = AuditTrailBuilder::new(store)
        .generate(&RecordId::new("lead-1"), TrailOptions::between(exact, exact))
        .await
        .expect("generate");

    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].field, "contact.name");
}

#[tokio::test]
async fn test_trail_for_unknown_record_is_empty() {
    let store = Arc::new(MemoryStore::new());
    let trail = AuditTrailBuilder::new(store)
        .generate(&RecordId::new("nope"), TrailOptions::all())
        .await
        .expect("generate");
    assert!(trail.is_empty());
}

#[tokio::test]
async fn test_field_change_write_path_feeds_the_trail() {
    let store = Arc::new(MemoryStore::new());
    let logger = AuditLogger::new(store, fast_config());
    let record_id = RecordId::new("lead-9");
    let ctx = LogContext::for_user(UserContext::new("u-2", "u2@leadhub.test", "u2"));

    logger
        .log_field_change(
            &record_id,
            "contact.phone",
            Some(&json!("123")),
            Some(&json!("456")),
            ctx,
        )
        .await;

    let trail = logger
        .generate_audit_trail(&record_id, TrailOptions::all())
        .await;
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].field, "contact.phone");
    assert_eq!(trail[0].old_value, json!("123"));
    assert_eq!(trail[0].new_value, json!("456"));
    assert_eq!(
        trail[0].user_id.as_ref().map(UserId::as_str),
        Some("u-2")
    );
}
