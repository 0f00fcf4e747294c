//! Integration tests for the batch queue's debounce, trip-wire, and
//! retry behavior. Timer-sensitive tests run on paused tokio time.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use leadhub_audit::queue::BatchQueue;
use leadhub_audit::writer::{BatchItem, PartitionedWriter};
use leadhub_core::traits::store::RecordStore;
use leadhub_core::types::LogId;
use leadhub_store::MemoryStore;

use helpers::{FlakyStore, count_log_entries, fast_config, make_entry};

fn queue_for(store: Arc<dyn RecordStore>) -> BatchQueue {
    let config = fast_config();
    BatchQueue::new(
        PartitionedWriter::new(store),
        config.batch,
        config.retry,
    )
}

fn item(store: &dyn RecordStore, record_id: &str) -> BatchItem {
    BatchItem {
        log_id: LogId::new(store.generate_key("logs")),
        entry: make_entry("field_changed", Some(record_id), Some("u-1"), Utc::now()),
    }
}

#[tokio::test(start_paused = true)]
async fn test_debounce_flushes_after_delay() {
    let store = Arc::new(MemoryStore::new());
    let queue = queue_for(store.clone());

    queue.enqueue(item(store.as_ref(), "lead-1")).await;
    queue.enqueue(item(store.as_ref(), "lead-2")).await;

    // Inside the debounce window nothing is written yet.
    assert_eq!(count_log_entries(store.as_ref()).await, 0);
    assert_eq!(queue.len().await, 2);

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(count_log_entries(store.as_ref()).await, 2);
    assert!(queue.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_rearms_debounce_timer() {
    let store = Arc::new(MemoryStore::new());
    let queue = queue_for(store.clone());

    queue.enqueue(item(store.as_ref(), "lead-1")).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Re-arms the timer: the original 50ms deadline no longer applies.
    queue.enqueue(item(store.as_ref(), "lead-2")).await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(count_log_entries(store.as_ref()).await, 0);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(count_log_entries(store.as_ref()).await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_size_trip_wire_flushes_immediately() {
    let store = Arc::new(MemoryStore::new());
    let queue = queue_for(store.clone());

    // fast_config sets max_size = 5: the fifth enqueue trips the flush
    // without waiting for the timer.
    for i in 0..5 {
        queue.enqueue(item(store.as_ref(), &format!("lead-{i}"))).await;
    }

    assert_eq!(count_log_entries(store.as_ref()).await, 5);
    assert!(queue.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_overfull_window_yields_one_immediate_flush() {
    let store = Arc::new(MemoryStore::new());
    let queue = queue_for(store.clone());

    for i in 0..6 {
        queue.enqueue(item(store.as_ref(), &format!("lead-{i}"))).await;
    }

    // The trip-wire flushed the first five; the sixth waits for its own
    // debounce window.
    assert_eq!(count_log_entries(store.as_ref()).await, 5);
    assert_eq!(queue.len().await, 1);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(count_log_entries(store.as_ref()).await, 6);
}

#[tokio::test(start_paused = true)]
async fn test_failed_flush_retries_until_store_recovers() {
    let store = Arc::new(FlakyStore::failing_updates(2));
    let queue = queue_for(store.clone());

    queue.enqueue(item(store.as_ref(), "lead-1")).await;

    // First flush fails, entry goes back to the front of the queue.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(count_log_entries(store.as_ref()).await, 0);
    assert_eq!(queue.len().await, 1);

    // Second attempt (after backoff) fails too.
    tokio::time::sleep(Duration::from_millis(110)).await;
    assert_eq!(count_log_entries(store.as_ref()).await, 0);

    // Third attempt succeeds.
    tokio::time::sleep(Duration::from_millis(110)).await;
    assert_eq!(count_log_entries(store.as_ref()).await, 1);
    assert!(queue.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_entries_enqueued_during_outage_survive() {
    let store = Arc::new(FlakyStore::failing_updates(1));
    let queue = queue_for(store.clone());

    queue.enqueue(item(store.as_ref(), "lead-1")).await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    // The failed batch is queued again; new entries join behind it.
    queue.enqueue(item(store.as_ref(), "lead-2")).await;
    assert_eq!(queue.len().await, 2);

    tokio::time::sleep(Duration::from_millis(110)).await;
    assert_eq!(count_log_entries(store.as_ref()).await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_cap_dead_letters_batch() {
    let store = Arc::new(FlakyStore::failing_updates(u32::MAX));
    let config = fast_config();
    let mut retry = config.retry;
    retry.max_attempts = Some(2);
    let queue = BatchQueue::new(
        PartitionedWriter::new(store.clone() as Arc<dyn RecordStore>),
        config.batch,
        retry,
    );

    queue.enqueue(item(store.as_ref(), "lead-1")).await;

    // Two failed attempts exhaust the cap.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(queue.is_empty().await);
    let dead = queue.take_dead_letters().await;
    assert_eq!(dead.len(), 1);
    assert_eq!(
        dead[0].entry.record_id.as_ref().map(|id| id.as_str()),
        Some("lead-1")
    );
    // Taking the dead letters drains the buffer.
    assert!(queue.take_dead_letters().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_close_drains_pending_entries() {
    let store = Arc::new(MemoryStore::new());
    let queue = queue_for(store.clone());

    queue.enqueue(item(store.as_ref(), "lead-1")).await;
    queue.close().await;

    assert_eq!(count_log_entries(store.as_ref()).await, 1);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_flush_on_empty_queue_is_a_noop() {
    let store = Arc::new(MemoryStore::new());
    let queue = queue_for(store.clone());

    queue.flush().await;
    assert_eq!(count_log_entries(store.as_ref()).await, 0);
}
