//! Batch queue with debounce, size trip-wire, and retry.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use leadhub_core::config::batch::BatchConfig;
use leadhub_core::config::retry::RetryConfig;

use crate::writer::{BatchItem, PartitionedWriter};

/// In-process buffer of pending log entries.
///
/// Entries accumulate until the debounce window elapses or the queue
/// reaches its maximum size, then the whole buffer flushes as one atomic
/// write. A failed flush puts the batch back at the front of the queue in
/// its original order and retries after a backoff. With the default
/// policy this repeats until the store recovers, so an accepted entry is
/// delivered at least once; a configured retry cap moves the batch to the
/// dead-letter buffer instead.
#[derive(Debug, Clone)]
pub struct BatchQueue {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    writer: PartitionedWriter,
    batch: BatchConfig,
    retry: RetryConfig,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<BatchItem>,
    timer: Option<JoinHandle<()>>,
    flushing: bool,
    failed_attempts: u32,
    dead_letters: Vec<BatchItem>,
}

impl BatchQueue {
    /// Create a queue that flushes through the given writer.
    pub fn new(writer: PartitionedWriter, batch: BatchConfig, retry: RetryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                writer,
                batch,
                retry,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Append an entry and schedule a flush.
    ///
    /// Returns as soon as the entry is buffered; the write itself happens
    /// on the debounce timer, except when the queue reaches its maximum
    /// size, which flushes immediately.
    pub async fn enqueue(&self, item: BatchItem) {
        let flush_now = {
            let mut state = self.inner.state.lock().await;
            state.pending.push_back(item);
            if state.pending.len() >= self.inner.batch.max_size {
                Inner::cancel_timer(&mut state);
                true
            } else {
                Inner::arm_timer(&self.inner, &mut state);
                false
            }
        };

        if flush_now {
            Inner::flush(&self.inner).await;
        }
    }

    /// Number of entries waiting for a flush.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    /// Whether the queue has no pending entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Flush the currently buffered batch.
    ///
    /// A no-op when the buffer is empty or another flush is in flight.
    pub async fn flush(&self) {
        Inner::flush(&self.inner).await;
    }

    /// Cancel the debounce timer and attempt a final drain.
    ///
    /// Entries the drain cannot write stay queued and are reported; a
    /// process exiting at that point loses them.
    pub async fn close(&self) {
        {
            let mut state = self.inner.state.lock().await;
            Inner::cancel_timer(&mut state);
        }
        Inner::flush(&self.inner).await;

        let state = self.inner.state.lock().await;
        if !state.pending.is_empty() {
            warn!(
                pending = state.pending.len(),
                "Batch queue closed with undelivered entries"
            );
        }
    }

    /// Remove and return the entries dead-lettered by the retry cap.
    pub async fn take_dead_letters(&self) -> Vec<BatchItem> {
        let mut state = self.inner.state.lock().await;
        std::mem::take(&mut state.dead_letters)
    }
}

impl Inner {
    fn cancel_timer(state: &mut State) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Schedule a retry flush after the configured backoff.
    fn schedule_retry(inner: &Arc<Inner>) {
        let backoff = Duration::from_millis(inner.retry.backoff_ms);
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            tokio::time::sleep(backoff).await;
            Inner::flush(&inner).await;
        });
    }

    /// (Re)arm the debounce timer. Every enqueue pushes the deadline out.
    fn arm_timer(inner: &Arc<Inner>, state: &mut State) {
        Self::cancel_timer(state);
        let delay = Duration::from_millis(inner.batch.delay_ms);
        let inner = Arc::clone(inner);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            Inner::flush(&inner).await;
        }));
    }

    /// Flush the buffered batch.
    ///
    /// Single-flight: a call while another flush is in flight returns
    /// immediately, and entries enqueued meanwhile ride the next batch.
    async fn flush(inner: &Arc<Inner>) {
        let batch: Vec<BatchItem> = {
            let mut state = inner.state.lock().await;
            if state.flushing || state.pending.is_empty() {
                return;
            }
            state.flushing = true;
            Self::cancel_timer(&mut state);
            state.pending.drain(..).collect()
        };

        let result = inner.writer.write(&batch).await;

        let mut state = inner.state.lock().await;
        state.flushing = false;

        match result {
            Ok(()) => {
                state.failed_attempts = 0;
                debug!(entries = batch.len(), "Processed log batch");
            }
            Err(e) => {
                state.failed_attempts += 1;
                warn!(
                    entries = batch.len(),
                    attempt = state.failed_attempts,
                    error = %e,
                    "Batch flush failed"
                );

                if inner
                    .retry
                    .max_attempts
                    .is_some_and(|max| state.failed_attempts >= max)
                {
                    error!(
                        entries = batch.len(),
                        attempts = state.failed_attempts,
                        "Retry attempts exhausted, dead-lettering batch"
                    );
                    state.dead_letters.extend(batch);
                    state.failed_attempts = 0;
                } else {
                    // Back to the front of the queue, original order intact.
                    for item in batch.into_iter().rev() {
                        state.pending.push_front(item);
                    }
                    Self::schedule_retry(inner);
                }
            }
        }
    }
}
