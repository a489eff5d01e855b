use super::metrics::BufferMetrics;
use crate::domain::LogEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::Notify;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Invalid buffer capacity")]
    InvalidCapacity,
}

/// Bounded FIFO buffer shared by producer call sites and the flush loop.
///
/// `enqueue` holds the lock only long enough to push one event, so it is safe
/// to call from any thread without stalling the caller. When the buffer is
/// full the incoming event is dropped silently: logging must never apply
/// backpressure to application code. The drop is counted in the metrics so
/// operators can discover the loss.
pub struct EventBuffer {
    queue: Mutex<VecDeque<LogEvent>>,
    capacity: usize,
    wakeup: Notify,
    // Atomic counters for lock-free metric reads
    enqueued: AtomicU64,
    dropped: AtomicU64,
    drained: AtomicU64,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity);
        }

        // Prevent excessive memory allocation
        if capacity > 100_000_000 {
            return Err(BufferError::InvalidCapacity);
        }

        Ok(Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
            wakeup: Notify::new(),
            enqueued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            drained: AtomicU64::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one event, dropping it silently when the buffer is full.
    ///
    /// Never blocks beyond the queue's critical section and never fails.
    pub fn enqueue(&self, event: LogEvent) {
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            queue.push_back(event);
        }
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        // Coalesced: repeated notifies before the consumer wakes store one permit
        self.wakeup.notify_one();
    }

    /// Atomically remove and return up to `max` oldest events.
    ///
    /// Returns an empty vec when the buffer is empty; never blocks.
    pub fn drain(&self, max: usize) -> Vec<LogEvent> {
        let mut queue = self.queue.lock();
        let count = max.min(queue.len());
        let batch: Vec<LogEvent> = queue.drain(..count).collect();
        drop(queue);

        self.drained.fetch_add(batch.len() as u64, Ordering::Relaxed);
        batch
    }

    /// Resolves after a subsequent `enqueue`, or immediately if one happened
    /// since the last wait. Used by the flush loop for size-based triggering.
    pub async fn wakeup(&self) {
        self.wakeup.notified().await;
    }

    pub fn metrics(&self) -> BufferMetrics {
        BufferMetrics {
            capacity: self.capacity,
            len: self.len(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EventBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("enqueued", &self.enqueued.load(Ordering::Relaxed))
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .field("drained", &self.drained.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    fn event(n: usize) -> LogEvent {
        LogEvent::new(Severity::Information, format!("event-{n}"))
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            EventBuffer::new(0),
            Err(BufferError::InvalidCapacity)
        ));
    }

    #[test]
    fn drain_preserves_enqueue_order() {
        let buffer = EventBuffer::new(8).unwrap();
        for n in 0..5 {
            buffer.enqueue(event(n));
        }

        let batch = buffer.drain(8);
        assert_eq!(batch.len(), 5);
        for (n, entry) in batch.iter().enumerate() {
            assert_eq!(entry.message_template, format!("event-{n}"));
        }
    }

    #[test]
    fn overflow_drops_newest_silently() {
        let buffer = EventBuffer::new(2).unwrap();
        for n in 0..5 {
            buffer.enqueue(event(n));
        }

        assert_eq!(buffer.len(), 2);
        let metrics = buffer.metrics();
        assert_eq!(metrics.enqueued, 2);
        assert_eq!(metrics.dropped, 3);

        let batch = buffer.drain(10);
        assert_eq!(batch[0].message_template, "event-0");
        assert_eq!(batch[1].message_template, "event-1");
    }

    #[test]
    fn empty_drain_returns_nothing() {
        let buffer = EventBuffer::new(4).unwrap();
        assert!(buffer.drain(4).is_empty());
        assert_eq!(buffer.metrics().drained, 0);
    }
}
