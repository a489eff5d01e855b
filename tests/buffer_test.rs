use ingest_log_forwarder::buffer::{BufferError, EventBuffer};
use ingest_log_forwarder::domain::{LogEvent, Severity};
use std::sync::Arc;
use std::thread;
use tokio::time::{Duration, timeout};

fn event(n: usize) -> LogEvent {
    LogEvent::new(Severity::Information, format!("message-{n}"))
}

#[test]
fn test_drain_returns_all_events_in_enqueue_order() {
    let buffer = EventBuffer::new(100).unwrap();
    for n in 0..50 {
        buffer.enqueue(event(n));
    }

    let batch = buffer.drain(100);
    assert_eq!(batch.len(), 50);
    for (n, entry) in batch.iter().enumerate() {
        assert_eq!(entry.message_template, format!("message-{n}"));
    }
    assert!(buffer.is_empty());
}

#[test]
fn test_overflow_drops_excess_without_failing() {
    let buffer = EventBuffer::new(10).unwrap();
    for n in 0..25 {
        // Must never fail or panic at the call site, full or not
        buffer.enqueue(event(n));
    }

    let metrics = buffer.metrics();
    assert_eq!(metrics.len, 10);
    assert_eq!(metrics.enqueued, 10);
    assert_eq!(metrics.dropped, 15);

    // Dropped events never appear in any subsequent drain
    let batch = buffer.drain(25);
    assert_eq!(batch.len(), 10);
    for (n, entry) in batch.iter().enumerate() {
        assert_eq!(entry.message_template, format!("message-{n}"));
    }
    assert!(buffer.drain(25).is_empty());
}

#[test]
fn test_empty_drain_returns_immediately() {
    let buffer = EventBuffer::new(10).unwrap();
    assert!(buffer.drain(10).is_empty());
}

#[test]
fn test_partial_drains_preserve_order_across_calls() {
    let buffer = EventBuffer::new(100).unwrap();
    for n in 0..10 {
        buffer.enqueue(event(n));
    }

    let first = buffer.drain(4);
    let second = buffer.drain(4);
    let third = buffer.drain(4);

    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 4);
    assert_eq!(third.len(), 2);
    assert_eq!(first[0].message_template, "message-0");
    assert_eq!(second[0].message_template, "message-4");
    assert_eq!(third[1].message_template, "message-9");
}

#[test]
fn test_invalid_capacity_is_rejected() {
    assert!(matches!(
        EventBuffer::new(0),
        Err(BufferError::InvalidCapacity)
    ));
    assert!(matches!(
        EventBuffer::new(200_000_000),
        Err(BufferError::InvalidCapacity)
    ));
}

#[test]
fn test_concurrent_producers_never_exceed_capacity() {
    let buffer = Arc::new(EventBuffer::new(500).unwrap());
    let producers = 8;
    let per_producer = 200;

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for n in 0..per_producer {
                    buffer.enqueue(event(p * per_producer + n));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let metrics = buffer.metrics();
    assert!(metrics.len <= 500);
    assert_eq!(
        metrics.enqueued + metrics.dropped,
        (producers * per_producer) as u64
    );
    assert_eq!(metrics.enqueued, 500);
}

#[tokio::test]
async fn test_wakeup_resolves_after_enqueue() {
    let buffer = Arc::new(EventBuffer::new(10).unwrap());

    buffer.enqueue(event(0));
    // Permit stored by the enqueue above: resolves immediately
    timeout(Duration::from_millis(100), buffer.wakeup())
        .await
        .expect("wakeup should resolve after an enqueue");
}
