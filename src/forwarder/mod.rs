//! The forwarder facade and its background flush loop.
//!
//! Producers only ever touch the bounded buffer; the flush loop owns all
//! network I/O. The two meet nowhere else, so a slow or unreachable ingest
//! endpoint can never stall a logging call site.

use crate::app::{Config, ConfigError};
use crate::buffer::{BufferError, BufferMetrics, EventBuffer};
use crate::domain::LogEvent;
use crate::reporter::{self, FailureReporter};
use crate::sender::{DeliveryClient, DeliveryError, MessageFormatter};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Handle to the running flush loop, consumed by the first shutdown.
struct FlushHandle {
    cancel: CancellationToken,
    done: oneshot::Receiver<()>,
}

/// Accumulates submitted events and delivers them in the background.
///
/// Construction validates the configuration and spawns the flush loop, so a
/// tokio runtime must be current. `submit` is the entire producer surface:
/// it never blocks meaningfully, never fails, and performs no I/O.
pub struct Forwarder {
    buffer: Arc<EventBuffer>,
    handle: Mutex<Option<FlushHandle>>,
}

impl Forwarder {
    /// Create a forwarder reporting delivery failures to the process-wide
    /// stderr reporter.
    pub fn new(config: Config) -> Result<Self, ForwarderError> {
        Self::with_reporter(config, reporter::shared_reporter())
    }

    pub fn with_reporter(
        config: Config,
        reporter: Arc<dyn FailureReporter>,
    ) -> Result<Self, ForwarderError> {
        Self::with_formatter(config, reporter, None)
    }

    /// Full construction surface: reporter plus an optional formatting
    /// strategy that replaces the default template rendering.
    pub fn with_formatter(
        mut config: Config,
        reporter: Arc<dyn FailureReporter>,
        formatter: Option<MessageFormatter>,
    ) -> Result<Self, ForwarderError> {
        config.post_process()?;
        config.validate()?;

        let client = DeliveryClient::with_formatter(&config, formatter)?;
        let buffer = Arc::new(EventBuffer::new(config.buffer_capacity)?);

        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = oneshot::channel();

        let flush_loop = FlushLoop {
            buffer: Arc::clone(&buffer),
            client,
            reporter,
            max_batch_size: config.max_batch_size,
            period: config.flush_interval,
        };
        tokio::spawn(flush_loop.run(cancel.clone(), done_tx));

        info!(
            "forwarder started (endpoint={}, capacity={}, max_batch={}, period={:?})",
            config.endpoint_template, config.buffer_capacity, config.max_batch_size,
            config.flush_interval
        );

        Ok(Self {
            buffer,
            handle: Mutex::new(Some(FlushHandle {
                cancel,
                done: done_rx,
            })),
        })
    }

    /// Submit one event for delivery. Fire-and-forget: the event is either
    /// queued or, when the buffer is full, dropped silently.
    pub fn submit(&self, event: LogEvent) {
        self.buffer.enqueue(event);
    }

    pub fn buffer_metrics(&self) -> BufferMetrics {
        self.buffer.metrics()
    }

    /// Stop the flush loop and deliver everything still buffered.
    ///
    /// Does not return until the final drain's delivery attempts have
    /// completed or definitively failed. Idempotent: later calls (including
    /// concurrent ones) return once the first drain is done.
    pub async fn shutdown(&self) {
        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.take() {
            info!("forwarder shutting down, draining remaining events");
            handle.cancel.cancel();
            // The loop dropping its sender also counts as done
            let _ = handle.done.await;
            info!("forwarder shutdown complete");
        }
    }
}

/// The single background consumer: wakes on the flush period or as soon as
/// the buffer holds a full batch, whichever comes first.
struct FlushLoop {
    buffer: Arc<EventBuffer>,
    client: DeliveryClient,
    reporter: Arc<dyn FailureReporter>,
    max_batch_size: usize,
    period: Duration,
}

impl FlushLoop {
    async fn run(self, cancel: CancellationToken, done: oneshot::Sender<()>) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                () = self.buffer.wakeup() => {
                    // Level-triggered: a burst may queue several batches
                    // behind a single wakeup permit, so keep flushing while
                    // a full batch remains.
                    if self.buffer.len() >= self.max_batch_size {
                        while self.buffer.len() >= self.max_batch_size {
                            self.flush().await;
                        }
                        ticker.reset();
                    }
                }
                () = cancel.cancelled() => break,
            }
        }

        // Final drain: everything still buffered gets one delivery attempt
        // before completion is signalled back to shutdown().
        while self.flush().await > 0 {}

        debug!("flush loop stopped");
        let _ = done.send(());
    }

    /// Drain one batch and deliver it, oldest first. Returns the number of
    /// events drained; failed events are discarded and reported.
    async fn flush(&self) -> usize {
        let batch = self.buffer.drain(self.max_batch_size);
        if batch.is_empty() {
            return 0;
        }

        let batch_id = Uuid::new_v4();
        let size = batch.len();
        debug!("delivering batch {batch_id} ({size} events)");

        let mut failed = 0usize;
        for event in &batch {
            if let Err(e) = self.client.post_event(event).await {
                failed += 1;
                self.reporter.record(&format!(
                    "Unable to deliver log event to {}: {e}",
                    self.client.endpoint()
                ));
            }
        }

        if failed > 0 {
            warn!("batch {batch_id}: {failed}/{size} events failed delivery and were discarded");
        } else {
            debug!("batch {batch_id} delivered");
        }

        size
    }
}
