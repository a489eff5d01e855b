use parking_lot::Mutex;
use std::io::Write;
use std::sync::{Arc, OnceLock};

#[cfg(test)]
use mockall::automock;

/// Process-wide diagnostic sink for delivery failures.
///
/// Write-only and fire-and-forget: `record` must never panic, never block
/// meaningfully, and never influence control flow. It exists purely so
/// operators can discover silent event loss. Injectable so tests can capture
/// its output; production wiring defaults to [`shared_reporter`].
#[cfg_attr(test, automock)]
pub trait FailureReporter: Send + Sync {
    fn record(&self, message: &str);
}

/// Default reporter: one human-readable line per failure on stderr.
#[derive(Debug, Default)]
pub struct StderrReporter;

impl FailureReporter for StderrReporter {
    fn record(&self, message: &str) {
        // Write errors are swallowed; a broken stderr must not surface here
        let _ = writeln!(std::io::stderr().lock(), "[ingest-log-forwarder] {message}");
    }
}

/// Capturing reporter for tests and embedders that want programmatic access.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FailureReporter for MemoryReporter {
    fn record(&self, message: &str) {
        self.records.lock().push(message.to_string());
    }
}

/// The process-wide default reporter instance.
pub fn shared_reporter() -> Arc<dyn FailureReporter> {
    static SHARED: OnceLock<Arc<StderrReporter>> = OnceLock::new();
    SHARED.get_or_init(|| Arc::new(StderrReporter)).clone()
}
