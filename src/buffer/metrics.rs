/// Point-in-time snapshot of buffer activity.
///
/// `dropped` is the only place silent overflow loss becomes visible, so it is
/// worth watching in long-running deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferMetrics {
    pub capacity: usize,
    pub len: usize,
    pub enqueued: u64,
    pub dropped: u64,
    pub drained: u64,
}

impl BufferMetrics {
    pub fn fill_ratio(&self) -> f64 {
        self.len as f64 / self.capacity as f64
    }
}
