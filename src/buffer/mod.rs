pub mod metrics;
pub mod queue;

pub use metrics::BufferMetrics;
pub use queue::{BufferError, EventBuffer};
