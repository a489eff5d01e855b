//! Domain layer for ingest-log-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEvent`: the structured record callers submit for delivery
//! - `Severity`: domain log severity (Verbose through Fatal)

pub mod log_event;
pub mod severity;

pub use log_event::{CORRELATION_ID_PROPERTY, LogEvent};
pub use severity::Severity;
