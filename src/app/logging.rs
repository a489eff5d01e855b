use super::config::TracingLevel;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Transport crates whose chatter is capped below the configured level.
const QUIET_DIRECTIVES: &[&str] = &["hyper=warn", "reqwest=warn", "h2=warn", "tower=warn"];

/// Initialize the global tracing subscriber once for the process.
///
/// Later calls are no-ops, so embedding the forwarder next to a host that
/// already configured tracing is safe.
pub fn setup_logging(level: TracingLevel) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let tracing_level: tracing::Level = level.into();
        let mut filter_parts = vec![tracing_level.to_string().to_lowercase()];
        filter_parts.extend(QUIET_DIRECTIVES.iter().map(|d| (*d).to_string()));

        let env_filter = EnvFilter::try_new(filter_parts.join(","))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // try_init fails only when a subscriber is already installed,
        // which is fine for our purposes
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .compact(),
            )
            .try_init();
    });
}
