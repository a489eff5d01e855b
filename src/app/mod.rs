pub mod config;
pub mod logging;

pub use config::{ACCOUNT_SLOT, Config, ConfigError, TracingLevel};
pub use logging::setup_logging;

use crate::domain::{LogEvent, Severity};
use crate::forwarder::Forwarder;
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Daemon wrapper: reads NDJSON log events from stdin and forwards them.
pub struct App {
    forwarder: Forwarder,
}

impl App {
    pub async fn from_args<I, T>(args: I) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args(args)?;
        Self::from_config(config).await
    }

    pub async fn from_config(
        config: Config,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // A config file, when given, replaces the CLI/env configuration
        let final_config = if let Some(config_file) = &config.config_file {
            Config::from_file(config_file)?
        } else {
            config
        };

        setup_logging(final_config.log_level);

        info!("Starting ingest-log-forwarder v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Configuration: application={:?}, environment={}, event_type={}, batch_size={}",
            final_config.application_name,
            final_config.environment_name,
            final_config.event_type,
            final_config.max_batch_size
        );

        let forwarder = Forwarder::new(final_config)?;
        Ok(Self { forwarder })
    }

    /// Forward stdin until EOF or SIGINT, then drain and stop.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        info!("ingest-log-forwarder is running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        self.forwarder.submit(parse_line(&line));
                    }
                    Ok(None) => {
                        info!("stdin closed, shutting down");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {e}");
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                    break;
                }
            }
        }

        self.forwarder.shutdown().await;
        info!("ingest-log-forwarder stopped.");
        Ok(())
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }
}

/// One stdin line becomes one event: JSON when it parses, otherwise the raw
/// text wrapped as a plain Information-level event.
fn parse_line(line: &str) -> LogEvent {
    serde_json::from_str(line)
        .unwrap_or_else(|_| LogEvent::new(Severity::Information, line.to_string()))
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Main entry point for the application
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();

    match App::from_args(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {e}");
                process::exit(1);
            }
        }
        Err(e) => {
            // Logging may not be initialized yet when configuration fails
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    }

    Ok(())
}
