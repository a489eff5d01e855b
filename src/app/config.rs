use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Substitution slot the endpoint template must carry exactly once.
pub const ACCOUNT_SLOT: &str = "{account_id}";

const DEFAULT_ENDPOINT_TEMPLATE: &str =
    "https://insights-collector.newrelic.com/v1/accounts/{account_id}/events";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Verbosity of the forwarder's own diagnostics, distinct from the domain
/// [`Severity`](crate::domain::Severity) carried by submitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TracingLevel> for tracing::Level {
    fn from(level: TracingLevel) -> Self {
        match level {
            TracingLevel::Error => tracing::Level::ERROR,
            TracingLevel::Warn => tracing::Level::WARN,
            TracingLevel::Info => tracing::Level::INFO,
            TracingLevel::Debug => tracing::Level::DEBUG,
            TracingLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Delivery parameters, immutable for the forwarder's lifetime.
///
/// The account identifier and license key are opaque strings: they are
/// required to be present but never validated locally.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Application name reported with every event (hostname if not provided)
    #[arg(long, env = "APPLICATION_NAME")]
    pub application_name: Option<String>,

    /// Environment name reported with every event
    #[arg(long, env = "ENVIRONMENT_NAME", default_value = "Production")]
    pub environment_name: String,

    /// Event-type label the ingest service files delivered records under
    #[arg(long, env = "EVENT_TYPE", default_value = "LogEvent")]
    pub event_type: String,

    /// Account identifier substituted into the endpoint template
    #[arg(long, env = "ACCOUNT_ID", default_value = "")]
    pub account_id: String,

    /// License/API key carried in the X-Insert-Key request header
    #[arg(long, env = "LICENSE_KEY", default_value = "")]
    pub license_key: String,

    /// Ingest endpoint URL template with one {account_id} slot
    #[arg(long, env = "INGEST_ENDPOINT", default_value = DEFAULT_ENDPOINT_TEMPLATE)]
    pub endpoint_template: String,

    /// Buffer capacity for queuing not-yet-delivered events
    #[arg(long, env = "BUFFER_CAPACITY", default_value = "10000")]
    pub buffer_capacity: usize,

    /// Maximum number of events drained per flush
    #[arg(long, env = "MAX_BATCH_SIZE", default_value = "100")]
    pub max_batch_size: usize,

    /// Flush period in milliseconds
    #[arg(long, env = "FLUSH_INTERVAL_MS", default_value = "1000")]
    pub flush_interval_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[arg(long, env = "CONNECTION_TIMEOUT_SECS", default_value = "10")]
    pub connection_timeout_secs: u64,

    /// Maximum idle HTTP connections kept pooled per host
    #[arg(long, env = "MAX_CONNECTIONS", default_value = "10")]
    pub max_connections: usize,

    /// Log level for the forwarder's own diagnostics
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: TracingLevel,

    /// Configuration file path (optional; when set, the file replaces all
    /// other CLI/env options)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub flush_interval: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub connection_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application_name: None,
            environment_name: "Production".to_string(),
            event_type: "LogEvent".to_string(),
            account_id: String::new(),
            license_key: String::new(),
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            buffer_capacity: 10_000,
            max_batch_size: 100,
            flush_interval_ms: 1000,
            request_timeout_secs: 30,
            connection_timeout_secs: 10,
            max_connections: 10,
            log_level: TracingLevel::Info,
            config_file: None,
            flush_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Derive Duration fields and fill the application name from the host
    /// when the caller did not provide one.
    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.flush_interval = Duration::from_millis(self.flush_interval_ms);
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);
        self.connection_timeout = Duration::from_secs(self.connection_timeout_secs);

        if self.application_name.is_none()
            && let Ok(host) = hostname::get()
            && let Some(host_str) = host.to_str()
            && !host_str.is_empty()
        {
            self.application_name = Some(host_str.to_string());
        }

        Ok(())
    }

    /// Fail fast before any event is accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_id.is_empty() {
            return Err(ConfigError::MissingOption("account_id"));
        }
        if self.license_key.is_empty() {
            return Err(ConfigError::MissingOption("license_key"));
        }
        if self.endpoint_template.is_empty() {
            return Err(ConfigError::MissingOption("endpoint_template"));
        }
        if self.application_name.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingOption("application_name"));
        }

        if !self.endpoint_template.contains(ACCOUNT_SLOT) {
            return Err(ConfigError::InvalidUrl(format!(
                "Endpoint template '{}' has no {} slot",
                self.endpoint_template, ACCOUNT_SLOT
            )));
        }

        // The template must resolve to an absolute URL once substituted
        self.resolved_endpoint()?;

        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max batch size must be greater than 0".to_string(),
            ));
        }

        if self.buffer_capacity < self.max_batch_size {
            return Err(ConfigError::InvalidConfig(format!(
                "Buffer capacity ({}) must be at least as large as max batch size ({})",
                self.buffer_capacity, self.max_batch_size
            )));
        }

        if self.flush_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Flush interval must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 || self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Endpoint URL with the account identifier substituted into its slot.
    pub fn resolved_endpoint(&self) -> Result<Url, ConfigError> {
        let resolved = self.endpoint_template.replace(ACCOUNT_SLOT, &self.account_id);
        Url::parse(&resolved).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{resolved}': {e}"))
        })
    }

    pub fn get_application_name(&self) -> Result<String, ConfigError> {
        self.application_name
            .clone()
            .ok_or(ConfigError::MissingOption("application_name"))
    }
}
