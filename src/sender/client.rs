use super::wire::{MessageFormatter, WireEvent, WireIdentity};
use crate::app::Config;
use crate::domain::LogEvent;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Fixed request header carrying the license/API key.
pub const LICENSE_KEY_HEADER: &str = "X-Insert-Key";

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// HTTP delivery client for the ingest endpoint.
///
/// Built once per forwarder and reused for every request: the underlying
/// reqwest client pools connections, so sustained load does not exhaust
/// sockets. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: Client,
    ingest_url: Url,
    license_key: String,
    identity: WireIdentity,
}

impl DeliveryClient {
    pub fn new(config: &Config) -> Result<Self, DeliveryError> {
        Self::with_formatter(config, None)
    }

    pub fn with_formatter(
        config: &Config,
        formatter: Option<MessageFormatter>,
    ) -> Result<Self, DeliveryError> {
        let ingest_url = config
            .resolved_endpoint()
            .map_err(|e| DeliveryError::InvalidConfiguration(e.to_string()))?;

        let identity = WireIdentity {
            event_type: config.event_type.clone(),
            application_name: config
                .get_application_name()
                .map_err(|e| DeliveryError::InvalidConfiguration(e.to_string()))?,
            environment_name: config.environment_name.clone(),
            formatter,
        };

        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_connections)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .user_agent(concat!("ingest-log-forwarder/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| {
                DeliveryError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            ingest_url,
            license_key: config.license_key.clone(),
            identity,
        })
    }

    /// Resolved ingest URL, for diagnostics.
    pub fn endpoint(&self) -> &Url {
        &self.ingest_url
    }

    /// Convert one event to its wire shape and POST it.
    ///
    /// Any 2xx response is success. Any other status, or any transport
    /// failure, is a non-retriable delivery failure: the caller discards the
    /// event and reports the loss.
    pub async fn post_event(&self, event: &LogEvent) -> Result<(), DeliveryError> {
        let wire = WireEvent::capture(event, &self.identity);

        let response = self
            .client
            .post(self.ingest_url.clone())
            .header(LICENSE_KEY_HEADER, &self.license_key)
            .json(&wire)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DeliveryError::HttpError {
                status: response.status().as_u16(),
            })
        }
    }
}
