use crate::domain::LogEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Optional message-formatting strategy supplied at construction. When
/// absent, the event's own template rendering is used.
pub type MessageFormatter = Arc<dyn Fn(&LogEvent) -> String + Send + Sync>;

/// Sender-side identity stamped onto every delivered event.
#[derive(Clone)]
pub struct WireIdentity {
    pub event_type: String,
    pub application_name: String,
    pub environment_name: String,
    pub formatter: Option<MessageFormatter>,
}

impl std::fmt::Debug for WireIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireIdentity")
            .field("event_type", &self.event_type)
            .field("application_name", &self.application_name)
            .field("environment_name", &self.environment_name)
            .field("formatter", &self.formatter.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// The flat record shape the ingest service accepts, one per log event.
///
/// Field names are a wire contract: the receiving service matches on the
/// exact lower-camel-case names, so the rename policy here is load-bearing,
/// not a style choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    pub event_type: String,
    pub log_level: String,
    /// Rendered message text.
    pub data: String,
    /// Delivery-attempt time, not the original log time. Stamped at
    /// serialization so the ingest side sees when the record left the
    /// forwarder.
    pub timestamp: DateTime<Utc>,
    pub application_name: String,
    pub environment_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl WireEvent {
    /// Map one in-process event to its wire shape.
    ///
    /// Deterministic for a given event and identity, except `timestamp`.
    pub fn capture(event: &LogEvent, identity: &WireIdentity) -> Self {
        let data = match &identity.formatter {
            Some(formatter) => formatter(event),
            None => event.render_message(),
        };

        Self {
            event_type: identity.event_type.clone(),
            log_level: event.severity.as_str().to_string(),
            data,
            timestamp: Utc::now(),
            application_name: identity.application_name.clone(),
            environment_name: identity.environment_name.clone(),
            correlation_id: event.correlation_id(),
        }
    }
}
