use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Reserved property name propagated to the wire `correlationId` field.
pub const CORRELATION_ID_PROPERTY: &str = "CorrelationId";

/// A structured log record submitted by a caller for delivery.
///
/// Immutable once submitted: the buffer owns it until it is drained, then
/// the in-flight batch owns it until the delivery attempt completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Original capture time at the call site.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub severity: Severity,
    /// Message template with `{PropertyName}` placeholders.
    pub message_template: String,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl LogEvent {
    pub fn new(severity: Severity, message_template: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message_template: message_template.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Textual value of a property, if present.
    ///
    /// JSON strings render without surrounding quotes; other values render
    /// as their JSON form.
    pub fn property_text(&self, name: &str) -> Option<String> {
        self.properties.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Correlation identifier carried under the reserved property name.
    pub fn correlation_id(&self) -> Option<String> {
        self.property_text(CORRELATION_ID_PROPERTY)
    }

    /// Resolve the message template against the bound properties.
    ///
    /// Best effort by contract: `{{`/`}}` escape to literal braces, unknown
    /// placeholders and unclosed braces pass through verbatim. Never panics,
    /// whatever the template contains.
    pub fn render_message(&self) -> String {
        let template = &self.message_template;
        let mut rendered = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    rendered.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    rendered.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        placeholder.push(inner);
                    }

                    if closed {
                        // A format specifier after ':' is accepted but ignored
                        let name = placeholder.split(':').next().unwrap_or("");
                        match self.property_text(name) {
                            Some(text) => rendered.push_str(&text),
                            None => {
                                rendered.push('{');
                                rendered.push_str(&placeholder);
                                rendered.push('}');
                            }
                        }
                    } else {
                        // Unclosed placeholder degrades to the literal text
                        rendered.push('{');
                        rendered.push_str(&placeholder);
                    }
                }
                other => rendered.push(other),
            }
        }

        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_bound_properties() {
        let event = LogEvent::new(Severity::Information, "User {Name} logged in from {Ip}")
            .with_property("Name", "alice")
            .with_property("Ip", "10.0.0.1");
        assert_eq!(event.render_message(), "User alice logged in from 10.0.0.1");
    }

    #[test]
    fn unknown_placeholder_passes_through() {
        let event = LogEvent::new(Severity::Information, "missing {Nope} here");
        assert_eq!(event.render_message(), "missing {Nope} here");
    }

    #[test]
    fn escaped_braces_render_literally() {
        let event = LogEvent::new(Severity::Information, "literal {{braces}} kept");
        assert_eq!(event.render_message(), "literal {braces} kept");
    }

    #[test]
    fn malformed_template_degrades_without_panic() {
        let event = LogEvent::new(Severity::Information, "oops {Unclosed and more");
        assert_eq!(event.render_message(), "oops {Unclosed and more");

        let event = LogEvent::new(Severity::Information, "stray } brace");
        assert_eq!(event.render_message(), "stray } brace");
    }

    #[test]
    fn format_specifier_is_ignored() {
        let event = LogEvent::new(Severity::Information, "took {Elapsed:000} ms")
            .with_property("Elapsed", 42);
        assert_eq!(event.render_message(), "took 42 ms");
    }

    #[test]
    fn non_string_properties_render_as_json() {
        let event = LogEvent::new(Severity::Information, "payload {Body}")
            .with_property("Body", json!({"a": 1}));
        assert_eq!(event.render_message(), r#"payload {"a":1}"#);
    }

    #[test]
    fn correlation_id_extraction() {
        let event = LogEvent::new(Severity::Information, "hello")
            .with_property(CORRELATION_ID_PROPERTY, "abc-123");
        assert_eq!(event.correlation_id().as_deref(), Some("abc-123"));

        let event = LogEvent::new(Severity::Information, "hello");
        assert!(event.correlation_id().is_none());
    }
}
