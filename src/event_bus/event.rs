use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Structured event emitted during playback.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    /// A single action node fired, finished, or was skipped.
    Node(NodeEvent),
    /// Join-protocol integrity fault (bad signal, missing actor).
    Scheduler(SchedulerEvent),
    /// Line / scene / act / script transition.
    Sequence(SequenceEvent),
    /// Anything else worth narrating.
    Diagnostic(DiagnosticEvent),
}

impl Event {
    pub fn node(
        play_id: Uuid,
        label: impl Into<String>,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event::Node(NodeEvent {
            play_id: play_id.to_string(),
            label: label.into(),
            scope: scope.into(),
            message: message.into(),
        })
    }

    pub fn scheduler(play_id: Uuid, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Scheduler(SchedulerEvent {
            play_id: play_id.to_string(),
            scope: scope.into(),
            message: message.into(),
        })
    }

    pub fn sequence(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Sequence(SequenceEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// The event's scope label, uniform across variants.
    #[must_use]
    pub fn scope_label(&self) -> &str {
        match self {
            Event::Node(e) => &e.scope,
            Event::Scheduler(e) => &e.scope,
            Event::Sequence(e) => &e.scope,
            Event::Diagnostic(e) => &e.scope,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Event::Node(e) => &e.message,
            Event::Scheduler(e) => &e.message,
            Event::Sequence(e) => &e.message,
            Event::Diagnostic(e) => &e.message,
        }
    }

    /// Convert to a normalized JSON object.
    ///
    /// ```json
    /// {
    ///   "type": "node" | "scheduler" | "sequence" | "diagnostic",
    ///   "scope": "...",
    ///   "message": "...",
    ///   "timestamp": "2026-01-01T00:00:00Z",
    ///   "metadata": { /* variant-specific fields */ }
    /// }
    /// ```
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        let (event_type, metadata) = match self {
            Event::Node(e) => (
                "node",
                json!({ "play_id": e.play_id, "label": e.label }),
            ),
            Event::Scheduler(e) => ("scheduler", json!({ "play_id": e.play_id })),
            Event::Sequence(_) => ("sequence", json!({})),
            Event::Diagnostic(_) => ("diagnostic", json!({})),
        };
        json!({
            "type": event_type,
            "scope": self.scope_label(),
            "message": self.message(),
            "timestamp": Utc::now().to_rfc3339(),
            "metadata": metadata,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Node(e) => write!(f, "[{}] {}: {}", e.label, e.scope, e.message),
            Event::Scheduler(e) => write!(f, "[scheduler] {}: {}", e.scope, e.message),
            Event::Sequence(e) => write!(f, "[sequence] {}: {}", e.scope, e.message),
            Event::Diagnostic(e) => write!(f, "{}: {}", e.scope, e.message),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeEvent {
    /// Play-through this event belongs to.
    pub play_id: String,
    /// The node's human-readable label.
    pub label: String,
    pub scope: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerEvent {
    pub play_id: String,
    pub scope: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequenceEvent {
    pub scope: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub scope: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_form_carries_type_scope_and_message() {
        let id = Uuid::new_v4();
        let event = Event::node(id, "walk", "fired", "node fired");
        let value = event.to_json_value();
        assert_eq!(value["type"], "node");
        assert_eq!(value["scope"], "fired");
        assert_eq!(value["metadata"]["label"], "walk");
        assert_eq!(value["metadata"]["play_id"], id.to_string());
    }

    #[test]
    fn display_is_compact_and_labelled() {
        let event = Event::sequence("line", "line 'opening' finished");
        assert_eq!(event.to_string(), "[sequence] line: line 'opening' finished");
    }
}
