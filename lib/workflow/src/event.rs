//! Node execution events.
//!
//! Every execution that resolves its node publishes a `Start` event and then
//! exactly one of `Complete` or `Error`. On the wire an event looks like:
//!
//! ```json
//! {"type": "node_execution_complete",
//!  "data": {"node_id": "n1", "workflow_id": "w1", "status": "completed", "result": {}},
//!  "timestamp": "2024-01-01T00:00:00Z"}
//! ```

use callflow_core::{NodeId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// The phase an event reports.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The step is about to run.
    Start,
    /// The step produced a result.
    Complete { result: JsonValue },
    /// The step failed.
    Error { error: String },
}

/// One execution status change for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EventMessage", try_from = "EventMessage")]
pub struct ExecutionEvent {
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionEvent {
    /// Event type tag for `Start`.
    pub const START: &'static str = "node_execution_start";
    /// Event type tag for `Complete`.
    pub const COMPLETE: &'static str = "node_execution_complete";
    /// Event type tag for `Error`.
    pub const ERROR: &'static str = "node_execution_error";

    /// Creates a start event.
    #[must_use]
    pub fn start(workflow_id: WorkflowId, node_id: NodeId, timestamp: DateTime<Utc>) -> Self {
        Self {
            workflow_id,
            node_id,
            kind: EventKind::Start,
            timestamp,
        }
    }

    /// Creates a completion event.
    #[must_use]
    pub fn complete(
        workflow_id: WorkflowId,
        node_id: NodeId,
        result: JsonValue,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            workflow_id,
            node_id,
            kind: EventKind::Complete { result },
            timestamp,
        }
    }

    /// Creates an error event.
    #[must_use]
    pub fn error(
        workflow_id: WorkflowId,
        node_id: NodeId,
        error: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            workflow_id,
            node_id,
            kind: EventKind::Error {
                error: error.into(),
            },
            timestamp,
        }
    }

    /// Returns the wire type tag.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            EventKind::Start => Self::START,
            EventKind::Complete { .. } => Self::COMPLETE,
            EventKind::Error { .. } => Self::ERROR,
        }
    }

    /// Returns the status label carried in the event data.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self.kind {
            EventKind::Start => "running",
            EventKind::Complete { .. } => "completed",
            EventKind::Error { .. } => "error",
        }
    }

    /// Returns true for `Complete` and `Error` events.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, EventKind::Start)
    }
}

/// Wire form of an [`ExecutionEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

/// Payload of an [`EventMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub node_id: NodeId,
    pub workflow_id: WorkflowId,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ExecutionEvent> for EventMessage {
    fn from(event: ExecutionEvent) -> Self {
        let event_type = event.event_type().to_string();
        let status = event.status().to_string();
        let (result, error) = match event.kind {
            EventKind::Start => (None, None),
            EventKind::Complete { result } => (Some(result), None),
            EventKind::Error { error } => (None, Some(error)),
        };
        Self {
            event_type,
            data: EventData {
                node_id: event.node_id,
                workflow_id: event.workflow_id,
                status,
                result,
                error,
            },
            timestamp: event.timestamp,
        }
    }
}

/// An event message with an unknown type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

impl TryFrom<EventMessage> for ExecutionEvent {
    type Error = UnknownEventType;

    fn try_from(message: EventMessage) -> Result<Self, Self::Error> {
        let kind = match message.event_type.as_str() {
            Self::START => EventKind::Start,
            Self::COMPLETE => EventKind::Complete {
                result: message.data.result.unwrap_or(JsonValue::Null),
            },
            Self::ERROR => EventKind::Error {
                error: message.data.error.unwrap_or_default(),
            },
            _ => return Err(UnknownEventType(message.event_type)),
        };
        Ok(Self {
            workflow_id: message.data.workflow_id,
            node_id: message.data.node_id,
            kind,
            timestamp: message.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids() -> (WorkflowId, NodeId) {
        (WorkflowId::new("w1"), NodeId::new("n1"))
    }

    #[test]
    fn start_event_wire_shape() {
        let (workflow_id, node_id) = ids();
        let event = ExecutionEvent::start(workflow_id, node_id, Utc::now());
        let value = serde_json::to_value(&event).expect("serialize");

        assert_eq!(value["type"], "node_execution_start");
        assert_eq!(value["data"]["node_id"], "n1");
        assert_eq!(value["data"]["workflow_id"], "w1");
        assert_eq!(value["data"]["status"], "running");
        assert!(value["data"].get("result").is_none());
        assert!(value["data"].get("error").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn complete_event_carries_result() {
        let (workflow_id, node_id) = ids();
        let event =
            ExecutionEvent::complete(workflow_id, node_id, json!({"status": "generated"}), Utc::now());
        let value = serde_json::to_value(&event).expect("serialize");

        assert_eq!(value["type"], "node_execution_complete");
        assert_eq!(value["data"]["status"], "completed");
        assert_eq!(value["data"]["result"]["status"], "generated");
        assert!(event.is_terminal());
    }

    #[test]
    fn error_event_carries_message() {
        let (workflow_id, node_id) = ids();
        let event = ExecutionEvent::error(workflow_id, node_id, "boom", Utc::now());
        let value = serde_json::to_value(&event).expect("serialize");

        assert_eq!(value["type"], "node_execution_error");
        assert_eq!(value["data"]["status"], "error");
        assert_eq!(value["data"]["error"], "boom");
    }

    #[test]
    fn events_parse_back() {
        let (workflow_id, node_id) = ids();
        let event = ExecutionEvent::error(workflow_id, node_id, "boom", Utc::now());
        let text = serde_json::to_string(&event).expect("serialize");
        let parsed: ExecutionEvent = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(parsed, event);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_value::<ExecutionEvent>(json!({
            "type": "echo",
            "data": {"node_id": "n1", "workflow_id": "w1", "status": "x"},
            "timestamp": "2024-01-01T00:00:00Z"
        }));
        assert!(result.is_err());
    }
}
