//! Node execution state machine.
//!
//! A run moves `Pending -> Running -> {Completed, Failed}`. Runs that fail
//! before their node is resolved go straight from `Pending` to `Failed`.

use crate::error::ExecutionError;
use crate::node::NodeType;
use callflow_core::{NodeId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The state of one node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Not started; workflow and node not yet resolved.
    Pending,
    /// The step executor is running.
    Running,
    /// The step produced a result.
    Completed,
    /// Resolution or the step failed.
    Failed,
}

impl ExecutionState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if moving to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

/// A record of a single node execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRun {
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    /// Known once the node is resolved.
    pub node_type: Option<NodeType>,
    pub state: ExecutionState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
}

impl NodeRun {
    /// Creates a pending run.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, node_id: NodeId) -> Self {
        Self {
            workflow_id,
            node_id,
            node_type: None,
            state: ExecutionState::Pending,
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }

    /// Starts the run for a resolved node.
    pub fn start(&mut self, node_type: NodeType, now: DateTime<Utc>) {
        self.transition(ExecutionState::Running);
        self.node_type = Some(node_type);
        self.started_at = Some(now);
    }

    /// Marks the run as completed.
    pub fn complete(&mut self, result: JsonValue, now: DateTime<Utc>) {
        self.transition(ExecutionState::Completed);
        self.finished_at = Some(now);
        self.result = Some(result);
    }

    /// Marks the run as failed.
    pub fn fail(&mut self, error: &ExecutionError, now: DateTime<Utc>) {
        self.transition(ExecutionState::Failed);
        self.finished_at = Some(now);
        self.error = Some(error.to_string());
    }

    /// Converts a finished run into its outcome.
    #[must_use]
    pub fn outcome(&self) -> ExecutionOutcome {
        match (&self.state, &self.error) {
            (ExecutionState::Failed, Some(error)) => ExecutionOutcome::failed(error.clone()),
            _ => ExecutionOutcome::succeeded(self.result.clone().unwrap_or(JsonValue::Null)),
        }
    }

    fn transition(&mut self, next: ExecutionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {:?} -> {next:?}",
            self.state
        );
        self.state = next;
    }
}

/// The uniform result of one execution: `{success, data}` or `{success, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "OutcomeBody", from = "OutcomeBody")]
pub enum ExecutionOutcome {
    Succeeded { data: JsonValue },
    Failed { error: String },
}

impl ExecutionOutcome {
    /// A successful outcome.
    #[must_use]
    pub fn succeeded(data: JsonValue) -> Self {
        Self::Succeeded { data }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Returns true on success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns the result data on success.
    #[must_use]
    pub fn data(&self) -> Option<&JsonValue> {
        match self {
            Self::Succeeded { data } => Some(data),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the error message on failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeBody {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<ExecutionOutcome> for OutcomeBody {
    fn from(outcome: ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Succeeded { data } => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            ExecutionOutcome::Failed { error } => Self {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

impl From<OutcomeBody> for ExecutionOutcome {
    fn from(body: OutcomeBody) -> Self {
        if body.success {
            Self::succeeded(body.data.unwrap_or(JsonValue::Null))
        } else {
            Self::failed(body.error.unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepError;
    use serde_json::json;

    fn run() -> NodeRun {
        NodeRun::new(WorkflowId::new("w1"), NodeId::new("n1"))
    }

    #[test]
    fn terminal_states() {
        assert!(!ExecutionState::Pending.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
        assert!(ExecutionState::Completed.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
    }

    #[test]
    fn allowed_transitions() {
        assert!(ExecutionState::Pending.can_transition_to(ExecutionState::Running));
        assert!(ExecutionState::Pending.can_transition_to(ExecutionState::Failed));
        assert!(!ExecutionState::Pending.can_transition_to(ExecutionState::Completed));
        assert!(!ExecutionState::Completed.can_transition_to(ExecutionState::Failed));
        assert!(!ExecutionState::Failed.can_transition_to(ExecutionState::Running));
    }

    #[test]
    fn run_lifecycle_success() {
        let mut run = run();
        let now = Utc::now();
        run.start(NodeType::EndCall, now);
        assert_eq!(run.state, ExecutionState::Running);

        run.complete(json!({"status": "completed"}), now);
        assert_eq!(run.state, ExecutionState::Completed);
        assert_eq!(run.outcome(), ExecutionOutcome::succeeded(json!({"status": "completed"})));
    }

    #[test]
    fn run_lifecycle_failure_after_start() {
        let mut run = run();
        let now = Utc::now();
        run.start(NodeType::AiNode, now);
        run.fail(
            &ExecutionError::Step {
                node_type: NodeType::AiNode,
                source: StepError::MissingFlowId,
            },
            now,
        );
        assert_eq!(run.state, ExecutionState::Failed);
        assert_eq!(run.outcome().error(), Some("no flow ID specified for AI node"));
    }

    #[test]
    fn run_can_fail_while_pending() {
        let mut run = run();
        run.fail(
            &ExecutionError::WorkflowNotFound {
                workflow_id: WorkflowId::new("w1"),
            },
            Utc::now(),
        );
        assert!(run.started_at.is_none());
        assert!(!run.outcome().is_success());
    }

    #[test]
    fn outcome_wire_shape() {
        let ok = serde_json::to_value(ExecutionOutcome::succeeded(json!({"a": 1}))).expect("serialize");
        assert_eq!(ok, json!({"success": true, "data": {"a": 1}}));

        let err = serde_json::to_value(ExecutionOutcome::failed("node not found")).expect("serialize");
        assert_eq!(err, json!({"success": false, "error": "node not found"}));
    }

    #[test]
    fn null_data_still_serializes_success() {
        let value = serde_json::to_value(ExecutionOutcome::succeeded(JsonValue::Null)).expect("serialize");
        assert_eq!(value, json!({"success": true, "data": null}));
    }

    #[test]
    fn outcome_parses() {
        let outcome: ExecutionOutcome =
            serde_json::from_value(json!({"success": false, "error": "boom"})).expect("deserialize");
        assert_eq!(outcome, ExecutionOutcome::failed("boom"));
    }
}
