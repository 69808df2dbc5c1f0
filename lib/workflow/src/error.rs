//! Error types for the workflow crate.
//!
//! Errors are layered:
//! - `DefinitionError`: a workflow document is malformed
//! - `StoreError`: persistence failures, carried in a rootcause `Report`
//! - `StepError`: one step executor could not produce a result
//! - `ExecutionError`: everything that can fail one node execution

use crate::node::NodeType;
use callflow_core::{NodeId, WorkflowId};
use std::fmt;

/// Errors in a workflow document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Two nodes share an ID.
    DuplicateNode { node_id: NodeId },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { node_id } => write!(f, "duplicate node id: {node_id}"),
        }
    }
}

impl std::error::Error for DefinitionError {}

/// Errors from a workflow store.
///
/// Missing workflows are not errors: lookups return `None` and mutations
/// report whether anything matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The document failed validation.
    InvalidDefinition(DefinitionError),
    /// A workflow with this ID already exists.
    AlreadyExists { workflow_id: WorkflowId },
    /// The backing store could not be reached.
    Unavailable { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDefinition(err) => write!(f, "invalid workflow: {err}"),
            Self::AlreadyExists { workflow_id } => {
                write!(f, "workflow already exists: {workflow_id}")
            }
            Self::Unavailable { reason } => write!(f, "workflow store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<DefinitionError> for StoreError {
    fn from(err: DefinitionError) -> Self {
        Self::InvalidDefinition(err)
    }
}

/// Failures of a single step executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// An AI node has no flow to run.
    MissingFlowId,
    /// A downstream provider failed.
    Provider { service: String, message: String },
    /// The executor panicked.
    Panicked { message: String },
}

impl StepError {
    /// Wraps a provider failure.
    #[must_use]
    pub fn provider(service: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Provider {
            service: service.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFlowId => write!(f, "no flow ID specified for AI node"),
            Self::Provider { service, message } => {
                write!(f, "error communicating with {service}: {message}")
            }
            Self::Panicked { message } => write!(f, "step executor panicked: {message}"),
        }
    }
}

impl std::error::Error for StepError {}

/// Errors from executing a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The workflow does not exist.
    WorkflowNotFound { workflow_id: WorkflowId },
    /// The workflow has no node with this ID.
    NodeNotFound {
        workflow_id: WorkflowId,
        node_id: NodeId,
    },
    /// The workflow could not be loaded.
    Store { message: String },
    /// The step executor failed.
    Step { node_type: NodeType, source: StepError },
    /// Execution was cancelled before the step finished.
    Cancelled,
}

impl ExecutionError {
    /// Returns true when the workflow or node does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::WorkflowNotFound { .. } | Self::NodeNotFound { .. }
        )
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkflowNotFound { .. } => write!(f, "workflow not found"),
            Self::NodeNotFound { .. } => write!(f, "node not found"),
            Self::Store { message } => write!(f, "failed to load workflow: {message}"),
            Self::Step { source, .. } => write!(f, "{source}"),
            Self::Cancelled => write!(f, "execution cancelled"),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Step { source, .. } => Some(source),
            _ => None,
        }
    }
}
