//! Step executor trait and the registry that dispatches on node type.
//!
//! Each node type maps to one executor. Executors turn a node's
//! configuration and the caller's input into a JSON result, reaching the
//! outside world only through the providers they were built with.

use crate::error::StepError;
use crate::node::{Node, NodeType};
use async_trait::async_trait;
use callflow_core::WorkflowId;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything an executor can see about one execution.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// The workflow the node belongs to.
    pub workflow_id: &'a WorkflowId,
    /// The node being executed.
    pub node: &'a Node,
    /// Caller-supplied input.
    pub input: &'a JsonValue,
}

impl<'a> StepContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(workflow_id: &'a WorkflowId, node: &'a Node, input: &'a JsonValue) -> Self {
        Self {
            workflow_id,
            node,
            input,
        }
    }

    /// Returns a string field of the node configuration.
    #[must_use]
    pub fn config_str(&self, key: &str) -> Option<&'a str> {
        self.node.config_str(key)
    }

    /// Returns a raw field of the node configuration.
    #[must_use]
    pub fn config(&self, key: &str) -> Option<&'a JsonValue> {
        self.node.data.get(key)
    }

    /// Returns a string field of the input payload.
    #[must_use]
    pub fn input_str(&self, key: &str) -> Option<&'a str> {
        self.input.get(key).and_then(JsonValue::as_str)
    }
}

/// Trait for node-type specific logic.
///
/// This abstraction allows testing the engine without real providers.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Executes the step.
    ///
    /// # Errors
    ///
    /// Returns an error when the node is misconfigured or a provider fails.
    async fn execute(&self, ctx: StepContext<'_>) -> Result<JsonValue, StepError>;
}

/// Maps node types to their executors.
#[derive(Clone, Default)]
pub struct StepRegistry {
    executors: HashMap<NodeType, Arc<dyn StepExecutor>>,
}

impl StepRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an executor, replacing any earlier one for the type.
    pub fn register(&mut self, node_type: impl Into<NodeType>, executor: Arc<dyn StepExecutor>) {
        self.executors.insert(node_type.into(), executor);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, node_type: impl Into<NodeType>, executor: Arc<dyn StepExecutor>) -> Self {
        self.register(node_type, executor);
        self
    }

    /// Returns the executor for a node type.
    #[must_use]
    pub fn get(&self, node_type: &NodeType) -> Option<Arc<dyn StepExecutor>> {
        self.executors.get(node_type).cloned()
    }

    /// Returns true if the type has an executor.
    #[must_use]
    pub fn contains(&self, node_type: &NodeType) -> bool {
        self.executors.contains_key(node_type)
    }

    /// Returns the registered types, sorted by tag.
    #[must_use]
    pub fn node_types(&self) -> Vec<NodeType> {
        let mut types: Vec<NodeType> = self.executors.keys().cloned().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }
}

/// A step that echoes its input (for testing).
pub struct EchoStep;

#[async_trait]
impl StepExecutor for EchoStep {
    async fn execute(&self, ctx: StepContext<'_>) -> Result<JsonValue, StepError> {
        Ok(ctx.input.clone())
    }
}

/// A step with a configurable outcome (for testing).
pub struct MockStep {
    outcome: Result<JsonValue, StepError>,
}

impl MockStep {
    /// Creates a step that always succeeds with `result`.
    #[must_use]
    pub fn success(result: JsonValue) -> Self {
        Self {
            outcome: Ok(result),
        }
    }

    /// Creates a step that always fails with `error`.
    #[must_use]
    pub fn failure(error: StepError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

#[async_trait]
impl StepExecutor for MockStep {
    async fn execute(&self, _ctx: StepContext<'_>) -> Result<JsonValue, StepError> {
        self.outcome.clone()
    }
}
