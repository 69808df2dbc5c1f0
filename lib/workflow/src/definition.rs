//! Workflow definition types.
//!
//! A workflow is a named call flow made of:
//! - Nodes (steps), unique by ID
//! - Edges (control flow between steps)
//! - Creation and update timestamps

use crate::edge::Edge;
use crate::error::DefinitionError;
use crate::node::Node;
use callflow_core::{NodeId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A call-flow workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier, generated when the document omits it.
    #[serde(default = "WorkflowId::generate")]
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// Steps of the flow.
    pub nodes: Vec<Node>,
    /// Control flow between steps.
    pub edges: Vec<Edge>,
    /// When this workflow was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// When this workflow was last updated.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates an empty workflow with a generated ID.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::generate(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the workflow ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<WorkflowId>) -> Self {
        self.id = id.into();
        self
    }

    /// Adds a node.
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Adds an edge.
    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Finds a node by ID.
    #[must_use]
    pub fn find_node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == node_id)
    }

    /// Checks that node IDs are unique.
    ///
    /// # Errors
    ///
    /// Returns the first repeated node ID.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(DefinitionError::DuplicateNode {
                    node_id: node.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Marks the workflow as modified now.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Workflow {
        Workflow::new("Sales call")
            .with_id("w1")
            .with_node(Node::new("1", "startCall"))
            .with_node(Node::new("2", "playAudio").with_data("audioMessage", json!("Hi")))
            .with_edge(Edge::new("e1-2", "1", "2"))
    }

    #[test]
    fn find_node_by_id() {
        let workflow = sample();
        let node = workflow.find_node(&NodeId::new("2")).expect("node exists");
        assert_eq!(node.config_str("audioMessage"), Some("Hi"));
        assert!(workflow.find_node(&NodeId::new("9")).is_none());
    }

    #[test]
    fn validate_accepts_unique_nodes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_nodes() {
        let workflow = sample().with_node(Node::new("1", "endCall"));
        let err = workflow.validate().unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateNode {
                node_id: NodeId::new("1")
            }
        );
    }

    #[test]
    fn missing_id_and_timestamps_are_generated() {
        let workflow: Workflow = serde_json::from_value(json!({
            "name": "Inbound",
            "nodes": [],
            "edges": []
        }))
        .expect("deserialize");

        assert!(workflow.id.as_str().starts_with("wf_"));
        assert_eq!(workflow.name, "Inbound");
    }

    #[test]
    fn document_round_trips() {
        let workflow = sample();
        let value = serde_json::to_value(&workflow).expect("serialize");
        assert_eq!(value["id"], "w1");
        assert_eq!(value["nodes"][1]["type"], "playAudio");
        assert_eq!(value["edges"][0]["source"], "1");

        let back: Workflow = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, workflow);
    }

    #[test]
    fn touch_updates_timestamp_only() {
        let mut workflow = sample();
        let created = workflow.created_at;
        let later = created + chrono::Duration::seconds(30);
        workflow.touch(later);
        assert_eq!(workflow.created_at, created);
        assert_eq!(workflow.updated_at, later);
    }
}
