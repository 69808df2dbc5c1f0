//! Edge types for workflow graphs.
//!
//! Edges record control flow between nodes for the editor. Single-node
//! execution never follows them.

use callflow_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// An edge connecting two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier within the workflow.
    pub id: EdgeId,
    /// The source node.
    pub source: NodeId,
    /// The target node.
    pub target: NodeId,
    /// Named output handle on the source node.
    #[serde(
        rename = "sourceHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_handle: Option<String>,
    /// Named input handle on the target node.
    #[serde(
        rename = "targetHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Creates an edge between the default handles.
    #[must_use]
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Sets the named handles.
    #[must_use]
    pub fn with_handles(
        mut self,
        source_handle: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.source_handle = Some(source_handle.into());
        self.target_handle = Some(target_handle.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_without_handles() {
        let edge = Edge::new("e1-2", "1", "2");
        assert_eq!(edge.source.as_str(), "1");
        assert_eq!(edge.target.as_str(), "2");
        assert!(edge.source_handle.is_none());

        let value = serde_json::to_value(&edge).expect("serialize");
        assert!(value.get("sourceHandle").is_none());
    }

    #[test]
    fn edge_reads_camel_case_handles() {
        let edge: Edge = serde_json::from_value(serde_json::json!({
            "id": "e2-3",
            "source": "2",
            "target": "3",
            "sourceHandle": "yes",
            "targetHandle": null
        }))
        .expect("deserialize");

        assert_eq!(edge.source_handle.as_deref(), Some("yes"));
        assert!(edge.target_handle.is_none());
    }

    #[test]
    fn edge_with_handles() {
        let edge = Edge::new("e", "a", "b").with_handles("out", "in");
        assert_eq!(edge.source_handle.as_deref(), Some("out"));
        assert_eq!(edge.target_handle.as_deref(), Some("in"));
    }
}
