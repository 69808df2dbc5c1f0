//! Workflow node types.
//!
//! Nodes are the building blocks of call flows. Each node has:
//! - An ID, unique within the workflow
//! - A type tag selecting the step executor
//! - Free-form configuration (`data`) edited in the flow builder
//! - A canvas position, carried only so documents round-trip unchanged

use callflow_core::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// The type tag of a node.
///
/// Unknown tags are preserved as `Other` so documents written by newer
/// editors still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// Places the outbound call.
    StartCall,
    /// Speaks a message to the caller.
    PlayAudio,
    /// Hands the conversation to an AI flow.
    AiNode,
    /// Hangs up.
    EndCall,
    /// Any tag without a built-in meaning.
    Other(String),
}

impl NodeType {
    /// Returns the wire tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::StartCall => "startCall",
            Self::PlayAudio => "playAudio",
            Self::AiNode => "aiNode",
            Self::EndCall => "endCall",
            Self::Other(tag) => tag,
        }
    }

    /// Returns true for the tags with built-in executors.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "startCall" => Self::StartCall,
            "playAudio" => Self::PlayAudio,
            "aiNode" => Self::AiNode,
            "endCall" => Self::EndCall,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Other(tag) => tag,
            builtin => builtin.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A node in a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the workflow.
    pub id: NodeId,
    /// Type tag.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Step configuration.
    #[serde(default)]
    pub data: Map<String, JsonValue>,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
}

impl Node {
    /// Creates a node with empty configuration at the origin.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<NodeType>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data: Map::new(),
            position: Position::default(),
        }
    }

    /// Adds a configuration value.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Sets the canvas position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    /// Returns a string configuration value, if present and a string.
    #[must_use]
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(JsonValue::as_str)
    }
}
