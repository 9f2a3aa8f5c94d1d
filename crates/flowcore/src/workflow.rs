use crate::NodeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub type WorkflowId = String;
pub type NodeId = String;

/// Complete workflow definition as stored by the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(rename = "userId", default)]
    pub owner_id: String,
    #[serde(default)]
    pub config: WorkflowConfig,
}

/// The editor graph: nodes, edges and the canvas viewport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Workflow {
    pub fn new(id: impl Into<WorkflowId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            slug: None,
            is_published: false,
            owner_id: String::new(),
            config: WorkflowConfig::default(),
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    /// Mark the workflow as published under the given slug.
    pub fn published(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self.is_published = true;
        self
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.config.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.config.edges
    }

    pub fn add_node(&mut self, node: NodeSpec) -> NodeId {
        let id = node.id.clone();
        self.config.nodes.push(node);
        id
    }

    pub fn connect(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>) {
        let source = source.into();
        let target = target.into();
        self.config.edges.push(Edge {
            id: format!("e-{}-{}", source, target),
            source,
            target,
            source_handle: None,
            target_handle: None,
        });
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeSpec> {
        self.config.nodes.iter().find(|n| n.id == id)
    }
}

/// The five node kinds the engine knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Auth,
    Api,
    Transform,
    Logic,
    Output,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Auth,
        NodeKind::Api,
        NodeKind::Transform,
        NodeKind::Logic,
        NodeKind::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Auth => "auth",
            NodeKind::Api => "api",
            NodeKind::Transform => "transform",
            NodeKind::Logic => "logic",
            NodeKind::Output => "output",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(NodeKind::Auth),
            "api" => Ok(NodeKind::Api),
            "transform" => Ok(NodeKind::Transform),
            "logic" => Ok(NodeKind::Logic),
            "output" => Ok(NodeKind::Output),
            other => Err(NodeError::UnknownNodeType(other.to_string())),
        }
    }
}

/// Node specification in a workflow
///
/// `node_type` stays a raw string so a graph containing a type this engine
/// does not know still loads; the mismatch surfaces when the node is run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            node_type: kind.as_str().to_string(),
            position: None,
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position { x, y });
        self
    }

    pub fn kind(&self) -> Result<NodeKind, NodeError> {
        self.node_type.parse()
    }

    /// String field from the node data; empty strings count as absent.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Get a required string field or return a configuration error
    pub fn require_str(&self, name: &str) -> Result<&str, NodeError> {
        self.str_field(name)
            .ok_or_else(|| NodeError::missing_field(&self.node_type, name))
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name).filter(|v| !v.is_null())
    }
}

/// Directed dependency between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

/// Node position in visual editor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}
