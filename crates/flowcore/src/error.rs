use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Node {node_id} failed: {message}")]
    NodeFailed { node_id: String, message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of a single node. Converted into a failed `NodeExecutionResult`
/// by the executor before the run is aborted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Timeout after {seconds}s")]
    Timeout { seconds: u64 },
}

impl NodeError {
    /// Stable code recorded alongside the message in execution logs.
    pub fn code(&self) -> &'static str {
        match self {
            NodeError::Configuration(_) => "CONFIGURATION",
            NodeError::ExecutionFailed(_) => "EXECUTION",
            NodeError::UnknownNodeType(_) => "UNKNOWN_NODE_TYPE",
            NodeError::Timeout { .. } => "TIMEOUT",
        }
    }

    pub fn missing_field(node_kind: &str, field: &str) -> Self {
        NodeError::Configuration(format!("{} node requires {}", node_kind, field))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Access to workflow {0} is forbidden")]
    Forbidden(String),

    #[error("Invalid workflow: {0}")]
    Invalid(String),

    #[error("Workflow {workflow} contains cycles")]
    CyclicDependency { workflow: String },

    #[error("Node not found: {0}")]
    NodeNotFound(String),
}
