use crate::events::ExecutionId;
use crate::{NodeError, NodeId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorInfo {
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = format!("{:?}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            stack: Some(stack),
            code: None,
        }
    }

    pub fn from_node_error(err: &NodeError) -> Self {
        Self {
            code: Some(err.code().to_string()),
            ..Self::from_error(err)
        }
    }
}

/// Telemetry for one attempted node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionResult {
    pub node_id: NodeId,
    pub node_type: String,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl NodeExecutionResult {
    pub fn success(node_id: NodeId, node_type: String, duration_ms: u64, output: Value) -> Self {
        Self {
            node_id,
            node_type,
            duration_ms,
            status: ExecutionStatus::Success,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(node_id: NodeId, node_type: String, duration_ms: u64, error: &NodeError) -> Self {
        Self {
            node_id,
            node_type,
            duration_ms,
            status: ExecutionStatus::Failed,
            output: None,
            error: Some(ErrorInfo::from_node_error(error)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Record handed to the `LogSink` once per execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogRecord {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub node_executions: Vec<NodeExecutionResult>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
