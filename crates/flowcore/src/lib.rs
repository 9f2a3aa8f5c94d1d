//! Core abstractions for the flow engine
//!
//! This crate provides the workflow model, the per-execution context, the
//! processor trait and the collaborator contracts that the runtime and the
//! node library build on. It has no execution machinery of its own.

mod auth;
mod context;
mod error;
pub mod events;
mod execution_log;
mod http;
mod node;
pub mod store;
mod value;
mod workflow;

pub use auth::{
    ApiKeyCredentials, AuthConfig, AuthType, BasicCredentials, BearerCredentials, Credentials,
    KeyPlacement, OAuth2Credentials,
};
pub use context::{render_template, ExecutionContext, INPUT_KEY};
pub use error::{FlowError, NodeError, WorkflowError};
pub use events::*;
pub use execution_log::{ErrorInfo, ExecutionLogRecord, ExecutionStatus, NodeExecutionResult};
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse};
pub use node::NodeProcessor;
pub use store::{AuthConfigStore, LogSink, StoreError, WorkflowStore};
pub use value::ValueExt;
pub use workflow::{
    Edge, NodeId, NodeKind, NodeSpec, Position, Viewport, Workflow, WorkflowConfig, WorkflowId,
};

pub use serde_json::Value;

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
