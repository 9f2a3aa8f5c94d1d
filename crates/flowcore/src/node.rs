use crate::{ExecutionContext, NodeError, NodeKind, NodeSpec};
use async_trait::async_trait;
use serde_json::Value;

/// Strategy that executes one kind of node.
///
/// Processors are stateless with respect to a run: everything a node reads
/// or publishes goes through the `ExecutionContext`.
#[async_trait]
pub trait NodeProcessor: Send + Sync {
    fn kind(&self) -> NodeKind;

    /// Run `node` against the context and return the node's output.
    async fn process(&self, node: &NodeSpec, ctx: &mut ExecutionContext)
        -> Result<Value, NodeError>;

    fn description(&self) -> &str {
        ""
    }
}
