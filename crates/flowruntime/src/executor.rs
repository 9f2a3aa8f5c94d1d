use crate::planner;
use crate::registry::ProcessorRegistry;
use chrono::Utc;
use flowcore::{
    EventBus, ExecutionContext, ExecutionEvent, FlowError, NodeError, NodeExecutionResult,
    NodeKind, NodeSpec, Value, Workflow,
};
use std::sync::Arc;
use std::time::Instant;

/// Runs a workflow's nodes one after another in planned order
pub struct WorkflowExecutor {
    registry: Arc<ProcessorRegistry>,
    event_bus: EventBus,
}

impl WorkflowExecutor {
    pub fn new(registry: Arc<ProcessorRegistry>, event_bus: EventBus) -> Self {
        Self {
            registry,
            event_bus,
        }
    }

    /// Execute every node of `workflow` against `ctx`.
    ///
    /// Each attempted node appends one entry to `results`, including the node
    /// that fails; the run stops at the first failure. Returns the output of
    /// the last `output` node executed, if any.
    pub async fn run(
        &self,
        workflow: &Workflow,
        ctx: &mut ExecutionContext,
        results: &mut Vec<NodeExecutionResult>,
    ) -> Result<Option<Value>, FlowError> {
        let order = planner::plan(workflow)?;

        tracing::debug!(
            workflow_id = %workflow.id,
            "Execution order: {}",
            order.iter().map(|n| n.id.as_str()).collect::<Vec<_>>().join(" -> ")
        );

        let mut final_output = None;

        for node in order {
            let result = self.execute_node(node, ctx).await;

            if let Some(error) = &result.error {
                let err = FlowError::NodeFailed {
                    node_id: node.id.clone(),
                    message: error.message.clone(),
                };
                results.push(result);
                return Err(err);
            }

            if node.kind().ok() == Some(NodeKind::Output) {
                final_output = result.output.clone();
            }
            results.push(result);
        }

        Ok(final_output)
    }

    /// Dispatch a single node and time it.
    async fn execute_node(&self, node: &NodeSpec, ctx: &mut ExecutionContext) -> NodeExecutionResult {
        let execution_id = ctx.execution_id();

        self.event_bus.emit(ExecutionEvent::NodeStarted {
            execution_id,
            node_id: node.id.clone(),
            node_type: node.node_type.clone(),
            timestamp: Utc::now(),
        });

        tracing::debug!("Executing node: {} ({})", node.id, node.node_type);

        let start = Instant::now();
        let outcome: Result<Value, NodeError> = match self.registry.resolve(&node.node_type) {
            Ok(processor) => processor.process(node, ctx).await,
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                tracing::info!("Node {} completed in {}ms", node.id, duration_ms);

                self.event_bus.emit(ExecutionEvent::NodeCompleted {
                    execution_id,
                    node_id: node.id.clone(),
                    output: output.clone(),
                    duration_ms,
                    timestamp: Utc::now(),
                });

                NodeExecutionResult::success(node.id.clone(), node.node_type.clone(), duration_ms, output)
            }
            Err(e) => {
                tracing::error!("Node {} failed: {}", node.id, e);

                self.event_bus.emit(ExecutionEvent::NodeFailed {
                    execution_id,
                    node_id: node.id.clone(),
                    code: e.code().to_string(),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });

                NodeExecutionResult::failed(node.id.clone(), node.node_type.clone(), duration_ms, &e)
            }
        }
    }
}
