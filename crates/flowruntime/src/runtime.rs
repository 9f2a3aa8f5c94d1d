use crate::{planner, ProcessorRegistry, RuntimeConfig, WorkflowExecutor};
use chrono::{DateTime, Utc};
use flowcore::store::TracingLogSink;
use flowcore::{
    ErrorInfo, EventBus, ExecutionContext, ExecutionEvent, ExecutionId, ExecutionLogRecord,
    ExecutionStatus, FlowError, LogSink, NodeExecutionResult, StoreError, Value, Workflow,
    WorkflowError, WorkflowStore, INPUT_KEY,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Main runtime for executing workflows
///
/// Resolves workflows from the store, runs them, and writes exactly one
/// execution log record per call. Separate calls may run concurrently;
/// each gets its own `ExecutionContext`.
pub struct FlowRuntime {
    registry: Arc<ProcessorRegistry>,
    executor: WorkflowExecutor,
    event_bus: EventBus,
    workflows: Arc<dyn WorkflowStore>,
    log_sink: Arc<dyn LogSink>,
    config: RuntimeConfig,
}

/// Timing captured when an execution starts
struct RunClock {
    execution_id: ExecutionId,
    started_at: DateTime<Utc>,
    start: Instant,
}

impl RunClock {
    fn start() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl FlowRuntime {
    /// Create a runtime that logs executions through `tracing`
    pub fn new(
        registry: ProcessorRegistry,
        workflows: Arc<dyn WorkflowStore>,
        config: RuntimeConfig,
    ) -> Self {
        let registry = Arc::new(registry);
        let event_bus = EventBus::new(config.event_buffer_size);
        let executor = WorkflowExecutor::new(registry.clone(), event_bus.clone());

        Self {
            registry,
            executor,
            event_bus,
            workflows,
            log_sink: Arc::new(TracingLogSink),
            config,
        }
    }

    pub fn with_log_sink(mut self, log_sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Execute a stored workflow.
    ///
    /// With a `caller`, `id_or_slug` is a workflow id that must belong to the
    /// caller; without one it is the slug of a published workflow. Returns the
    /// output of the last `output` node, or `None` when no such node ran.
    pub async fn execute_workflow(
        &self,
        id_or_slug: &str,
        input: Option<Value>,
        caller: Option<&str>,
    ) -> Result<Option<Value>, FlowError> {
        let clock = RunClock::start();
        tracing::info!("Executing workflow: {}", id_or_slug);

        let workflow = match self.resolve_workflow(id_or_slug, caller).await {
            Ok(workflow) => workflow,
            Err(err) => {
                tracing::error!("Workflow execution failed: {}", err);
                let record = self.failure_record(&clock, id_or_slug.to_string(), input, Vec::new(), &err);
                self.write_log(record).await;
                return Err(err);
            }
        };

        self.run(clock, &workflow, input).await
    }

    /// Execute an already loaded workflow
    pub async fn execute(
        &self,
        workflow: &Workflow,
        input: Option<Value>,
    ) -> Result<Option<Value>, FlowError> {
        self.run(RunClock::start(), workflow, input).await
    }

    /// Check a workflow without running it: unique ids, edges that point at
    /// existing nodes, no cycles, and a registered processor for every node.
    pub fn validate(&self, workflow: &Workflow) -> Result<(), FlowError> {
        planner::plan(workflow)?;

        for node in workflow.nodes() {
            self.registry.resolve(&node.node_type).map_err(|e| {
                WorkflowError::Invalid(format!("node {}: {}", node.id, e))
            })?;
        }
        Ok(())
    }

    async fn resolve_workflow(
        &self,
        id_or_slug: &str,
        caller: Option<&str>,
    ) -> Result<Workflow, FlowError> {
        let found = match caller {
            Some(owner_id) => self.workflows.get_by_id(id_or_slug, owner_id).await,
            None => self.workflows.get_by_slug(id_or_slug).await,
        };

        found.map_err(|e| match e {
            StoreError::NotFound(_) => FlowError::from(WorkflowError::NotFound(id_or_slug.to_string())),
            StoreError::Forbidden(_) => FlowError::from(WorkflowError::Forbidden(id_or_slug.to_string())),
            other => FlowError::Store(other),
        })
    }

    async fn run(
        &self,
        clock: RunClock,
        workflow: &Workflow,
        input: Option<Value>,
    ) -> Result<Option<Value>, FlowError> {
        let execution_id = clock.execution_id;

        self.event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id,
            workflow_id: workflow.id.clone(),
            timestamp: Utc::now(),
        });

        let mut ctx = ExecutionContext::new(execution_id, self.event_bus.clone());
        if let Some(input) = &input {
            ctx.set(INPUT_KEY, input.clone());
        }

        let mut node_executions = Vec::new();
        let outcome = self
            .executor
            .run(workflow, &mut ctx, &mut node_executions)
            .await;
        drop(ctx);

        let duration_ms = clock.elapsed_ms();

        self.event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id,
            status: if outcome.is_ok() {
                ExecutionStatus::Success
            } else {
                ExecutionStatus::Failed
            },
            duration_ms,
            timestamp: Utc::now(),
        });

        let record = match &outcome {
            Ok(output) => {
                tracing::info!(
                    "Workflow {} executed successfully in {}ms",
                    workflow.id,
                    duration_ms
                );
                ExecutionLogRecord {
                    execution_id,
                    workflow_id: workflow.id.clone(),
                    status: ExecutionStatus::Success,
                    input,
                    output: output.clone(),
                    node_executions,
                    duration_ms,
                    error: None,
                    started_at: clock.started_at,
                    completed_at: Utc::now(),
                }
            }
            Err(err) => {
                tracing::error!("Workflow execution failed: {}", err);
                self.failure_record(&clock, workflow.id.clone(), input, node_executions, err)
            }
        };

        self.write_log(record).await;
        outcome
    }

    fn failure_record(
        &self,
        clock: &RunClock,
        workflow_id: String,
        input: Option<Value>,
        node_executions: Vec<NodeExecutionResult>,
        err: &FlowError,
    ) -> ExecutionLogRecord {
        let mut error = ErrorInfo::from_error(err);

        // A node failure keeps the node's own stack and code.
        if let FlowError::NodeFailed { .. } = err {
            if let Some(node_error) = node_executions.last().and_then(|r| r.error.as_ref()) {
                error.stack = node_error.stack.clone();
                error.code = node_error.code.clone();
            }
        }

        ExecutionLogRecord {
            execution_id: clock.execution_id,
            workflow_id,
            status: ExecutionStatus::Failed,
            input,
            output: None,
            node_executions,
            duration_ms: clock.elapsed_ms(),
            error: Some(error),
            started_at: clock.started_at,
            completed_at: Utc::now(),
        }
    }

    /// Best effort: a slow or failing sink is reported and otherwise ignored.
    async fn write_log(&self, record: ExecutionLogRecord) {
        let execution_id = record.execution_id;
        let limit = self.config.log_write_timeout();

        match tokio::time::timeout(limit, self.log_sink.append(record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(%execution_id, "Failed to write execution log: {}", e);
            }
            Err(_) => {
                tracing::error!(
                    %execution_id,
                    "Execution log write timed out after {}ms",
                    limit.as_millis()
                );
            }
        }
    }
}
