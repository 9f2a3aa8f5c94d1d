// crates/flowruntime/tests/runtime_test.rs

use async_trait::async_trait;
use flowcore::store::{InMemoryWorkflowStore, MemoryLogSink};
use flowcore::{
    ExecutionContext, ExecutionEvent, ExecutionLogRecord, ExecutionStatus, FlowError, LogSink,
    NodeError, NodeKind, NodeProcessor, NodeSpec, StoreError, Value, Workflow, WorkflowError,
};
use flowruntime::{FlowRuntime, ProcessorRegistry, RuntimeConfig};
use serde_json::json;
use std::sync::Arc;

/// Initialize tracing for tests
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Publishes `<id>.response` and echoes node data; fails when `fail` is set.
struct StubProcessor {
    kind: NodeKind,
}

#[async_trait]
impl NodeProcessor for StubProcessor {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    async fn process(&self, node: &NodeSpec, ctx: &mut ExecutionContext) -> Result<Value, NodeError> {
        if let Some(message) = node.str_field("fail") {
            return Err(NodeError::ExecutionFailed(message.to_string()));
        }
        let output = node.field("emit").cloned().unwrap_or_else(|| json!(node.id));
        ctx.set(format!("{}.response", node.id), output.clone());
        Ok(output)
    }
}

fn stub_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    for kind in NodeKind::ALL {
        registry.register(Arc::new(StubProcessor { kind }));
    }
    registry
}

async fn runtime_with(workflow: Workflow) -> (FlowRuntime, MemoryLogSink) {
    init_tracing();
    let store = InMemoryWorkflowStore::new();
    store.insert(workflow).await;
    let sink = MemoryLogSink::new();
    let runtime = FlowRuntime::new(stub_registry(), Arc::new(store), RuntimeConfig::default())
        .with_log_sink(Arc::new(sink.clone()));
    (runtime, sink)
}

fn chain(kinds: &[(&str, NodeKind)]) -> Workflow {
    let mut wf = Workflow::new("wf-1", "Chain").with_owner("alice").published("chain");
    for (id, kind) in kinds {
        wf.add_node(NodeSpec::new(*id, *kind));
    }
    for pair in kinds.windows(2) {
        wf.connect(pair[0].0, pair[1].0);
    }
    wf
}

async fn single_record(sink: &MemoryLogSink) -> ExecutionLogRecord {
    let records = sink.records().await;
    assert_eq!(records.len(), 1, "exactly one log record per execution");
    records.into_iter().next().unwrap()
}

#[tokio::test]
async fn test_successful_run_returns_last_output_node() {
    let mut wf = chain(&[
        ("a", NodeKind::Api),
        ("o1", NodeKind::Output),
        ("o2", NodeKind::Output),
    ]);
    wf.config.nodes[1].data.insert("emit".into(), json!("first"));
    wf.config.nodes[2].data.insert("emit".into(), json!({ "final": true }));
    let (runtime, sink) = runtime_with(wf).await;

    let output = runtime
        .execute_workflow("wf-1", Some(json!({ "q": 1 })), Some("alice"))
        .await
        .unwrap();

    assert_eq!(output, Some(json!({ "final": true })));

    let record = single_record(&sink).await;
    assert_eq!(record.status, ExecutionStatus::Success);
    assert_eq!(record.workflow_id, "wf-1");
    assert_eq!(record.input, Some(json!({ "q": 1 })));
    assert_eq!(record.output, Some(json!({ "final": true })));
    let order: Vec<&str> = record.node_executions.iter().map(|r| r.node_id.as_str()).collect();
    assert_eq!(order, vec!["a", "o1", "o2"]);
    assert!(record.node_executions.iter().all(|r| r.is_success()));
    assert!(record.error.is_none());
    assert!(record.completed_at >= record.started_at);
}

#[tokio::test]
async fn test_no_output_node_yields_none() {
    let (runtime, sink) = runtime_with(chain(&[("a", NodeKind::Api), ("t", NodeKind::Transform)])).await;

    let output = runtime.execute_workflow("chain", None, None).await.unwrap();

    assert_eq!(output, None);
    let record = single_record(&sink).await;
    assert_eq!(record.status, ExecutionStatus::Success);
    assert_eq!(record.input, None);
    assert_eq!(record.node_executions.len(), 2);
}

#[tokio::test]
async fn test_node_failure_aborts_remaining_nodes() {
    let mut wf = chain(&[
        ("a", NodeKind::Auth),
        ("b", NodeKind::Api),
        ("c", NodeKind::Output),
    ]);
    wf.config.nodes[1].data.insert("fail".into(), json!("connection refused"));
    let (runtime, sink) = runtime_with(wf).await;

    let err = runtime.execute_workflow("wf-1", None, Some("alice")).await.unwrap_err();

    match &err {
        FlowError::NodeFailed { node_id, message } => {
            assert_eq!(node_id, "b");
            assert!(message.contains("connection refused"));
        }
        other => panic!("Expected node failure, got {:?}", other),
    }

    let record = single_record(&sink).await;
    assert_eq!(record.status, ExecutionStatus::Failed);
    assert_eq!(record.node_executions.len(), 2, "c never runs");
    assert_eq!(record.node_executions[0].status, ExecutionStatus::Success);
    assert_eq!(record.node_executions[1].status, ExecutionStatus::Failed);

    let node_error = record.node_executions[1].error.as_ref().unwrap();
    assert_eq!(node_error.code.as_deref(), Some("EXECUTION"));
    assert!(node_error.stack.is_some());

    let error = record.error.unwrap();
    assert_eq!(error.message, "Node b failed: Execution failed: connection refused");
    assert_eq!(error.code.as_deref(), Some("EXECUTION"));
}

#[tokio::test]
async fn test_cycle_fails_before_any_node_runs() {
    let mut wf = chain(&[("a", NodeKind::Api), ("b", NodeKind::Output)]);
    wf.connect("b", "a");
    let (runtime, sink) = runtime_with(wf).await;

    let err = runtime.execute_workflow("wf-1", None, Some("alice")).await.unwrap_err();

    assert!(matches!(
        err,
        FlowError::Workflow(WorkflowError::CyclicDependency { ref workflow }) if workflow == "wf-1"
    ));
    let record = single_record(&sink).await;
    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.node_executions.is_empty());
    assert!(record.error.unwrap().message.contains("contains cycles"));
}

#[tokio::test]
async fn test_unknown_node_type_fails_that_node() {
    let mut wf = chain(&[("a", NodeKind::Api)]);
    wf.add_node(NodeSpec {
        id: "w".to_string(),
        node_type: "webhook".to_string(),
        position: None,
        data: Default::default(),
    });
    wf.connect("a", "w");
    let (runtime, sink) = runtime_with(wf).await;

    let err = runtime.execute_workflow("wf-1", None, Some("alice")).await.unwrap_err();
    assert!(matches!(err, FlowError::NodeFailed { ref node_id, .. } if node_id == "w"));

    let record = single_record(&sink).await;
    assert_eq!(record.node_executions.len(), 2);
    let failed = &record.node_executions[1];
    assert_eq!(failed.node_type, "webhook");
    assert_eq!(failed.error.as_ref().unwrap().code.as_deref(), Some("UNKNOWN_NODE_TYPE"));
}

#[tokio::test]
async fn test_missing_workflow_is_logged_under_raw_identifier() {
    let (runtime, sink) = runtime_with(chain(&[("a", NodeKind::Api)])).await;

    let err = runtime.execute_workflow("no-such-slug", None, None).await.unwrap_err();

    assert!(matches!(err, FlowError::Workflow(WorkflowError::NotFound(ref id)) if id == "no-such-slug"));
    let record = single_record(&sink).await;
    assert_eq!(record.workflow_id, "no-such-slug");
    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.node_executions.is_empty());
}

#[tokio::test]
async fn test_wrong_owner_is_forbidden() {
    let (runtime, _sink) = runtime_with(chain(&[("a", NodeKind::Api)])).await;

    let err = runtime.execute_workflow("wf-1", None, Some("mallory")).await.unwrap_err();

    assert!(matches!(err, FlowError::Workflow(WorkflowError::Forbidden(_))));
}

#[tokio::test]
async fn test_unpublished_workflow_is_not_reachable_by_slug() {
    let mut wf = chain(&[("a", NodeKind::Api)]);
    wf.is_published = false;
    let (runtime, _sink) = runtime_with(wf).await;

    let err = runtime.execute_workflow("chain", None, None).await.unwrap_err();
    assert!(matches!(err, FlowError::Workflow(WorkflowError::NotFound(_))));
}

struct BrokenSink;

#[async_trait]
impl LogSink for BrokenSink {
    async fn append(&self, _record: ExecutionLogRecord) -> Result<(), StoreError> {
        Err(StoreError::Backend("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_log_sink_failure_does_not_mask_outcome() {
    init_tracing();
    let store = InMemoryWorkflowStore::new();
    let mut wf = chain(&[("o", NodeKind::Output)]);
    wf.config.nodes[0].data.insert("emit".into(), json!(7));
    store.insert(wf).await;

    let runtime = FlowRuntime::new(stub_registry(), Arc::new(store), RuntimeConfig::default())
        .with_log_sink(Arc::new(BrokenSink));

    let output = runtime.execute_workflow("chain", None, None).await.unwrap();
    assert_eq!(output, Some(json!(7)));
}

#[tokio::test]
async fn test_events_are_broadcast_in_order() {
    let (runtime, _sink) = runtime_with(chain(&[("a", NodeKind::Api), ("o", NodeKind::Output)])).await;
    let mut events = runtime.subscribe_events();

    runtime.execute_workflow("chain", None, None).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(match event {
            ExecutionEvent::WorkflowStarted { .. } => "workflow_started",
            ExecutionEvent::NodeStarted { .. } => "node_started",
            ExecutionEvent::NodeCompleted { .. } => "node_completed",
            ExecutionEvent::NodeFailed { .. } => "node_failed",
            ExecutionEvent::NodeEvent { .. } => "node_event",
            ExecutionEvent::WorkflowCompleted { status, .. } => {
                assert_eq!(status, ExecutionStatus::Success);
                "workflow_completed"
            }
        });
    }

    assert_eq!(
        kinds,
        vec![
            "workflow_started",
            "node_started",
            "node_completed",
            "node_started",
            "node_completed",
            "workflow_completed"
        ]
    );
}

#[tokio::test]
async fn test_failed_node_event_carries_log_code() {
    let mut wf = chain(&[("a", NodeKind::Api), ("o", NodeKind::Output)]);
    wf.config.nodes[0].data.insert("fail".into(), json!("timeout upstream"));
    let (runtime, _sink) = runtime_with(wf).await;
    let mut events = runtime.subscribe_events();

    runtime.execute_workflow("chain", None, None).await.unwrap_err();

    let mut failure = None;
    let mut completion = None;
    while let Ok(event) = events.try_recv() {
        match &event {
            ExecutionEvent::NodeFailed { node_id, code, .. } => {
                failure = Some((node_id.clone(), code.clone()));
            }
            ExecutionEvent::WorkflowCompleted { status, .. } => {
                completion = Some(*status);
                let wire = serde_json::to_value(&event).unwrap();
                assert_eq!(wire["type"], json!("workflow_completed"));
                assert_eq!(wire["status"], json!("failed"));
            }
            _ => {}
        }
    }

    assert_eq!(failure, Some(("a".to_string(), "EXECUTION".to_string())));
    assert_eq!(completion, Some(ExecutionStatus::Failed));
}

#[tokio::test]
async fn test_concurrent_executions_do_not_share_context() {
    let mut wf = chain(&[("o", NodeKind::Output)]);
    wf.config.nodes[0].data.insert("emit".into(), json!("done"));
    let (runtime, sink) = runtime_with(wf).await;
    let runtime = Arc::new(runtime);

    let mut handles = Vec::new();
    for i in 0..8 {
        let runtime = runtime.clone();
        handles.push(tokio::spawn(async move {
            runtime.execute_workflow("chain", Some(json!({ "n": i })), None).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), Some(json!("done")));
    }

    let records = sink.records().await;
    assert_eq!(records.len(), 8);
    let mut ids: Vec<_> = records.iter().map(|r| r.execution_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8, "each execution gets its own id");
}

#[tokio::test]
async fn test_validate_reports_structure_and_unknown_types() {
    let (runtime, _sink) = runtime_with(chain(&[("a", NodeKind::Api)])).await;

    assert!(runtime.validate(&chain(&[("a", NodeKind::Api), ("b", NodeKind::Output)])).is_ok());

    let mut cyclic = chain(&[("a", NodeKind::Api), ("b", NodeKind::Output)]);
    cyclic.connect("b", "a");
    assert!(runtime.validate(&cyclic).is_err());

    let mut unknown = chain(&[("a", NodeKind::Api)]);
    unknown.config.nodes[0].node_type = "email".to_string();
    let err = runtime.validate(&unknown).unwrap_err();
    assert!(err.to_string().contains("Unknown node type: email"));
}

#[test]
fn test_config_from_toml_keeps_defaults() {
    let config = RuntimeConfig::from_toml(
        r#"
        http_timeout_secs = 5

        [script]
        max_operations = 10
        "#,
    )
    .unwrap();

    assert_eq!(config.http_timeout_secs, 5);
    assert_eq!(config.script.max_operations, 10);
    assert_eq!(config.event_buffer_size, 1000);
    assert_eq!(config.log_write_timeout_ms, 5000);
    assert_eq!(config.script.max_expr_depth, 64);

    assert!(RuntimeConfig::from_toml("http_timeout_secs = \"soon\"").is_err());
}
