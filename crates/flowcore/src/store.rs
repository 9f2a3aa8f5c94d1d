//! Collaborator contracts consumed by the engine, plus in-memory
//! implementations used for embedding and tests.

use crate::execution_log::{ExecutionLogRecord, ExecutionStatus};
use crate::{AuthConfig, Workflow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Fetch a workflow owned by `owner_id`.
    async fn get_by_id(&self, id: &str, owner_id: &str) -> Result<Workflow, StoreError>;

    /// Fetch a published workflow by its public slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Workflow, StoreError>;
}

#[async_trait]
pub trait AuthConfigStore: Send + Sync {
    /// Fetch a credential bundle with its secrets already decrypted.
    async fn get_decrypted(&self, id: &str) -> Result<AuthConfig, StoreError>;
}

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, record: ExecutionLogRecord) -> Result<(), StoreError>;
}

#[derive(Default, Clone)]
pub struct InMemoryWorkflowStore {
    workflows: Arc<RwLock<HashMap<String, Workflow>>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, workflow: Workflow) {
        let mut workflows = self.workflows.write().await;
        workflows.insert(workflow.id.clone(), workflow);
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn get_by_id(&self, id: &str, owner_id: &str) -> Result<Workflow, StoreError> {
        let workflows = self.workflows.read().await;
        let workflow = workflows
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("Workflow {}", id)))?;

        if workflow.owner_id != owner_id {
            return Err(StoreError::Forbidden(format!(
                "workflow {} is not owned by {}",
                id, owner_id
            )));
        }
        Ok(workflow.clone())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Workflow, StoreError> {
        let workflows = self.workflows.read().await;
        workflows
            .values()
            .find(|w| w.is_published && w.slug.as_deref() == Some(slug))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Workflow with slug {}", slug)))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryAuthConfigStore {
    configs: Arc<RwLock<HashMap<String, AuthConfig>>>,
}

impl InMemoryAuthConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, config: AuthConfig) {
        let mut configs = self.configs.write().await;
        configs.insert(config.id.clone(), config);
    }
}

#[async_trait]
impl AuthConfigStore for InMemoryAuthConfigStore {
    async fn get_decrypted(&self, id: &str) -> Result<AuthConfig, StoreError> {
        let configs = self.configs.read().await;
        configs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Auth config {}", id)))
    }
}

/// Keeps every record in memory; clones share the same buffer.
#[derive(Default, Clone)]
pub struct MemoryLogSink {
    records: Arc<RwLock<Vec<ExecutionLogRecord>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ExecutionLogRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn append(&self, record: ExecutionLogRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record);
        Ok(())
    }
}

/// Writes each record as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

#[async_trait]
impl LogSink for TracingLogSink {
    async fn append(&self, record: ExecutionLogRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&record)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match record.status {
            ExecutionStatus::Success => tracing::info!(
                target: "flowcore::execution_log",
                execution_id = %record.execution_id,
                workflow_id = %record.workflow_id,
                duration_ms = record.duration_ms,
                nodes = record.node_executions.len(),
                record = %payload,
                "workflow execution succeeded"
            ),
            ExecutionStatus::Failed => tracing::error!(
                target: "flowcore::execution_log",
                execution_id = %record.execution_id,
                workflow_id = %record.workflow_id,
                duration_ms = record.duration_ms,
                nodes = record.node_executions.len(),
                record = %payload,
                "workflow execution failed"
            ),
        }
        Ok(())
    }
}
