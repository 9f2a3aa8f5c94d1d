use async_trait::async_trait;
use flowcore::{AuthConfigStore, ExecutionContext, NodeError, NodeKind, NodeProcessor, NodeSpec, Value};
use std::sync::Arc;

/// Loads a credential bundle into the execution context.
///
/// The bundle is stored under both the node id and the config id so api
/// nodes can reference either. Only a summary is returned as output.
pub struct AuthProcessor {
    store: Arc<dyn AuthConfigStore>,
}

impl AuthProcessor {
    pub fn new(store: Arc<dyn AuthConfigStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NodeProcessor for AuthProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Auth
    }

    fn description(&self) -> &str {
        "Load decrypted credentials for later api nodes"
    }

    async fn process(&self, node: &NodeSpec, ctx: &mut ExecutionContext) -> Result<Value, NodeError> {
        let config_id = node.require_str("authConfigId")?;

        let config = self.store.get_decrypted(config_id).await.map_err(|e| {
            NodeError::ExecutionFailed(format!("Failed to load auth config {}: {}", config_id, e))
        })?;

        tracing::debug!(node_id = %node.id, auth_config = %config.id, "Loaded auth config");

        let summary = config.summary();
        ctx.insert_auth_config(config.id.clone(), config.clone());
        ctx.insert_auth_config(node.id.clone(), config);

        Ok(summary)
    }
}
