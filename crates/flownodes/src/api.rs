use async_trait::async_trait;
use flowcore::{
    ExecutionContext, HttpClient, HttpError, HttpRequest, NodeError, NodeKind, NodeProcessor,
    NodeSpec, Value,
};
use serde_json::{json, Map};
use std::sync::Arc;

/// Calls an external HTTP API and publishes the response.
///
/// Publishes `<id>.response`, `<id>.status` and `<id>.headers`. A non-2xx
/// status is not a failure.
pub struct ApiProcessor {
    client: Arc<dyn HttpClient>,
}

impl ApiProcessor {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }
}

/// Object-valued field with placeholders resolved; anything else is empty.
fn resolved_object(node: &NodeSpec, ctx: &ExecutionContext, name: &str) -> Map<String, Value> {
    match node.field(name).map(|v| ctx.resolve_value(v)) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl NodeProcessor for ApiProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Api
    }

    fn description(&self) -> &str {
        "Call an HTTP endpoint"
    }

    async fn process(&self, node: &NodeSpec, ctx: &mut ExecutionContext) -> Result<Value, NodeError> {
        let url = node.require_str("url")?;
        let method = node.require_str("method")?.to_uppercase();

        let mut request = HttpRequest::new(method, ctx.resolve_str(url));
        request.headers = resolved_object(node, ctx, "headers");
        request.params = resolved_object(node, ctx, "params");
        request.data = node.field("body").map(|body| ctx.resolve_value(body));

        if let Some(auth_id) = node.str_field("authId") {
            match ctx.auth_config(auth_id) {
                Some(config) => request.auth = Some(config.clone()),
                None => ctx.warn(&node.id, format!("Auth config {} not found in context", auth_id)),
            }
        }

        ctx.emitter(&node.id)
            .info(format!("{} {}", request.method, request.url));

        let response = self.client.request(request).await.map_err(|e| match e {
            HttpError::Timeout { seconds } => NodeError::Timeout { seconds },
            other => NodeError::ExecutionFailed(format!("API call failed: {}", other)),
        })?;

        tracing::debug!(node_id = %node.id, "API call returned {}", response.status);

        ctx.set(format!("{}.response", node.id), response.data.clone());
        ctx.set(format!("{}.status", node.id), json!(response.status));
        ctx.set(format!("{}.headers", node.id), Value::Object(response.headers));

        Ok(response.data)
    }
}
