use crate::script::ScriptSandbox;
use async_trait::async_trait;
use flowcore::{ExecutionContext, NodeError, NodeKind, NodeProcessor, NodeSpec, Value, ValueExt};
use serde_json::{json, Map};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Map,
    Filter,
    Reduce,
    Custom,
}

impl TransformKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "map" => Some(TransformKind::Map),
            "filter" => Some(TransformKind::Filter),
            "reduce" => Some(TransformKind::Reduce),
            "custom" => Some(TransformKind::Custom),
            _ => None,
        }
    }
}

/// Reshapes data from a previous node (or the workflow input) and publishes
/// it to `<id>.result`.
pub struct TransformProcessor {
    sandbox: ScriptSandbox,
}

impl TransformProcessor {
    pub fn new(sandbox: ScriptSandbox) -> Self {
        Self { sandbox }
    }

    fn filter(&self, node: &NodeSpec, data: Value) -> Result<Value, NodeError> {
        let Value::Array(items) = data else {
            return Err(NodeError::ExecutionFailed(
                "Filter transform requires array input".to_string(),
            ));
        };

        let ast = self.sandbox.compile(node.require_str("script")?)?;

        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if self.sandbox.eval(&ast, "item", &item)?.is_truthy() {
                kept.push(item);
            }
        }
        Ok(Value::Array(kept))
    }

    fn custom(&self, node: &NodeSpec, data: Value) -> Result<Value, NodeError> {
        match node.str_field("script") {
            Some(script) => {
                let ast = self.sandbox.compile(script)?;
                self.sandbox.eval(&ast, "data", &data)
            }
            None => Ok(data),
        }
    }
}

/// `{count, items}` summary of an array source.
fn reduce(data: Value) -> Result<Value, NodeError> {
    match data {
        Value::Array(items) => Ok(json!({ "count": items.len(), "items": items })),
        _ => Err(NodeError::ExecutionFailed(
            "Reduce transform requires array input".to_string(),
        )),
    }
}

/// Apply `mapping` (new key -> dotted source path) to an object or to every
/// element of an array.
fn map_fields(data: Value, mapping: Option<&Value>) -> Value {
    let Some(Value::Object(mapping)) = mapping else {
        return data;
    };

    match data {
        Value::Array(items) => Value::Array(items.iter().map(|item| map_object(item, mapping)).collect()),
        other => map_object(&other, mapping),
    }
}

fn map_object(item: &Value, mapping: &Map<String, Value>) -> Value {
    let mapped = mapping
        .iter()
        .filter_map(|(new_key, path)| {
            let path = path.as_str()?;
            item.get_path(path).map(|v| (new_key.clone(), v.clone()))
        })
        .collect();
    Value::Object(mapped)
}

#[async_trait]
impl NodeProcessor for TransformProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Transform
    }

    fn description(&self) -> &str {
        "Map, filter, reduce or script over upstream data"
    }

    async fn process(&self, node: &NodeSpec, ctx: &mut ExecutionContext) -> Result<Value, NodeError> {
        let source = ctx.source_value(node.str_field("sourceNodeId")).cloned();

        let data = match source {
            Some(value) if value.is_truthy() => value,
            _ => {
                ctx.warn(&node.id, "No source data available for transformation");
                return Ok(Value::Null);
            }
        };

        let name = node.str_field("transformType").unwrap_or_default();
        let kind = TransformKind::from_name(name)
            .ok_or_else(|| NodeError::Configuration(format!("Unknown transform type: {}", name)))?;

        let result = match kind {
            TransformKind::Map => map_fields(data, node.field("mapping")),
            TransformKind::Filter => self.filter(node, data)?,
            TransformKind::Reduce => reduce(data)?,
            TransformKind::Custom => self.custom(node, data)?,
        };

        ctx.set(format!("{}.result", node.id), result.clone());
        Ok(result)
    }
}
