use async_trait::async_trait;
use flowcore::{ExecutionContext, NodeError, NodeKind, NodeProcessor, NodeSpec, Value, ValueExt};
use serde_json::json;
use std::cmp::Ordering;

/// Comparison operators accepted by logic nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    /// Parse a symbolic or named operator (`>` or `greater_than`).
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "==" | "equals" => Operator::Equals,
            "!=" | "not_equals" => Operator::NotEquals,
            ">" | "greater_than" => Operator::GreaterThan,
            "<" | "less_than" => Operator::LessThan,
            ">=" | "greater_than_or_equal" => Operator::GreaterThanOrEqual,
            "<=" | "less_than_or_equal" => Operator::LessThanOrEqual,
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "is_empty" => Operator::IsEmpty,
            "is_not_empty" => Operator::IsNotEmpty,
            _ => return None,
        };
        Some(op)
    }

    /// Apply the operator. An absent left operand never orders, equals only
    /// what null equals, and counts as empty.
    pub fn apply(&self, left: Option<&Value>, right: &Value) -> bool {
        let Some(left) = left else {
            return match self {
                Operator::Equals => Value::Null.loose_eq(right),
                Operator::NotEquals => !Value::Null.loose_eq(right),
                Operator::NotContains | Operator::IsEmpty => true,
                _ => false,
            };
        };
        let ordering = || left.loose_cmp(right);

        match self {
            Operator::Equals => left.loose_eq(right),
            Operator::NotEquals => !left.loose_eq(right),
            Operator::GreaterThan => ordering() == Some(Ordering::Greater),
            Operator::LessThan => ordering() == Some(Ordering::Less),
            Operator::GreaterThanOrEqual => {
                matches!(ordering(), Some(Ordering::Greater | Ordering::Equal))
            }
            Operator::LessThanOrEqual => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
            Operator::Contains => contains(left, right).unwrap_or(false),
            Operator::NotContains => contains(left, right).map(|found| !found).unwrap_or(true),
            Operator::StartsWith => match (left, right) {
                (Value::String(l), Value::String(r)) => l.starts_with(r.as_str()),
                _ => false,
            },
            Operator::EndsWith => match (left, right) {
                (Value::String(l), Value::String(r)) => l.ends_with(r.as_str()),
                _ => false,
            },
            Operator::IsEmpty => is_empty(left),
            Operator::IsNotEmpty => !is_empty(left),
        }
    }
}

/// Substring or membership test; `None` when neither applies.
fn contains(haystack: &Value, needle: &Value) -> Option<bool> {
    match (haystack, needle) {
        (Value::String(h), Value::String(n)) => Some(h.contains(n.as_str())),
        (Value::Array(items), _) => Some(items.iter().any(|item| item.strict_eq(needle))),
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    !value.is_truthy() || value.len() == Some(0)
}

/// Evaluate `left <operator> right`, where `left` is `None` when the value
/// could not be resolved. Returns `None` for an unknown operator.
pub fn evaluate_condition(left: Option<&Value>, operator: &str, right: &Value) -> Option<bool> {
    Operator::from_name(operator).map(|op| op.apply(left, right))
}

/// Evaluates a condition and publishes the boolean to `<id>.result`.
pub struct LogicProcessor;

#[async_trait]
impl NodeProcessor for LogicProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Logic
    }

    fn description(&self) -> &str {
        "Compare a value against a condition"
    }

    async fn process(&self, node: &NodeSpec, ctx: &mut ExecutionContext) -> Result<Value, NodeError> {
        let source = ctx.source_value(node.str_field("sourceNodeId"));

        let evaluated = match node.str_field("condition") {
            Some(path) => source.and_then(|value| value.get_path(path)).cloned(),
            None => source.cloned(),
        };

        let comparison = match node.data.get("value") {
            Some(Value::String(text)) => Value::String(ctx.resolve_str(text)),
            Some(other) => other.clone(),
            None => Value::Null,
        };

        let operator = node.str_field("operator").unwrap_or_default();
        let condition_met = match evaluate_condition(evaluated.as_ref(), operator, &comparison) {
            Some(met) => met,
            None => {
                ctx.warn(&node.id, format!("Unknown operator: {}", operator));
                false
            }
        };

        tracing::debug!(
            node_id = %node.id,
            "Logic evaluation: {} {} {} = {}",
            evaluated.as_ref().unwrap_or(&serde_json::Value::Null),
            operator,
            comparison,
            condition_met
        );

        ctx.set(format!("{}.result", node.id), Value::Bool(condition_met));

        Ok(json!({
            "conditionMet": condition_met,
            "evaluatedValue": evaluated.unwrap_or(Value::Null),
            "operator": node.data.get("operator").cloned().unwrap_or(Value::Null),
            "comparisonValue": comparison,
        }))
    }
}
