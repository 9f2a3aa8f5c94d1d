use crate::events::{EventBus, EventEmitter, ExecutionId};
use crate::{AuthConfig, ValueExt};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

pub const INPUT_KEY: &str = "input";

// Literal pattern, so compilation cannot fail at runtime.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Per-execution variable and credential store.
///
/// Owned by the executor for one run and handed to each processor as
/// `&mut`. Entries are only ever added or overwritten, never removed.
pub struct ExecutionContext {
    execution_id: ExecutionId,
    variables: Map<String, Value>,
    auth_configs: HashMap<String, AuthConfig>,
    events: EventBus,
}

impl ExecutionContext {
    pub fn new(execution_id: ExecutionId, events: EventBus) -> Self {
        Self {
            execution_id,
            variables: Map::new(),
            auth_configs: HashMap::new(),
            events,
        }
    }

    /// Context with a private event bus, for running processors in isolation.
    pub fn detached() -> Self {
        Self::new(ExecutionId::new_v4(), EventBus::default())
    }

    /// Seed the triggering payload under `input`.
    pub fn with_input(mut self, input: Value) -> Self {
        self.set(INPUT_KEY, input);
        self
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.variables.insert(key.into(), value);
    }

    pub fn input(&self) -> Option<&Value> {
        self.get(INPUT_KEY)
    }

    /// Published `response` of another node.
    pub fn node_response(&self, node_id: &str) -> Option<&Value> {
        self.get(&format!("{}.response", node_id))
    }

    /// `<sourceNodeId>.response` when a source node is named, else `input`.
    pub fn source_value(&self, source_node_id: Option<&str>) -> Option<&Value> {
        match source_node_id {
            Some(id) => self.node_response(id),
            None => self.input(),
        }
    }

    /// Flat snapshot of every variable, in insertion order.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.variables.clone())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn auth_config(&self, key: &str) -> Option<&AuthConfig> {
        self.auth_configs.get(key)
    }

    pub fn insert_auth_config(&mut self, key: impl Into<String>, config: AuthConfig) {
        self.auth_configs.insert(key.into(), config);
    }

    pub fn emitter(&self, node_id: &str) -> EventEmitter {
        self.events.create_emitter(self.execution_id, node_id.to_string())
    }

    /// Record a soft failure: traced and broadcast, never raised.
    pub fn warn(&self, node_id: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(execution_id = %self.execution_id, node_id, "{}", message);
        self.emitter(node_id).warn(message);
    }

    /// Replace every `${key}` in `text` with the variable stored under the
    /// literal key `key`. Unknown keys are left untouched.
    pub fn resolve_str(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| match self.variables.get(&caps[1]) {
                Some(value) => value.to_display_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Resolve placeholders in every string reachable through arrays and
    /// objects. Other values are returned unchanged.
    pub fn resolve_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.resolve_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve_value(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Substitute `${dotted.path}` placeholders against a single value using
/// nested field access. Unresolved placeholders are kept verbatim.
pub fn render_template(template: &str, data: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match data.get_path(&caps[1]) {
            Some(value) => value.to_display_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
