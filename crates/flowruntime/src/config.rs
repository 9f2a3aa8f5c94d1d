use flowcore::FlowError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the runtime and the built-in processors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Capacity of the execution event broadcast channel.
    pub event_buffer_size: usize,
    /// Upper bound for a single outbound HTTP call made by an api node.
    pub http_timeout_secs: u64,
    /// How long an execution waits for the log sink before giving up on it.
    pub log_write_timeout_ms: u64,
    pub script: ScriptLimits,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
            http_timeout_secs: 30,
            log_write_timeout_ms: 5000,
            script: ScriptLimits::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load config from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, FlowError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, FlowError> {
        toml::from_str(content).map_err(|e| FlowError::Config(e.to_string()))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn log_write_timeout(&self) -> Duration {
        Duration::from_millis(self.log_write_timeout_ms)
    }
}

/// Resource limits for transform scripts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    pub max_operations: u64,
    pub max_expr_depth: usize,
    pub max_string_size: usize,
    pub max_collection_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_expr_depth: 64,
            max_string_size: 1024 * 1024,
            max_collection_size: 100_000,
        }
    }
}
