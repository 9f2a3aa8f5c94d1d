//! Standard node library
//!
//! One processor per node kind, plus the reqwest-backed HTTP client used by
//! api nodes and the script sandbox used by transform nodes.

mod api;
mod auth;
mod http;
mod logic;
mod output;
mod script;
mod transform;

pub use api::ApiProcessor;
pub use auth::AuthProcessor;
pub use http::ReqwestHttpClient;
pub use logic::{evaluate_condition, LogicProcessor, Operator};
pub use output::{object_to_xml, OutputFormat, OutputProcessor};
pub use script::ScriptSandbox;
pub use transform::{TransformKind, TransformProcessor};

use flowcore::{AuthConfigStore, HttpClient, HttpError};
use flowruntime::{ProcessorRegistry, RuntimeConfig};
use std::sync::Arc;

/// Collaborators shared by the built-in processors
#[derive(Clone)]
pub struct Services {
    pub auth_configs: Arc<dyn AuthConfigStore>,
    pub http: Arc<dyn HttpClient>,
}

/// Register all standard processors with a registry
pub fn register_all(registry: &mut ProcessorRegistry, services: Services, config: &RuntimeConfig) {
    registry.register(Arc::new(AuthProcessor::new(services.auth_configs)));
    registry.register(Arc::new(ApiProcessor::new(services.http)));
    registry.register(Arc::new(TransformProcessor::new(ScriptSandbox::new(&config.script))));
    registry.register(Arc::new(LogicProcessor));
    registry.register(Arc::new(OutputProcessor));
}

/// Registry holding every standard processor, with api nodes going through a
/// `ReqwestHttpClient` that honours `config.http_timeout_secs`.
pub fn default_registry(
    auth_configs: Arc<dyn AuthConfigStore>,
    config: &RuntimeConfig,
) -> Result<ProcessorRegistry, HttpError> {
    let http = Arc::new(ReqwestHttpClient::new(config.http_timeout())?);
    let mut registry = ProcessorRegistry::new();
    register_all(&mut registry, Services { auth_configs, http }, config);
    Ok(registry)
}
