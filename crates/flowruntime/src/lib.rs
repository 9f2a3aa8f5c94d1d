//! Workflow execution runtime
//!
//! This crate provides the execution engine that plans and runs workflows,
//! the registry that maps node kinds to processors, and the runtime that
//! resolves workflows from a store and records every execution.

mod config;
mod executor;
pub mod planner;
mod registry;
mod runtime;

pub use config::{RuntimeConfig, ScriptLimits};
pub use executor::WorkflowExecutor;
pub use planner::plan;
pub use registry::{ProcessorMetadata, ProcessorRegistry};
pub use runtime::FlowRuntime;
