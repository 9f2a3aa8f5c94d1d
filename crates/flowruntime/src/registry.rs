use flowcore::{NodeError, NodeKind, NodeProcessor};
use std::collections::HashMap;
use std::sync::Arc;

/// Metadata about a registered node kind
#[derive(Debug, Clone)]
pub struct ProcessorMetadata {
    pub kind: NodeKind,
    pub description: String,
}

/// Registry of processors, one per node kind
pub struct ProcessorRegistry {
    processors: HashMap<NodeKind, Arc<dyn NodeProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Register a processor; a later registration for the same kind wins.
    pub fn register(&mut self, processor: Arc<dyn NodeProcessor>) {
        let kind = processor.kind();
        tracing::debug!("Registering processor for node kind: {}", kind);
        self.processors.insert(kind, processor);
    }

    /// Look up the processor for a raw node type string.
    pub fn resolve(&self, node_type: &str) -> Result<Arc<dyn NodeProcessor>, NodeError> {
        let kind: NodeKind = node_type.parse()?;
        self.get(kind)
            .ok_or_else(|| NodeError::UnknownNodeType(node_type.to_string()))
    }

    pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn NodeProcessor>> {
        self.processors.get(&kind).cloned()
    }

    /// Registered kinds in canonical order
    pub fn list_node_kinds(&self) -> Vec<NodeKind> {
        NodeKind::ALL
            .into_iter()
            .filter(|kind| self.processors.contains_key(kind))
            .collect()
    }

    /// Kinds with no processor registered
    pub fn missing_kinds(&self) -> Vec<NodeKind> {
        NodeKind::ALL
            .into_iter()
            .filter(|kind| !self.processors.contains_key(kind))
            .collect()
    }

    pub fn get_metadata(&self, kind: NodeKind) -> Option<ProcessorMetadata> {
        self.processors.get(&kind).map(|p| ProcessorMetadata {
            kind,
            description: p.description().to_string(),
        })
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
