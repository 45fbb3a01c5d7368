//! Flow directory capability: lookup of flow definitions by id.

use crate::flow::FlowDefinition;
use std::collections::HashMap;

/// Errors that can occur while reading from a flow directory.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Backend failure in a directory implementation.
    #[error("Flow directory backend failed with error: {source}")]
    Backend {
        #[source]
        source: crate::BoxError,
    },
}

/// Stores and returns flow definitions.
///
/// An absent flow is `Ok(None)`, not an error; the caller decides whether
/// absence is fatal.
#[async_trait::async_trait]
pub trait FlowDirectory: Send + Sync {
    async fn get(&self, flow_id: &str) -> Result<Option<FlowDefinition>, Error>;
}

/// In-memory directory for tests and embedding.
#[derive(Default)]
pub struct MemoryFlowDirectory {
    flows: HashMap<String, FlowDefinition>,
}

impl MemoryFlowDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a flow definition, replacing any previous entry with the
    /// same id.
    pub fn insert(&mut self, flow: FlowDefinition) {
        self.flows.insert(flow.id.clone(), flow);
    }
}

#[async_trait::async_trait]
impl FlowDirectory for MemoryFlowDirectory {
    async fn get(&self, flow_id: &str) -> Result<Option<FlowDefinition>, Error> {
        Ok(self.flows.get(flow_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_directory_lookup() {
        let mut directory = MemoryFlowDirectory::new();
        directory.insert(FlowDefinition {
            id: "f1".to_string(),
            name: None,
            source_config: None,
            target_config: None,
        });

        let found = directory.get("f1").await.unwrap();
        assert_eq!(found.unwrap().id, "f1");

        let missing = directory.get("f2").await.unwrap();
        assert!(missing.is_none());
    }
}
