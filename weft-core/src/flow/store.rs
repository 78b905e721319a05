//! # Flow Store Boundary
//!
//! Flow definitions live outside this crate (a database, a file, a test
//! harness); the engine only needs to fetch one by identifier. The run trigger
//! exposed here reports overall success or failure plus a diagnostic message;
//! no partial-progress payload.

use super::engine::LinearFlow;
use super::model::FlowDefinition;
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum FlowStoreError {
    #[error("Flow '{0}' not found")]
    NotFound(String),
}

/// Read access to persisted flow definitions.
#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<FlowDefinition, FlowStoreError>;
}

/// The in-process implementation of the store boundary.
#[derive(Debug, Default)]
pub struct InMemoryFlowStore {
    flows: HashMap<String, FlowDefinition>,
}

impl InMemoryFlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `flow` under its own identifier, replacing any previous
    /// definition with the same one.
    pub fn insert(&mut self, flow: FlowDefinition) {
        self.flows.insert(flow.id.clone(), flow);
    }
}

#[async_trait]
impl FlowStore for InMemoryFlowStore {
    async fn get(&self, id: &str) -> Result<FlowDefinition, FlowStoreError> {
        self.flows
            .get(id)
            .cloned()
            .ok_or_else(|| FlowStoreError::NotFound(id.to_string()))
    }
}

/// The result of one flow run: overall success plus, on failure, the failing
/// step's diagnostic message.
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub success: bool,
    pub message: Option<String>,
}

/// Executes the flow registered under `id` with a fresh [`LinearFlow`].
///
/// Every failure (unknown flow, executor error, failed assertion) is folded
/// into an unsuccessful outcome carrying the diagnostic.
pub async fn execute_by_id(store: &dyn FlowStore, id: &str) -> FlowOutcome {
    let flow = match store.get(id).await {
        Ok(flow) => flow,
        Err(err) => {
            return FlowOutcome {
                success: false,
                message: Some(err.to_string()),
            };
        }
    };

    let mut engine = LinearFlow::new();
    match engine.run(&flow).await {
        Ok(()) => FlowOutcome {
            success: true,
            message: None,
        },
        Err(err) => FlowOutcome {
            success: false,
            message: Some(err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_flow_reports_failure() {
        let store = InMemoryFlowStore::new();
        let outcome = execute_by_id(&store, "ghost").await;

        assert!(!outcome.success);
        assert!(outcome.message.unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn empty_flow_completes() {
        let mut store = InMemoryFlowStore::new();
        store.insert(FlowDefinition {
            id: "empty".to_string(),
            name: String::new(),
            steps: Vec::new(),
        });

        let outcome = execute_by_id(&store, "empty").await;
        assert!(outcome.success);
        assert!(outcome.message.is_none());
    }
}
