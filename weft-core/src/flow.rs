//! # Sequential Flow Execution
//!
//! A flow is an ordered test scenario: each step performs one remote call, its
//! decoded output is recorded in the per-run [`context::FlowContext`], and its
//! assertions are checked before the next step may run. Steps execute strictly
//! in order: later steps read earlier outputs through `$path` templating, so
//! there is a read-after-write dependency between them by construction.
//!
//! The first executor error or failing assertion aborts the remaining
//! sequence; there is no resume or retry from an aborted run.
pub mod context;
pub mod engine;
mod flatmap;
pub mod model;
pub mod store;

pub use context::{ContextError, FlowContext};
pub use engine::{FlowError, FlowState, LinearFlow};
pub use model::{ExecutorKind, FlowDefinition, FlowStep};
pub use store::{FlowOutcome, FlowStore, FlowStoreError, InMemoryFlowStore, execute_by_id};
