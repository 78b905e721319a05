//! # Step Executors
//!
//! One flow step is one remote call. The flow engine depends only on the
//! [`StepExecutor`] capability interface; the two implementations wrap the
//! dynamic gRPC invocation pipeline ([`rpc::RpcExecutor`]) and a plain
//! templated HTTP request ([`rest::RestExecutor`]).
pub mod rest;
pub mod rpc;

use crate::connect::ConnectError;
use crate::invoke::InvokeError;
use async_trait::async_trait;

/// Errors that can occur while executing a single step.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported HTTP method '{0}'")]
    UnsupportedMethod(String),

    #[error("HTTP call returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request body is not valid JSON: {0}")]
    BodyDecode(#[source] serde_json::Error),

    #[error("Step output is not valid JSON: {0}")]
    OutputDecode(#[source] serde_json::Error),
}

/// The uniform lifecycle of a flow step.
///
/// `execute` performs the whole call and returns the decoded output document;
/// `reset` clears per-call state (connections included) and is safe to call
/// more than once.
#[async_trait]
pub trait StepExecutor: Send {
    /// Stable identifier of the step this executor runs, used as the key under
    /// which the output document is recorded in the flow context.
    fn identifier(&self) -> &str;

    /// Performs the call and returns the decoded output document.
    async fn execute(&mut self) -> Result<serde_json::Value, ExecutorError>;

    /// Tears down per-call state. Idempotent: a second reset observes nothing
    /// left to close and has no effect.
    fn reset(&mut self);
}
