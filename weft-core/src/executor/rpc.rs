//! # RPC Step Executor
//!
//! Wraps the whole dynamic invocation stack (connection management, schema
//! resolution, extension fetching, JSON codec) behind the [`StepExecutor`]
//! interface.
use super::{ExecutorError, StepExecutor};
use crate::connect::connect;
use crate::grpc::client::GrpcClient;
use crate::invoke::invoke_unary;
use crate::reflection::client::ReflectionClient;
use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::{Channel, ClientTlsConfig};

const DEFAULT_DIAL_DEADLINE: Duration = Duration::from_secs(10);

/// Executes one dynamic unary gRPC call as a flow step.
///
/// The connection is established lazily on [`StepExecutor::execute`] and torn
/// down by [`StepExecutor::reset`]; each invocation owns its own channel.
pub struct RpcExecutor {
    id: String,
    target: String,
    symbol: String,
    body: Option<String>,
    headers: Vec<String>,
    tls: Option<ClientTlsConfig>,
    deadline: Duration,
    channel: Option<Channel>,
}

impl RpcExecutor {
    /// `target` is the server URI (e.g. `http://localhost:50051`), `symbol`
    /// the method to invoke (`"package.Service/Method"`).
    pub fn new(
        id: impl Into<String>,
        target: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            symbol: symbol.into(),
            body: None,
            headers: Vec::new(),
            tls: None,
            deadline: DEFAULT_DIAL_DEADLINE,
            channel: None,
        }
    }

    /// JSON text of the request message. `None` sends the empty message; a
    /// JSON array is treated as a sequence of messages (and therefore rejected
    /// by the unary pipeline when it holds more than one).
    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// `"Name: Value"` header strings attached to the request. The sent set
    /// is the union of every configured batch, so headers propagated from a
    /// surrounding context can be layered on top of the step's own.
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_tls(mut self, tls: ClientTlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn request_messages(&self) -> Result<Vec<serde_json::Value>, ExecutorError> {
        match &self.body {
            None => Ok(Vec::new()),
            Some(text) => {
                let value: serde_json::Value =
                    serde_json::from_str(text).map_err(ExecutorError::BodyDecode)?;
                match value {
                    serde_json::Value::Array(items) => Ok(items),
                    single => Ok(vec![single]),
                }
            }
        }
    }
}

#[async_trait]
impl StepExecutor for RpcExecutor {
    fn identifier(&self) -> &str {
        &self.id
    }

    async fn execute(&mut self) -> Result<serde_json::Value, ExecutorError> {
        let channel = match &self.channel {
            Some(channel) => channel.clone(),
            None => {
                let channel = connect(&self.target, self.tls.clone(), self.deadline).await?;
                self.channel = Some(channel.clone());
                channel
            }
        };

        let mut reflection = ReflectionClient::new(channel.clone());
        let mut grpc = GrpcClient::new(channel);

        let messages = self.request_messages()?;
        let envelope =
            invoke_unary(&mut reflection, &mut grpc, &self.symbol, &self.headers, messages)
                .await?;

        Ok(envelope.payload)
    }

    fn reset(&mut self) {
        // Dropping the only retained handle closes the connection; a second
        // reset finds the slot already empty.
        if self.channel.take().is_some() {
            tracing::debug!(step = %self.id, "connection released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_idempotent() {
        let mut executor = RpcExecutor::new("0", "http://localhost:50051", "demo.Svc/Do");
        assert!(executor.channel.is_none());

        executor.reset();
        executor.reset();
        assert!(executor.channel.is_none());
    }

    #[test]
    fn body_parses_into_message_sequence() {
        let executor = RpcExecutor::new("0", "http://localhost:50051", "demo.Svc/Do")
            .with_body(Some(r#"[{"a": 1}, {"a": 2}]"#.to_string()));
        assert_eq!(executor.request_messages().unwrap().len(), 2);

        let executor = RpcExecutor::new("0", "http://localhost:50051", "demo.Svc/Do")
            .with_body(Some(r#"{"a": 1}"#.to_string()));
        assert_eq!(executor.request_messages().unwrap().len(), 1);

        let executor = RpcExecutor::new("0", "http://localhost:50051", "demo.Svc/Do");
        assert!(executor.request_messages().unwrap().is_empty());

        let executor = RpcExecutor::new("0", "http://localhost:50051", "demo.Svc/Do")
            .with_body(Some("not json".to_string()));
        assert!(matches!(
            executor.request_messages(),
            Err(ExecutorError::BodyDecode(_))
        ));
    }
}
