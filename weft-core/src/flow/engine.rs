//! # Flow Engine
//!
//! Linear step sequencer. State machine per run:
//!
//! `Idle → Running(i) → … → Completed | Aborted { step, cause }`
//!
//! `Completed` and `Aborted` are terminal; there is no resume or retry, the
//! caller restarts the whole flow. A step's assertions are evaluated only after
//! its executor call completed without error; an executor error short-circuits
//! assertion evaluation for that step and aborts the rest of the sequence.

use super::context::{ContextError, FlowContext};
use super::model::{ExecutorKind, FlowDefinition, FlowStep};
use crate::assert::{Assertion, OperatorRegistry};
use crate::executor::rest::RestExecutor;
use crate::executor::rpc::RpcExecutor;
use crate::executor::{ExecutorError, StepExecutor};
use serde_json::Value;
use tonic::transport::ClientTlsConfig;

/// Errors that abort a flow run.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: ExecutorError,
    },

    #[error("Step '{step}' assertion failed: {message}")]
    Assertion { step: String, message: String },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Flow is already in a terminal state and cannot execute further steps")]
    Terminated,
}

/// Where a flow run currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Running(usize),
    Completed,
    Aborted { step: usize, cause: String },
}

/// Sequences steps, feeds the context, and evaluates assertions after each
/// step. One instance per flow run; it owns the run's [`FlowContext`].
pub struct LinearFlow {
    context: FlowContext,
    registry: OperatorRegistry,
    state: FlowState,
    current: usize,
}

impl Default for LinearFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearFlow {
    pub fn new() -> Self {
        Self::with_registry(OperatorRegistry::new())
    }

    /// Uses `registry` for assertion evaluation instead of the built-ins.
    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self {
            context: FlowContext::new(),
            registry,
            state: FlowState::Idle,
            current: 0,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn context(&self) -> &FlowContext {
        &self.context
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            FlowState::Completed | FlowState::Aborted { .. }
        )
    }

    /// Runs every step of `flow` in order, applying body templating between
    /// steps, until the last step succeeds or the first failure aborts the
    /// remainder.
    pub async fn run(&mut self, flow: &FlowDefinition) -> Result<(), FlowError> {
        tracing::info!(flow = %flow.id, steps = flow.steps.len(), "starting flow run");

        for step in &flow.steps {
            let body = match (&step.body, &step.maps_from) {
                (Some(template), Some(source)) => match self.context.map(source, template) {
                    Ok(mapped) => Some(mapped),
                    Err(err) => return Err(self.abort(self.current, FlowError::Context(err))),
                },
                (body, _) => body.clone(),
            };

            let mut executor = build_executor(step, body);
            self.execute(executor.as_mut(), &step.assertions).await?;
        }

        self.finish();
        Ok(())
    }

    /// Executes one step: runs the executor, records its output, evaluates the
    /// step's assertions against the recorded output. Any failure transitions
    /// the run to `Aborted` and is returned to the caller.
    pub async fn execute(
        &mut self,
        executor: &mut dyn StepExecutor,
        assertions: &[Assertion],
    ) -> Result<(), FlowError> {
        if self.is_terminal() {
            return Err(FlowError::Terminated);
        }

        let index = self.current;
        self.state = FlowState::Running(index);

        let step_id = executor.identifier().to_string();
        tracing::debug!(step = %step_id, index, "executing step");

        let result = executor.execute().await;
        executor.reset();

        let output = match result {
            Ok(output) => output,
            Err(source) => {
                return Err(self.abort(
                    index,
                    FlowError::Step {
                        step: step_id,
                        source,
                    },
                ));
            }
        };

        if let Err(err) = self.context.store(&step_id, output) {
            return Err(self.abort(index, FlowError::Context(err)));
        }

        let null = Value::Null;
        let failed = {
            let output = self.context.get(&step_id).unwrap_or(&null);
            assertions.iter().find_map(|assertion| {
                let verdict = self.registry.evaluate(assertion, output);
                (!verdict.passed).then_some(verdict.message)
            })
        };

        if let Some(message) = failed {
            return Err(self.abort(
                index,
                FlowError::Assertion {
                    step: step_id,
                    message,
                },
            ));
        }

        self.current += 1;
        Ok(())
    }

    /// Marks the run `Completed` unless it already reached a terminal state.
    pub fn finish(&mut self) {
        if !self.is_terminal() {
            self.state = FlowState::Completed;
        }
    }

    fn abort(&mut self, step: usize, err: FlowError) -> FlowError {
        tracing::warn!(step, error = %err, "flow aborted");
        self.state = FlowState::Aborted {
            step,
            cause: err.to_string(),
        };
        err
    }
}

fn build_executor(step: &FlowStep, body: Option<String>) -> Box<dyn StepExecutor> {
    match step.kind {
        ExecutorKind::Rpc => {
            let mut executor = RpcExecutor::new(&step.id, step.base_url(), &step.path)
                .with_body(body)
                .with_headers(step.headers.clone());
            if step.scheme == "https" {
                executor = executor.with_tls(ClientTlsConfig::new().with_native_roots());
            }
            Box::new(executor)
        }
        ExecutorKind::Rest => Box::new(
            RestExecutor::new(&step.id, step.base_url())
                .with_method(step.method.clone().unwrap_or_else(|| "GET".to_string()))
                .with_uri_path(&step.path)
                .with_body(body)
                .with_headers(step.headers.clone()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Returns a scripted result and counts invocations.
    struct ScriptedExecutor {
        id: String,
        output: Result<Value, ()>,
        calls: usize,
        resets: usize,
    }

    impl ScriptedExecutor {
        fn ok(id: &str, output: Value) -> Self {
            Self {
                id: id.to_string(),
                output: Ok(output),
                calls: 0,
                resets: 0,
            }
        }

        fn failing(id: &str) -> Self {
            Self {
                id: id.to_string(),
                output: Err(()),
                calls: 0,
                resets: 0,
            }
        }
    }

    #[async_trait]
    impl StepExecutor for ScriptedExecutor {
        fn identifier(&self) -> &str {
            &self.id
        }

        async fn execute(&mut self) -> Result<Value, ExecutorError> {
            self.calls += 1;
            match &self.output {
                Ok(output) => Ok(output.clone()),
                Err(()) => Err(ExecutorError::UnsupportedMethod("scripted".to_string())),
            }
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn equal(expected: Value, selector: &str) -> Assertion {
        Assertion {
            expected,
            actual_selector: selector.to_string(),
            operator: "equal".to_string(),
        }
    }

    #[tokio::test]
    async fn completes_when_all_steps_pass() {
        let mut flow = LinearFlow::new();
        let mut first = ScriptedExecutor::ok("0", json!({"message": "hi"}));
        let mut second = ScriptedExecutor::ok("1", json!({"ok": true}));

        flow.execute(&mut first, &[equal(json!("hi"), "message")])
            .await
            .unwrap();
        flow.execute(&mut second, &[equal(json!(true), "ok")])
            .await
            .unwrap();
        flow.finish();

        assert_eq!(flow.state(), &FlowState::Completed);
        assert_eq!(first.resets, 1);
        assert_eq!(flow.context().get("0"), Some(&json!({"message": "hi"})));
    }

    #[tokio::test]
    async fn failing_assertion_aborts_before_later_steps() {
        let mut flow = LinearFlow::new();
        let mut first = ScriptedExecutor::ok("0", json!({"n": 1}));
        let mut second = ScriptedExecutor::ok("1", json!({"n": 2}));
        let mut third = ScriptedExecutor::ok("2", json!({"n": 3}));

        flow.execute(&mut first, &[]).await.unwrap();

        let err = flow
            .execute(&mut second, &[equal(json!(99), "n")])
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Assertion { ref step, .. } if step == "1"));
        assert!(matches!(
            flow.state(),
            FlowState::Aborted { step: 1, .. }
        ));

        // The third step can no longer run.
        let err = flow.execute(&mut third, &[]).await.unwrap_err();
        assert!(matches!(err, FlowError::Terminated));
        assert_eq!(third.calls, 0);
    }

    #[tokio::test]
    async fn executor_error_short_circuits_assertions() {
        let mut flow = LinearFlow::new();
        let mut failing = ScriptedExecutor::failing("0");

        // This assertion would pass, but must never be reached.
        let err = flow
            .execute(&mut failing, &[equal(json!(null), "anything")])
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::Step { ref step, .. } if step == "0"));
        assert!(matches!(flow.state(), FlowState::Aborted { step: 0, .. }));
        assert_eq!(failing.resets, 1);
        assert!(flow.context().get("0").is_none());
    }

    #[tokio::test]
    async fn duplicate_step_identifiers_abort_the_run() {
        let mut flow = LinearFlow::new();
        let mut first = ScriptedExecutor::ok("dup", json!({}));
        let mut second = ScriptedExecutor::ok("dup", json!({}));

        flow.execute(&mut first, &[]).await.unwrap();
        let err = flow.execute(&mut second, &[]).await.unwrap_err();

        assert!(matches!(
            err,
            FlowError::Context(ContextError::DuplicateStep(ref id)) if id == "dup"
        ));
    }
}
