//! # Flow Context
//!
//! The per-run store of each step's decoded output, and the templating mapper
//! that lets a later step's request body reference an earlier step's output.
//!
//! Entries are write-once: steps only ever read earlier outputs, and they read
//! them exclusively through [`FlowContext::map`].

use super::flatmap::{expand, flatten};
use crate::path;
use indexmap::IndexMap;
use serde_json::Value;

/// Errors raised by the context store and the templating mapper.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Step '{0}' already has a recorded output")]
    DuplicateStep(String),
    #[error("Failed to serialize mapped template: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Ordered, append-only mapping from step identifier to that step's decoded
/// output document. Created once per flow run and discarded at run end.
#[derive(Debug, Default)]
pub struct FlowContext {
    entries: IndexMap<String, Value>,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `output` under `id`. Write-once: recording a second output for
    /// the same identifier is an error.
    pub fn store(&mut self, id: impl Into<String>, output: Value) -> Result<(), ContextError> {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(ContextError::DuplicateStep(id));
        }
        self.entries.insert(id, output);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    /// Resolves `$path` placeholders in `template` against the output recorded
    /// under `id`.
    ///
    /// The template is treated as a JSON object: every string leaf beginning
    /// with `$` is replaced by the string rendering of the value at that dotted
    /// path inside the stored output (empty string when the path, or the
    /// stored output itself, does not resolve). Anything that is not a JSON
    /// object passes through unchanged; templating is a no-op, not an error,
    /// for non-JSON input.
    pub fn map(&self, id: &str, template: &str) -> Result<String, ContextError> {
        let Ok(parsed) = serde_json::from_str::<Value>(template) else {
            return Ok(template.to_string());
        };
        if !parsed.is_object() {
            return Ok(template.to_string());
        }

        let source = self.get(id);
        let mut leaves = flatten(&parsed);

        for leaf in leaves.values_mut() {
            if let Value::String(text) = leaf
                && let Some(selector) = text.strip_prefix('$')
            {
                let resolved = source
                    .and_then(|doc| path::lookup(doc, selector))
                    .map(path::render)
                    .unwrap_or_default();
                *leaf = Value::String(resolved);
            }
        }

        serde_json::to_string(&expand(leaves)).map_err(ContextError::Serialize)
    }
}
