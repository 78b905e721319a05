//! # Flow Definitions
//!
//! The persisted shape of a flow: an identifier plus an ordered list of step
//! definitions. These models are defined by the caller (or loaded from an
//! external store) before the run starts and are not mutated during the run.

use crate::assert::Assertion;
use serde::{Deserialize, Serialize};

/// An ordered test scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub steps: Vec<FlowStep>,
}

/// Which executor runs a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutorKind {
    Rest,
    Rpc,
}

/// One step of a flow. Steps execute strictly in the order they appear; there
/// is no branching or retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStep {
    /// Identifier under which this step's output is recorded.
    pub id: String,
    pub kind: ExecutorKind,
    /// `http` or `https`. Defaults to `http`.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// REST: the URI path. RPC: the method symbol
    /// (`"package.Service/Method"`).
    pub path: String,
    /// REST only: the HTTP verb (`GET` or `POST`).
    #[serde(default)]
    pub method: Option<String>,
    /// JSON text of the request body / message, possibly containing `$path`
    /// placeholders resolved through [`super::FlowContext::map`].
    #[serde(default)]
    pub body: Option<String>,
    /// `"Name: Value"` header strings.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Identifier of the earlier step whose recorded output feeds this step's
    /// body template.
    #[serde(default)]
    pub maps_from: Option<String>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

fn default_scheme() -> String {
    "http".to_string()
}

impl FlowStep {
    /// `scheme://host:port` for this step's target.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}
