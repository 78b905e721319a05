//! # Assertion Evaluator
//!
//! Compares a value selected from a step's recorded output against an expected
//! value using a named operator. Operators live in a registry keyed by name so
//! callers can plug in their own; an unknown operator name fails the evaluation
//! with a diagnostic instead of panicking.

use crate::path;
use serde_json::Value;
use std::collections::HashMap;

/// One declarative check against a step's stored output.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Assertion {
    /// The value the selected output is compared against.
    pub expected: Value,
    /// Dotted path selecting the actual value inside the step output.
    pub actual_selector: String,
    /// Registry name of the comparison operator (case-insensitive).
    pub operator: String,
}

/// The outcome of evaluating one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
}

impl Verdict {
    fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    fn fail(message: String) -> Self {
        Self {
            passed: false,
            message,
        }
    }
}

/// A named comparison between the expected and the selected actual value.
pub trait Operator: Send + Sync {
    fn evaluate(&self, expected: &Value, actual: &Value) -> bool;
}

/// Registry of comparison operators, keyed by lowercase name.
pub struct OperatorRegistry {
    operators: HashMap<String, Box<dyn Operator>>,
}

impl Default for OperatorRegistry {
    /// A registry with the built-in operators: `equal`, `not_equal`,
    /// `contains`.
    fn default() -> Self {
        let mut registry = Self {
            operators: HashMap::new(),
        };
        registry.register("equal", Box::new(Equal));
        registry.register("not_equal", Box::new(NotEqual));
        registry.register("contains", Box::new(Contains));
        registry
    }
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) an operator under `name`, case-folded.
    pub fn register(&mut self, name: impl Into<String>, operator: Box<dyn Operator>) {
        self.operators.insert(name.into().to_lowercase(), operator);
    }

    /// Evaluates `assertion` against `output`, the step's stored document.
    ///
    /// The actual value is selected via the assertion's dotted path; a path
    /// that does not resolve selects `null`.
    pub fn evaluate(&self, assertion: &Assertion, output: &Value) -> Verdict {
        let actual = path::lookup(output, &assertion.actual_selector)
            .cloned()
            .unwrap_or(Value::Null);

        match self.operators.get(&assertion.operator.to_lowercase()) {
            None => Verdict::fail(format!("invalid operator '{}'", assertion.operator)),
            Some(operator) => {
                if operator.evaluate(&assertion.expected, &actual) {
                    Verdict::pass()
                } else {
                    Verdict::fail(format!(
                        "expected {} but found {} (selector '{}', operator '{}')",
                        assertion.expected, actual, assertion.actual_selector, assertion.operator
                    ))
                }
            }
        }
    }
}

/// Deep structural equality. Numbers compare numerically, so `1` and `1.0`
/// are equal.
struct Equal;

impl Operator for Equal {
    fn evaluate(&self, expected: &Value, actual: &Value) -> bool {
        json_eq(expected, actual)
    }
}

struct NotEqual;

impl Operator for NotEqual {
    fn evaluate(&self, expected: &Value, actual: &Value) -> bool {
        !json_eq(expected, actual)
    }
}

/// String containment when both sides are strings, element membership when the
/// actual value is an array.
struct Contains;

impl Operator for Contains {
    fn evaluate(&self, expected: &Value, actual: &Value) -> bool {
        match (actual, expected) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle),
            (Value::Array(items), needle) => items.iter().any(|item| json_eq(item, needle)),
            _ => false,
        }
    }
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|bv| json_eq(v, bv)))
        }
        (a, b) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assertion(expected: Value, selector: &str, operator: &str) -> Assertion {
        Assertion {
            expected,
            actual_selector: selector.to_string(),
            operator: operator.to_string(),
        }
    }

    #[test]
    fn equal_matches_deep_structures() {
        let registry = OperatorRegistry::new();
        let output = json!({"user": {"name": "ada", "score": 1.0}});

        let verdict = registry.evaluate(&assertion(json!("ada"), "user.name", "equal"), &output);
        assert!(verdict.passed);

        // numeric comparison across integer/float representations
        let verdict = registry.evaluate(&assertion(json!(1), "user.score", "equal"), &output);
        assert!(verdict.passed);
    }

    #[test]
    fn equal_mismatch_reports_both_sides() {
        let registry = OperatorRegistry::new();
        let output = json!({"name": "ada"});

        let verdict = registry.evaluate(&assertion(json!("eve"), "name", "equal"), &output);
        assert!(!verdict.passed);
        assert!(verdict.message.contains("\"eve\""));
        assert!(verdict.message.contains("\"ada\""));
    }

    #[test]
    fn missing_selector_compares_against_null() {
        let registry = OperatorRegistry::new();
        let output = json!({"a": 1});

        let verdict = registry.evaluate(&assertion(json!(null), "ghost", "equal"), &output);
        assert!(verdict.passed);
    }

    #[test]
    fn not_equal_and_contains() {
        let registry = OperatorRegistry::new();
        let output = json!({"tags": ["a", "b"], "note": "hello world"});

        assert!(
            registry
                .evaluate(&assertion(json!("c"), "tags.0", "not_equal"), &output)
                .passed
        );
        assert!(
            registry
                .evaluate(&assertion(json!("b"), "tags", "contains"), &output)
                .passed
        );
        assert!(
            registry
                .evaluate(&assertion(json!("world"), "note", "contains"), &output)
                .passed
        );
    }

    #[test]
    fn operator_names_are_case_folded() {
        let registry = OperatorRegistry::new();
        let output = json!({"a": 1});

        assert!(
            registry
                .evaluate(&assertion(json!(1), "a", "EQUAL"), &output)
                .passed
        );
    }

    #[test]
    fn unknown_operator_fails_with_diagnostic() {
        let registry = OperatorRegistry::new();
        let verdict = registry.evaluate(&assertion(json!(1), "a", "regex"), &json!({"a": 1}));

        assert!(!verdict.passed);
        assert!(verdict.message.contains("invalid operator"));
    }

    #[test]
    fn custom_operators_can_be_registered() {
        struct AlwaysTrue;
        impl Operator for AlwaysTrue {
            fn evaluate(&self, _: &Value, _: &Value) -> bool {
                true
            }
        }

        let mut registry = OperatorRegistry::new();
        registry.register("anything", Box::new(AlwaysTrue));

        let verdict = registry.evaluate(&assertion(json!(1), "x", "anything"), &json!({}));
        assert!(verdict.passed);
    }
}
