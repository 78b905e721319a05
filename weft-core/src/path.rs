//! # Dotted Path Lookup
//!
//! Shared by the templating mapper and the assertion evaluator: a selector like
//! `"user.addresses.0.city"` walks object keys and array indices through a
//! [`serde_json::Value`] tree.

use serde_json::Value;

/// Resolves `path` against `root`. Returns `None` as soon as a segment does not
/// match the shape of the current node.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Renders a value for substitution into a template.
///
/// Strings render without quotes, `null` renders empty, everything else renders
/// as compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_objects_and_arrays() {
        let doc = json!({"user": {"addresses": [{"city": "Oslo"}, {"city": "Bergen"}]}});
        assert_eq!(
            lookup(&doc, "user.addresses.1.city"),
            Some(&json!("Bergen"))
        );
    }

    #[test]
    fn missing_segment_is_none() {
        let doc = json!({"a": {"b": 1}});
        assert_eq!(lookup(&doc, "a.c"), None);
        assert_eq!(lookup(&doc, "a.b.c"), None);
    }

    #[test]
    fn non_numeric_index_is_none() {
        let doc = json!({"a": [1, 2]});
        assert_eq!(lookup(&doc, "a.x"), None);
    }

    #[test]
    fn renders_scalars() {
        assert_eq!(render(&json!("hi")), "hi");
        assert_eq!(render(&json!(3)), "3");
        assert_eq!(render(&json!(null)), "");
        assert_eq!(render(&json!({"k": true})), r#"{"k":true}"#);
    }
}
