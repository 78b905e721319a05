//! Flatten/expand between nested JSON documents and dotted leaf paths.
//!
//! `{"a": {"b": ["x"]}}` flattens to `{"a.b.0": "x"}` and expands back.
//! Numeric segments reconstruct arrays. Keys containing literal dots do not
//! survive the round trip; templates are expected not to use them.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Flattens `value` into an ordered leaf-path → leaf-value mapping.
///
/// Empty objects and arrays are kept as leaves so they survive the round trip.
pub fn flatten(value: &Value) -> IndexMap<String, Value> {
    let mut leaves = IndexMap::new();
    walk("", value, &mut leaves);
    leaves
}

fn walk(prefix: &str, value: &Value, out: &mut IndexMap<String, Value>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                walk(&join(key), nested, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, nested) in items.iter().enumerate() {
                walk(&join(&index.to_string()), nested, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

/// Rebuilds a JSON document from a flattened leaf mapping.
pub fn expand(leaves: IndexMap<String, Value>) -> Value {
    let mut root = Value::Object(Map::new());
    for (path, leaf) in leaves {
        let segments: Vec<&str> = path.split('.').collect();
        insert_path(&mut root, &segments, leaf);
    }
    root
}

fn insert_path(slot: &mut Value, segments: &[&str], leaf: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *slot = leaf;
        return;
    };

    if let Ok(index) = head.parse::<usize>() {
        if !matches!(slot, Value::Array(_)) {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            while items.len() <= index {
                items.push(Value::Null);
            }
            insert_path(&mut items[index], rest, leaf);
        }
    } else {
        if !matches!(slot, Value::Object(_)) {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(map) = slot {
            let entry = map.entry(head.to_string()).or_insert(Value::Null);
            insert_path(entry, rest, leaf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_documents() {
        let doc = json!({"a": {"b": 1, "c": [true, "x"]}, "d": null});
        let leaves = flatten(&doc);

        assert_eq!(leaves.get("a.b"), Some(&json!(1)));
        assert_eq!(leaves.get("a.c.0"), Some(&json!(true)));
        assert_eq!(leaves.get("a.c.1"), Some(&json!("x")));
        assert_eq!(leaves.get("d"), Some(&json!(null)));
    }

    #[test]
    fn round_trips() {
        let doc = json!({"a": {"b": 1, "c": [true, "x"]}, "d": "leaf"});
        assert_eq!(expand(flatten(&doc)), doc);
    }

    #[test]
    fn keeps_empty_containers() {
        let doc = json!({"a": {}, "b": []});
        assert_eq!(expand(flatten(&doc)), doc);
    }
}
