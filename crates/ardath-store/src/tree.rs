//! Read and write helpers over the JSON tree.
//!
//! The tree never stores `null` or empty objects: writing `null` deletes,
//! and parents left without children disappear with their last child.

use serde_json::{Map, Value};

use crate::path::DbPath;

/// Node at `path`, `None` when absent.
pub fn get<'a>(root: &'a Value, path: &DbPath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    (!is_vacant(node)).then_some(node)
}

/// Write `value` at `path`. `null` deletes the node and prunes empty parents.
pub fn set(root: &mut Value, path: &DbPath, value: Value) {
    set_at(root, path.segments(), normalize(value));
    if is_vacant(root) {
        *root = Value::Null;
    }
}

fn set_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        set_at(child, rest, value);
        if is_vacant(child) {
            map.remove(head);
        }
    }
}

/// Strip nulls and empty objects, the way the backend stores values.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !is_vacant(v))
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}

fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> DbPath {
        DbPath::parse(s).unwrap()
    }

    #[test]
    fn set_creates_intermediate_nodes() {
        let mut root = Value::Null;
        set(&mut root, &p("a/b/c"), json!(1));
        assert_eq!(root, json!({ "a": { "b": { "c": 1 } } }));
        assert_eq!(get(&root, &p("a/b")), Some(&json!({ "c": 1 })));
    }

    #[test]
    fn delete_prunes_empty_parents() {
        let mut root = json!({ "a": { "b": { "c": 1 } }, "x": true });
        set(&mut root, &p("a/b/c"), Value::Null);
        assert_eq!(root, json!({ "x": true }));
        set(&mut root, &p("x"), Value::Null);
        assert_eq!(root, Value::Null);
    }

    #[test]
    fn nulls_inside_values_are_dropped() {
        let mut root = Value::Null;
        set(&mut root, &p("m"), json!({ "text": "hi", "imageUrl": null }));
        assert_eq!(root, json!({ "m": { "text": "hi" } }));
    }

    #[test]
    fn deleting_missing_path_is_noop() {
        let mut root = json!({ "a": 1 });
        set(&mut root, &p("a/b/c"), Value::Null);
        assert_eq!(root, json!({ "a": 1 }));
        assert!(get(&root, &p("zzz")).is_none());
    }
}
