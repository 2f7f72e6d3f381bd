//! Ordered range queries over the children of a node.

use std::cmp::Ordering;

use serde_json::Value;

use crate::path::DbPath;
use crate::snapshot::DataSnapshot;
use crate::tree;

/// How the children of the queried node are ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    Key,
    /// Order by the value of a direct child field, ties broken by key.
    Child(String),
}

/// A query rooted at one node. Without constraints it addresses the node
/// itself; with constraints it addresses a window of its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    path: DbPath,
    order: OrderBy,
    start_after: Option<Value>,
    equal_to: Option<Value>,
    limit: Option<usize>,
}

impl Query {
    pub fn at(path: DbPath) -> Self {
        Self {
            path,
            order: OrderBy::Key,
            start_after: None,
            equal_to: None,
            limit: None,
        }
    }

    pub fn order_by_key(mut self) -> Self {
        self.order = OrderBy::Key;
        self
    }

    pub fn order_by_child(mut self, field: impl Into<String>) -> Self {
        self.order = OrderBy::Child(field.into());
        self
    }

    /// Only children ordered strictly after `value`.
    pub fn start_after(mut self, value: impl Into<Value>) -> Self {
        self.start_after = Some(value.into());
        self
    }

    pub fn equal_to(mut self, value: impl Into<Value>) -> Self {
        self.equal_to = Some(value.into());
        self
    }

    pub fn limit_to_first(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn path(&self) -> &DbPath {
        &self.path
    }

    pub fn order(&self) -> &OrderBy {
        &self.order
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bound set by [`Query::start_after`], if any.
    pub fn start_key(&self) -> Option<&Value> {
        self.start_after.as_ref()
    }

    /// `true` when the query addresses the node itself rather than a window.
    pub fn is_plain(&self) -> bool {
        self.order == OrderBy::Key
            && self.start_after.is_none()
            && self.equal_to.is_none()
            && self.limit.is_none()
    }

    /// Children of the queried node that fall in the window, in query order.
    pub fn window(&self, root: &Value) -> Vec<(String, Value)> {
        let Some(Value::Object(map)) = tree::get(root, &self.path) else {
            return Vec::new();
        };
        let mut children: Vec<(String, Value)> =
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        children.sort_by(|(ka, va), (kb, vb)| {
            compare_values(&self.order_value(ka, va), &self.order_value(kb, vb))
                .then_with(|| ka.cmp(kb))
        });

        let mut window: Vec<(String, Value)> = children
            .into_iter()
            .filter(|(k, v)| {
                let ordered = self.order_value(k, v);
                let after = self
                    .start_after
                    .as_ref()
                    .map_or(true, |start| compare_values(&ordered, start) == Ordering::Greater);
                let equal = self
                    .equal_to
                    .as_ref()
                    .map_or(true, |target| compare_values(&ordered, target) == Ordering::Equal);
                after && equal
            })
            .collect();

        if let Some(limit) = self.limit {
            window.truncate(limit);
        }
        window
    }

    /// Evaluate the query against `root`.
    pub fn snapshot(&self, root: &Value) -> DataSnapshot {
        let key = self.path.key().map(str::to_string);
        if self.is_plain() {
            let value = tree::get(root, &self.path).cloned().unwrap_or(Value::Null);
            DataSnapshot::new(key, value)
        } else {
            DataSnapshot::from_children(key, self.window(root))
        }
    }

    fn order_value(&self, key: &str, value: &Value) -> Value {
        match &self.order {
            OrderBy::Key => Value::String(key.to_string()),
            OrderBy::Child(field) => value.get(field).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Backend value ordering: null < false < true < numbers < strings < objects.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(false) => 1,
            Value::Bool(true) => 2,
            Value::Number(_) => 3,
            Value::String(_) => 4,
            Value::Array(_) | Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> Value {
        json!({
            "chats": { "u1": {
                "c1": { "title": "one" },
                "c2": { "title": "two" },
                "c3": { "title": "three" },
                "c4": { "title": "four" }
            }},
            "users": {
                "u1": { "username": "alice" },
                "u2": { "username": "bob" }
            }
        })
    }

    fn keys(window: &[(String, Value)]) -> Vec<&str> {
        window.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn key_window_with_cursor_and_limit() {
        let path = DbPath::parse("chats/u1").unwrap();
        let first = Query::at(path.clone()).limit_to_first(2);
        assert_eq!(keys(&first.window(&root())), vec!["c1", "c2"]);

        let next = Query::at(path).order_by_key().start_after("c2").limit_to_first(2);
        assert_eq!(keys(&next.window(&root())), vec!["c3", "c4"]);
    }

    #[test]
    fn equality_on_child_field() {
        let q = Query::at(DbPath::parse("users").unwrap())
            .order_by_child("username")
            .equal_to("bob");
        assert_eq!(keys(&q.window(&root())), vec!["u2"]);
        let missing = Query::at(DbPath::parse("users").unwrap())
            .order_by_child("username")
            .equal_to("carol");
        assert!(!missing.snapshot(&root()).exists());
    }

    #[test]
    fn plain_query_addresses_node() {
        let q = Query::at(DbPath::parse("chats/u1/c1/title").unwrap());
        assert!(q.is_plain());
        assert_eq!(q.snapshot(&root()).value(), &json!("one"));
    }

    #[test]
    fn value_ordering_ranks_types() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!(99), &json!("a")), Ordering::Less);
    }
}
