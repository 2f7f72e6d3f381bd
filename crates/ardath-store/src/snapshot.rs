use serde_json::Value;

/// Immutable view of a node (or of a query window) at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    key: Option<String>,
    value: Value,
    order: Vec<String>,
}

impl DataSnapshot {
    /// Snapshot of a plain node; children ordered by key.
    pub fn new(key: Option<String>, value: Value) -> Self {
        let order = match &value {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        Self { key, value, order }
    }

    /// Snapshot of a query window, preserving the query's ordering.
    pub fn from_children(key: Option<String>, children: Vec<(String, Value)>) -> Self {
        let order = children.iter().map(|(k, _)| k.clone()).collect();
        let value = if children.is_empty() {
            Value::Null
        } else {
            Value::Object(children.into_iter().collect())
        };
        Self { key, value, order }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    pub fn children_count(&self) -> usize {
        self.order.len()
    }

    /// Children in query order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.order.iter().filter_map(move |k| {
            self.value
                .as_object()
                .and_then(|map| map.get(k))
                .map(|v| (k.as_str(), v))
        })
    }

    /// Child keys in query order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub fn child(&self, key: &str) -> DataSnapshot {
        let value = self
            .value
            .as_object()
            .and_then(|map| map.get(key))
            .cloned()
            .unwrap_or(Value::Null);
        DataSnapshot::new(Some(key.to_string()), value)
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn children_follow_window_order() {
        let snap = DataSnapshot::from_children(
            Some("users".into()),
            vec![("b".into(), json!(1)), ("a".into(), json!(2))],
        );
        let keys: Vec<_> = snap.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(snap.children().count(), 2);
        assert_eq!(snap.child("a").value(), &json!(2));
    }

    #[test]
    fn empty_window_does_not_exist() {
        let snap = DataSnapshot::from_children(None, Vec::new());
        assert!(!snap.exists());
        assert_eq!(snap.children_count(), 0);
    }
}
