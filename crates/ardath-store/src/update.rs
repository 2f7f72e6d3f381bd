//! Atomic multi-path updates.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::path::DbPath;

/// A map from absolute path to value (`null` deletes), applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiPathUpdate {
    entries: BTreeMap<String, Value>,
}

impl MultiPathUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(path.into(), value.into());
        self
    }

    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.entries.insert(path.into(), Value::Null);
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse every path and reject updates whose paths overlap.
    pub fn resolve(self) -> Result<Vec<(DbPath, Value)>> {
        let mut resolved = Vec::with_capacity(self.entries.len());
        for (raw, value) in self.entries {
            resolved.push((DbPath::parse(&raw)?, value));
        }
        resolved.sort_by(|(a, _), (b, _)| a.cmp(b));
        for pair in resolved.windows(2) {
            let (a, b) = (&pair[0].0, &pair[1].0);
            if a.overlaps(b) {
                return Err(StoreError::InvalidUpdate(format!(
                    "path `{a}` overlaps `{b}`"
                )));
            }
        }
        Ok(resolved)
    }
}

impl FromIterator<(String, Value)> for MultiPathUpdate {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
