//! The named-value store backing one render.

use std::collections::BTreeMap;

use crate::data::value::Value;
use crate::error::{EngineError, EngineResult};

/// Binding context for a template render: a mapping from names to
/// [`Value`]s, mutated only through explicit bind operations.
#[derive(Debug, Clone, Default)]
pub struct DataModel {
    entries: BTreeMap<String, Value>,
}

impl DataModel {
    /// Create an empty data model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under the given name, replacing any previous binding.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a bound value.
    pub fn get(&self, key: &str) -> EngineResult<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| EngineError::DataNotFound(key.to_string()))
    }

    /// Whether a name is bound.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Snapshot this model. Directives that introduce new bindings work
    /// on a copy so a caller's shared model is never mutated behind its
    /// back; entry values are shared where they are reference-counted.
    pub fn copy(&self) -> DataModel {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut model = DataModel::new();
        model.set("name", "Ann");
        assert_eq!(model.get("name").unwrap(), &Value::from("Ann"));
        assert!(matches!(
            model.get("missing"),
            Err(EngineError::DataNotFound(_))
        ));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut model = DataModel::new();
        model.set("a", 1i64);

        let mut copy = model.copy();
        copy.set("a", 2i64);
        copy.set("b", 3i64);

        assert_eq!(model.get("a").unwrap(), &Value::Int(1));
        assert!(!model.contains("b"));
        assert_eq!(copy.get("a").unwrap(), &Value::Int(2));
    }
}
