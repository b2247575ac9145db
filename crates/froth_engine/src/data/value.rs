//! The value model bound into templates.
//!
//! Values form a closed set of tagged variants. The only open extension
//! point is [`DataContext`], implemented by collaborators that want to
//! expose properties, indexed properties, and methods to path queries.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A value-providing object reachable from a path query.
///
/// Query segments that traverse an [`Value::Object`] dispatch here:
/// `user.name` calls `get_property("name")`, `user.tags[2]` calls
/// `get_indexed_property("tags", "2")` and `user.label(fr)` calls
/// `call_method("label", ["fr"])`. Returning `None` surfaces as a
/// `PropertyNotFound` error on the whole query.
pub trait DataContext {
    /// Look up a plain property by name.
    fn get_property(&self, name: &str) -> Option<Value>;

    /// Look up one entry of an indexable property. The default goes
    /// through `get_property` and indexes the result.
    fn get_indexed_property(&self, name: &str, index: &str) -> Option<Value> {
        self.get_property(name).and_then(|v| v.index(index))
    }

    /// Invoke a method with literal string arguments.
    fn call_method(&self, name: &str, args: &[String]) -> Option<Value>;
}

/// A value stored in a data model.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Rc<dyn DataContext>),
}

impl Value {
    /// Index into a sequence (by number) or map (by key).
    pub fn index(&self, key: &str) -> Option<Value> {
        match self {
            Value::Sequence(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)).cloned(),
            Value::Map(entries) => entries.get(key).cloned(),
            _ => None,
        }
    }

    /// Truthiness used by condition expressions: `null` and empty
    /// strings are false, numbers follow their zero-ness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Sequence(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// The textual form substituted into rendered markup. Booleans
    /// render as `true`/`false`, `null` as the empty string.
    pub fn display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::String(s) => s.clone(),
            Value::Sequence(_) | Value::Map(_) | Value::Object(_) => String::new(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Object(_) => write!(f, "Object(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
