//! Path-query evaluation over a data model.

use std::cell::RefCell;
use std::collections::HashMap;

use regex::Regex;
use tracing::trace;

use crate::data::model::DataModel;
use crate::data::value::Value;
use crate::error::{EngineError, EngineResult};
use crate::util::escape_html;

/// Resolves dot/bracket path queries against one [`DataModel`].
///
/// A resolver memoizes resolved queries for its whole lifetime, so it is
/// created and discarded in lockstep with the model it reads: rebinding a
/// template's data model always builds a fresh resolver. Within one
/// generation `resolve` is deterministic and idempotent.
pub struct DataResolver {
    model: DataModel,
    resolved: RefCell<HashMap<String, Value>>,
    index_pattern: Regex,
    method_pattern: Regex,
    indexed_prop_pattern: Regex,
}

impl DataResolver {
    /// Create a resolver over a snapshot of the given model.
    pub fn new(model: DataModel) -> Self {
        Self {
            model,
            resolved: RefCell::new(HashMap::new()),
            index_pattern: Regex::new(r"(\w+)\[([^\[\]]+)\]").unwrap(),
            method_pattern: Regex::new(r"^(\w+)\((.*)\)$").unwrap(),
            indexed_prop_pattern: Regex::new(r"^(\w+)\[([^\[\]]+)\]$").unwrap(),
        }
    }

    /// The model this resolver reads.
    pub fn model(&self) -> &DataModel {
        &self.model
    }

    /// Resolve a query for interpolation: string results come back
    /// HTML-escaped, every other variant passes through unchanged.
    pub fn resolve(&self, query: &str) -> EngineResult<Value> {
        let value = self.resolve_raw(query)?;
        Ok(match value {
            Value::String(s) => Value::String(escape_html(&s)),
            other => other,
        })
    }

    /// Resolve a query to the raw structured value. Iteration directives
    /// use this path so collections and markup-bearing strings are not
    /// escaped on the way through.
    pub fn resolve_raw(&self, query: &str) -> EngineResult<Value> {
        if let Some(value) = self.resolved.borrow().get(query) {
            trace!(query, "query cache hit");
            return Ok(value.clone());
        }

        let normalized = self.normalize(query)?;
        let mut segments = normalized.split('.');

        let first = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EngineError::InvalidQuery(query.to_string()))?;
        let mut data = self.model.get(first)?.clone();

        for segment in segments {
            data = self.step(data, segment, query)?;
        }

        self.resolved
            .borrow_mut()
            .insert(query.to_string(), data.clone());
        Ok(data)
    }

    /// Normalize bracket suffixes into extra dot segments, innermost
    /// first: `a[0][x]` becomes `a.0.x`. A bracket index that is itself
    /// a dotted path is resolved before flattening.
    fn normalize(&self, query: &str) -> EngineResult<String> {
        let mut current = query.to_string();

        loop {
            let Some(caps) = self.index_pattern.captures(&current) else {
                break;
            };
            let whole = caps.get(0).unwrap();
            let base = &caps[1];
            let index = caps[2].trim().trim_matches(|c| c == '"' || c == '\'');

            let index = if index.contains('.') {
                self.resolve_raw(index)?.display_string()
            } else {
                index.to_string()
            };

            let mut next = String::with_capacity(current.len());
            next.push_str(&current[..whole.start()]);
            next.push_str(base);
            next.push('.');
            next.push_str(&index);
            next.push_str(&current[whole.end()..]);
            current = next;
        }

        Ok(current)
    }

    /// Evaluate one query segment against the current value.
    fn step(&self, data: Value, segment: &str, query: &str) -> EngineResult<Value> {
        match data {
            Value::Sequence(_) | Value::Map(_) => {
                data.index(segment).ok_or_else(|| EngineError::KeyNotFound {
                    key: segment.to_string(),
                    query: query.to_string(),
                })
            }
            Value::Object(object) => {
                let miss = || EngineError::PropertyNotFound {
                    property: segment.to_string(),
                    query: query.to_string(),
                };

                if let Some(caps) = self.method_pattern.captures(segment) {
                    let args: Vec<String> = if caps[2].trim().is_empty() {
                        Vec::new()
                    } else {
                        caps[2]
                            .split(',')
                            .map(|a| a.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
                            .collect()
                    };
                    object.call_method(&caps[1], &args).ok_or_else(miss)
                } else if let Some(caps) = self.indexed_prop_pattern.captures(segment) {
                    object.get_indexed_property(&caps[1], &caps[2]).ok_or_else(miss)
                } else {
                    object.get_property(segment).ok_or_else(miss)
                }
            }
            _ => Err(EngineError::InvalidQuery(query.to_string())),
        }
    }
}
