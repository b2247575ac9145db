//! The whitelisted helper-function catalogue for expressions.

use std::collections::HashMap;

use crate::data::Value;
use crate::error::{EngineError, EngineResult};

/// Signature of a helper callable from `@name(...)` expressions.
pub type HelperFn = Box<dyn Fn(&[Value]) -> EngineResult<Value>>;

/// Registry of helper functions available to the expression sandbox.
///
/// Only registered helpers are callable; anything else raises
/// [`EngineError::UnknownFunction`]. Configure before rendering starts
/// and treat as frozen afterwards.
pub struct FunctionRegistry {
    helpers: HashMap<String, HelperFn>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("upper", |args| {
            Ok(Value::String(string_arg(args, 0, "upper")?.to_uppercase()))
        });
        registry.register("lower", |args| {
            Ok(Value::String(string_arg(args, 0, "lower")?.to_lowercase()))
        });
        registry.register("capitalize", |args| {
            let text = string_arg(args, 0, "capitalize")?;
            let mut chars = text.chars();
            Ok(Value::String(match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }))
        });
        registry.register("spacify", |args| {
            let text = string_arg(args, 0, "spacify")?;
            let space = optional_string_arg(args, 1).unwrap_or_else(|| " ".to_string());
            let parts: Vec<String> = text.chars().map(|c| c.to_string()).collect();
            Ok(Value::String(parts.join(&space)))
        });
        registry.register("strip", |args| {
            let text = string_arg(args, 0, "strip")?;
            let space = optional_string_arg(args, 1).unwrap_or_else(|| " ".to_string());
            let mut out = String::with_capacity(text.len());
            let mut in_gap = false;
            for c in text.chars() {
                if c.is_whitespace() {
                    if !in_gap {
                        out.push_str(&space);
                        in_gap = true;
                    }
                } else {
                    out.push(c);
                    in_gap = false;
                }
            }
            Ok(Value::String(out))
        });
        registry.register("truncate", |args| {
            let text = string_arg(args, 0, "truncate")?;
            let length = match args.get(1) {
                Some(Value::Int(n)) => *n.max(&0) as usize,
                Some(other) => {
                    return Err(EngineError::InvalidData(format!(
                        "truncate length must be an integer, got {other:?}"
                    )))
                }
                None => 80,
            };
            let trunk = optional_string_arg(args, 2).unwrap_or_else(|| "...".to_string());
            Ok(Value::String(truncate(&text, length, &trunk)))
        });
        registry
    }
}

impl FunctionRegistry {
    /// A registry with no helpers at all.
    pub fn empty() -> Self {
        Self {
            helpers: HashMap::new(),
        }
    }

    /// Register a helper under a name, replacing any existing one.
    pub fn register<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> EngineResult<Value> + 'static,
    {
        self.helpers.insert(name.into(), Box::new(helper));
    }

    /// Whether a helper is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Invoke a helper by name.
    pub fn call(&self, name: &str, args: &[Value]) -> EngineResult<Value> {
        match self.helpers.get(name) {
            Some(helper) => helper(args),
            None => Err(EngineError::UnknownFunction(name.to_string())),
        }
    }
}

fn string_arg(args: &[Value], index: usize, helper: &str) -> EngineResult<String> {
    match args.get(index) {
        Some(value) => Ok(value.display_string()),
        None => Err(EngineError::InvalidData(format!(
            "@{helper} expects an argument at position {index}"
        ))),
    }
}

fn optional_string_arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index).map(Value::display_string)
}

fn truncate(text: &str, length: usize, trunk: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= length || length == 0 {
        if length == 0 {
            return String::new();
        }
        return text.to_string();
    }
    let keep = length.saturating_sub(trunk.chars().count());
    let mut out: String = chars[..keep].iter().collect();
    out.push_str(trunk);
    out
}
