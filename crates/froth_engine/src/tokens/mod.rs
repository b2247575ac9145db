//! The directive catalogue.
//!
//! Every directive element discovered in a document is bound to a
//! [`Token`]: a handler carrying the element snapshot it was discovered
//! on, a processing [`Stage`], and a priority (lower value runs
//! earlier). Handlers are instantiated through the
//! [`TokenRegistry`](crate::registry::TokenRegistry) and discharged one
//! at a time by the template scheduler; a handler's node binding never
//! survives a tree edit.

pub mod assign;
pub mod block;
pub mod condition;
pub mod data_table;
pub mod for_loop;
pub mod foreach;
pub mod fragment;
pub mod include;
pub mod select_items;
pub mod text;

use std::rc::Rc;

use regex::Regex;

use crate::config::EngineConfig;
use crate::data::{DataModel, DataResolver, Value};
use crate::error::{EngineError, EngineResult};
use crate::expr;
use crate::functions::FunctionRegistry;
use crate::populate;
use crate::registry::Registries;
use crate::xml::{Element, XmlNode};

/// Priority of the directives that must run before everything else in
/// their stage.
pub const HIGHEST_PRIORITY: i32 = 1;

/// Priority of directives that run after everything else.
pub const LOWEST_PRIORITY: i32 = 99;

/// Which rewrite pass may discharge a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Include,
    PreParse,
    PostParse,
    /// Discharged by whichever stage discovers it first.
    Any,
}

impl Stage {
    /// Whether a token with this stage runs in the given pipeline stage.
    pub fn runs_in(self, active: Stage) -> bool {
        self == active || self == Stage::Any
    }
}

/// The tree edit a discharged token requests at its bound node.
#[derive(Debug, PartialEq)]
pub enum TokenOutput {
    /// Delete the bound node.
    Remove,
    /// Replace the bound node with a single node.
    Replace(XmlNode),
    /// Replace the bound node with a run of siblings, in place.
    Splice(Vec<XmlNode>),
}

/// Everything a token may touch while rendering.
pub struct RenderContext<'a> {
    pub config: &'a EngineConfig,
    pub registries: &'a Rc<Registries>,
    pub resolver: &'a DataResolver,
    /// Nesting depth of the template this render belongs to.
    pub include_depth: usize,
    /// Set by a token to install a new data-model generation once its
    /// edit has been applied.
    pub pending_model: Option<DataModel>,
}

impl RenderContext<'_> {
    pub fn functions(&self) -> &FunctionRegistry {
        &self.registries.functions
    }

    /// Evaluate a directive expression.
    pub fn evaluate(&self, source: &str) -> EngineResult<Value> {
        expr::evaluate(source, self.resolver, self.functions())
    }
}

/// A directive handler bound to one element snapshot.
pub trait Token {
    /// The directive's local name.
    fn name(&self) -> &'static str;

    fn stage(&self) -> Stage;

    fn priority(&self) -> i32;

    /// Validate the bound element's structure. Called before `render`.
    fn parse(&mut self) -> EngineResult<()>;

    /// Produce the tree edit for the bound node.
    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput>;
}

/// Constructor registered for a directive local name.
pub type TokenFactory = fn(Element) -> Box<dyn Token>;

/// Fetch a required attribute.
pub(crate) fn require_attr<'e>(
    element: &'e Element,
    name: &str,
    directive: &str,
) -> EngineResult<&'e str> {
    element.attr(name).ok_or_else(|| {
        EngineError::ElementNotFound(format!(
            "the \"{name}\" attribute is required on \"{directive}\""
        ))
    })
}

/// Reject attributes outside the allowed set.
pub(crate) fn reject_unknown_attrs(
    element: &Element,
    allowed: &[&str],
    directive: &str,
) -> EngineResult<()> {
    for (name, _) in &element.attributes {
        if !allowed.contains(&name.as_str()) {
            return Err(EngineError::UnexpectedToken(format!(
                "the \"{name}\" attribute is not supported on \"{directive}\""
            )));
        }
    }
    Ok(())
}

/// The keys an iteration directive walks, in order: positional indexes
/// for a sequence, map keys for a map. `None` when the value is not
/// iterable.
pub(crate) fn iteration_keys(data: &Value) -> Option<Vec<String>> {
    match data {
        Value::Sequence(items) => Some((0..items.len()).map(|i| i.to_string()).collect()),
        Value::Map(entries) => Some(entries.keys().cloned().collect()),
        _ => None,
    }
}

/// Rewrites one loop iteration's markup: inside every `${...}`
/// placeholder the first word-bounded occurrence of the loop variable
/// becomes an indexed query into the collection, and a literal
/// `${key}` placeholder becomes the iteration key itself.
pub(crate) struct IterationRewriter {
    var_pattern: Regex,
    collection: String,
    key_placeholder: Option<String>,
}

impl IterationRewriter {
    pub fn new(var: &str, collection: &str, key: Option<&str>) -> EngineResult<Self> {
        let var_pattern = Regex::new(&format!(r"\b{}\b", regex::escape(var)))
            .map_err(|e| EngineError::Parse(format!("invalid loop variable \"{var}\": {e}")))?;
        Ok(Self {
            var_pattern,
            collection: collection.to_string(),
            key_placeholder: key.map(|k| format!("${{{k}}}")),
        })
    }

    pub fn rewrite(&self, markup: &str, index: &str) -> EngineResult<String> {
        let indexed = format!("{}[{}]", self.collection, index);
        let mut out = populate::replace_all_fallible(populate::query_pattern(), markup, |caps| {
            let query = &caps[1];
            Ok(format!(
                "${{{}}}",
                self.var_pattern.replace(query, indexed.as_str())
            ))
        })?;
        if let Some(placeholder) = &self.key_placeholder {
            out = out.replace(placeholder.as_str(), index);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_rewriter() {
        let rewriter = IterationRewriter::new("item", "users", Some("k")).unwrap();
        let out = rewriter
            .rewrite("<li>${k}: ${item.name} (${items})</li>", "2")
            .unwrap();
        // `items` must not be touched; only the word `item` is.
        assert_eq!(out, "<li>2: ${users[2].name} (${items})</li>");
    }

    #[test]
    fn test_iteration_keys() {
        assert_eq!(
            iteration_keys(&Value::from(vec!["a", "b"])),
            Some(vec!["0".to_string(), "1".to_string()])
        );
        assert_eq!(iteration_keys(&Value::Int(1)), None);
    }

    #[test]
    fn test_reject_unknown_attrs() {
        let mut element = Element::new("b:foreach");
        element.set_attr("value", "${users}");
        element.set_attr("limit", "3");
        assert!(matches!(
            reject_unknown_attrs(&element, &["value", "var", "key"], "b:foreach"),
            Err(EngineError::UnexpectedToken(_))
        ));
    }
}
