//! The expression sandbox behind `{{ ... }}` islands and condition
//! attributes.
//!
//! Expressions are lexed and parsed into a small tree, then evaluated
//! directly. There is no host-language evaluation of any kind: the only
//! callables are helpers registered in a [`FunctionRegistry`], and the
//! only data access is path resolution through a [`DataResolver`].
//!
//! Source text arrives from attribute values and markup, so markup
//! entities (`&gt;`, and the mangled form produced while parsing) are
//! decoded before lexing.

mod eval;
mod lexer;
mod parser;

pub use parser::{BinaryOp, Expr, UnaryOp};

use crate::data::{DataResolver, Value};
use crate::error::EngineResult;
use crate::functions::FunctionRegistry;
use crate::util::decode_expression_text;

/// Parse an expression without evaluating it.
pub fn compile(source: &str) -> EngineResult<Expr> {
    let decoded = decode_expression_text(source);
    parser::parse(&lexer::lex(&decoded)?)
}

/// Evaluate an expression against a resolver and helper registry.
pub fn evaluate(
    source: &str,
    resolver: &DataResolver,
    functions: &FunctionRegistry,
) -> EngineResult<Value> {
    eval::eval(&compile(source)?, resolver, functions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataModel;

    #[test]
    fn test_evaluate_decodes_markup_entities() {
        let resolver = DataResolver::new(DataModel::new());
        let functions = FunctionRegistry::default();
        assert_eq!(
            evaluate("2 &gt;= 1 &amp;&amp; 1 &lt; 2", &resolver, &functions).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_evaluate_full_pipeline() {
        let mut model = DataModel::new();
        model.set("user", {
            let mut entries = std::collections::BTreeMap::new();
            entries.insert("name".to_string(), Value::from("ann"));
            Value::Map(entries)
        });
        let resolver = DataResolver::new(model);
        let functions = FunctionRegistry::default();
        assert_eq!(
            evaluate("@capitalize(${user.name})", &resolver, &functions).unwrap(),
            Value::from("Ann")
        );
    }
}
