//! `for` — repeat a body over an inclusive integer range.

use crate::data::Value;
use crate::error::{EngineError, EngineResult};
use crate::tokens::{
    reject_unknown_attrs, require_attr, RenderContext, Stage, Token, TokenOutput,
};
use crate::xml::{Document, Element};

pub const NAME: &str = "for";
pub const PRIORITY: i32 = 2;

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(ForToken { element })
}

/// Counts from `from` to `to` inclusive, in either direction, splicing
/// one copy of the body per step with `${var}` replaced by the counter.
pub struct ForToken {
    element: Element,
}

impl ForToken {
    fn bound(&self, ctx: &RenderContext<'_>, attr: &str) -> EngineResult<i64> {
        let source = require_attr(&self.element, attr, "b:for")?;
        match ctx.evaluate(source)? {
            Value::Int(n) => Ok(n),
            Value::Float(n) => Ok(n as i64),
            other => Err(EngineError::InvalidData(format!(
                "the \"{attr}\" bound of \"b:for\" must be numeric, got {other:?}"
            ))),
        }
    }
}

impl Token for ForToken {
    fn name(&self) -> &'static str {
        NAME
    }

    fn stage(&self) -> Stage {
        Stage::PreParse
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn parse(&mut self) -> EngineResult<()> {
        reject_unknown_attrs(&self.element, &["var", "from", "to"], "b:for")?;
        require_attr(&self.element, "var", "b:for")?;
        require_attr(&self.element, "from", "b:for")?;
        require_attr(&self.element, "to", "b:for")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        let var = require_attr(&self.element, "var", "b:for")?;
        let from = self.bound(ctx, "from")?;
        let to = self.bound(ctx, "to")?;

        let placeholder = format!("${{{var}}}");
        let body = self.element.inner_markup();

        let counters: Vec<i64> = if from <= to {
            (from..=to).collect()
        } else {
            (to..=from).rev().collect()
        };

        let mut expanded = String::new();
        for i in counters {
            expanded.push_str(&body.replace(placeholder.as_str(), &i.to_string()));
        }

        Ok(TokenOutput::Splice(Document::parse_fragment(&expanded)?))
    }
}
