//! `foreach` — repeat a body once per entry of a collection.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::populate::strip_query_wrapper;
use crate::tokens::{
    iteration_keys, reject_unknown_attrs, require_attr, IterationRewriter, RenderContext, Stage,
    Token, TokenOutput,
};
use crate::xml::{Document, Element};

pub const NAME: &str = "foreach";
pub const PRIORITY: i32 = 2;

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(ForeachToken { element })
}

/// Iterates a resolved collection, splicing one rewritten copy of the
/// body per entry. Body placeholders that start with the loop variable
/// are rewritten to indexed queries into the collection, so the copies
/// resolve lazily during the later data-population pass.
pub struct ForeachToken {
    element: Element,
}

impl Token for ForeachToken {
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
        reject_unknown_attrs(&self.element, &["value", "var", "key"], "b:foreach")?;
        require_attr(&self.element, "value", "b:foreach")?;
        require_attr(&self.element, "var", "b:foreach")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        let collection = strip_query_wrapper(require_attr(&self.element, "value", "b:foreach")?);
        let var = require_attr(&self.element, "var", "b:foreach")?;
        let key = self.element.attr("key");

        let data = ctx.resolver.resolve_raw(collection)?;
        let keys = iteration_keys(&data).ok_or_else(|| {
            EngineError::InvalidData(format!(
                "the value of \"{collection}\" is not iterable"
            ))
        })?;
        debug!(collection, entries = keys.len(), "expanding foreach");

        let rewriter = IterationRewriter::new(var, collection, key)?;
        let body = self.element.inner_markup();

        let mut expanded = String::new();
        for index in &keys {
            expanded.push_str(&rewriter.rewrite(&body, index)?);
        }

        Ok(TokenOutput::Splice(Document::parse_fragment(&expanded)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn token_from(source: &str) -> ForeachToken {
        let doc = Document::parse(source).unwrap();
        ForeachToken {
            element: doc.root,
        }
    }

    #[test]
    fn test_parse_rejects_unknown_attribute() {
        let mut token =
            token_from(r#"<b:foreach value="${users}" var="u" limit="2"><li/></b:foreach>"#);
        assert!(matches!(
            token.parse(),
            Err(EngineError::UnexpectedToken(_))
        ));
    }

    #[test]
    fn test_parse_requires_var() {
        let mut token = token_from(r#"<b:foreach value="${users}"><li/></b:foreach>"#);
        assert!(matches!(
            token.parse(),
            Err(EngineError::ElementNotFound(_))
        ));
    }
}
