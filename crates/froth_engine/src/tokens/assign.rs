//! `assign` — bind a computed value into the data model.

use tracing::debug;

use crate::error::EngineResult;
use crate::tokens::{
    reject_unknown_attrs, require_attr, RenderContext, Stage, Token, TokenOutput,
    HIGHEST_PRIORITY,
};
use crate::xml::Element;

pub const NAME: &str = "assign";

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(AssignToken { element })
}

/// Evaluates `value` and binds it under `var`, installing a new
/// data-model generation so later resolutions see the binding with a
/// fresh cache. The element itself is deleted. Runs at the highest
/// priority so bindings exist before sibling directives resolve.
pub struct AssignToken {
    element: Element,
}

impl Token for AssignToken {
    fn name(&self) -> &'static str {
        NAME
    }

    fn stage(&self) -> Stage {
        Stage::PreParse
    }

    fn priority(&self) -> i32 {
        HIGHEST_PRIORITY
    }

    fn parse(&mut self) -> EngineResult<()> {
        reject_unknown_attrs(&self.element, &["var", "value"], "b:assign")?;
        require_attr(&self.element, "var", "b:assign")?;
        require_attr(&self.element, "value", "b:assign")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        let var = require_attr(&self.element, "var", "b:assign")?;
        let value = ctx.evaluate(require_attr(&self.element, "value", "b:assign")?)?;
        debug!(var, ?value, "assigning template variable");

        let mut model = ctx.resolver.model().copy();
        model.set(var, value);
        ctx.pending_model = Some(model);

        Ok(TokenOutput::Remove)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::xml::Document;

    #[test]
    fn test_parse_rejects_extra_attributes() {
        let doc = Document::parse(r#"<b:assign var="x" value="1" scope="page"/>"#).unwrap();
        let mut token = AssignToken { element: doc.root };
        assert!(matches!(
            token.parse(),
            Err(EngineError::UnexpectedToken(_))
        ));
    }
}
