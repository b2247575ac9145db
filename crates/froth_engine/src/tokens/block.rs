//! `block` — an inheritance placeholder left unmatched by any child
//! override.

use crate::error::EngineResult;
use crate::tokens::{RenderContext, Stage, Token, TokenOutput, LOWEST_PRIORITY};
use crate::xml::Element;

pub const NAME: &str = "block";

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(BlockToken { element })
}

/// Matched placeholders are consumed by the inheritance merge before
/// tokenization; any placeholder still present at render time keeps
/// its default children, which this token splices in place.
pub struct BlockToken {
    element: Element,
}

impl Token for BlockToken {
    fn name(&self) -> &'static str {
        NAME
    }

    fn stage(&self) -> Stage {
        Stage::PostParse
    }

    fn priority(&self) -> i32 {
        LOWEST_PRIORITY
    }

    fn parse(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn render(&mut self, _ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        Ok(TokenOutput::Splice(std::mem::take(
            &mut self.element.children,
        )))
    }
}
