//! `fragment` — a synthetic wrapper flattened into its children.

use crate::error::EngineResult;
use crate::tokens::{RenderContext, Stage, Token, TokenOutput, LOWEST_PRIORITY};
use crate::xml::Element;

pub const NAME: &str = "fragment";

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(FragmentToken { element })
}

/// Splices its children in place of itself. Runs last in the final
/// stage so wrappers written by users (or left by other directives)
/// never reach the output.
pub struct FragmentToken {
    element: Element,
}

impl Token for FragmentToken {
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
