//! `include` — render another template file in place.

use std::rc::Rc;

use tracing::debug;

use crate::data::Value;
use crate::error::{EngineError, EngineResult};
use crate::template::Template;
use crate::tokens::{require_attr, RenderContext, Stage, Token, TokenOutput, HIGHEST_PRIORITY};
use crate::xml::{Document, Element};

pub const NAME: &str = "include";

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(IncludeToken { element })
}

/// Drives a nested template pipeline to completion and splices its
/// output. The nested template binds a copy of the current data model
/// extended with this element's non-`path` attributes, so included
/// fragments can receive local context without mutating the caller's
/// model.
pub struct IncludeToken {
    element: Element,
}

impl Token for IncludeToken {
    fn name(&self) -> &'static str {
        NAME
    }

    fn stage(&self) -> Stage {
        Stage::Include
    }

    fn priority(&self) -> i32 {
        HIGHEST_PRIORITY
    }

    fn parse(&mut self) -> EngineResult<()> {
        require_attr(&self.element, "path", "b:include")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        let depth = ctx.include_depth + 1;
        if depth > ctx.config.max_include_depth {
            return Err(EngineError::IncludeDepth(ctx.config.max_include_depth));
        }

        // Raw substitution: these values are bindings, not output text.
        // The child template escapes them on interpolation; escaping
        // here as well would double-escape.
        let name = crate::populate::populate_node_text(
            require_attr(&self.element, "path", "b:include")?,
            ctx.resolver,
            ctx.functions(),
        )?;

        let mut model = ctx.resolver.model().copy();
        for (attr, value) in &self.element.attributes {
            if attr == "path" {
                continue;
            }
            let bound =
                crate::populate::populate_node_text(value, ctx.resolver, ctx.functions())?;
            model.set(attr.clone(), Value::from(bound));
        }

        let path = ctx.config.resolve_template_path(&name);
        debug!(template = %path.display(), depth, "rendering include");

        let mut nested = Template::from_file(
            &path,
            model,
            Rc::clone(ctx.registries),
            ctx.config.clone(),
            depth,
        )?;
        let markup = nested.render_markup()?;

        Ok(TokenOutput::Splice(Document::parse_fragment(&markup)?))
    }
}
