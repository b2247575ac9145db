//! `text` — emit a text node or a thin wrapper element around it.

use crate::error::EngineResult;
use crate::tokens::{RenderContext, Stage, Token, TokenOutput};
use crate::xml::{Element, XmlNode};

pub const NAME: &str = "text";
pub const PRIORITY: i32 = 2;

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(TextToken { element })
}

/// Emits its text (the `value` attribute, or the element body) as a
/// bare text node. With an `element` attribute or any pass-through
/// attribute the text is wrapped in an element instead (`span` by
/// default), carrying the pass-through attributes.
pub struct TextToken {
    element: Element,
}

impl Token for TextToken {
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
        Ok(())
    }

    fn render(&mut self, _ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        let value = match self.element.attr("value") {
            Some(v) => v.to_string(),
            None => self.element.text_content(),
        };

        let wrapper = self.element.attr("element").map(str::to_string);
        let passthrough: Vec<(String, String)> = self
            .element
            .attributes
            .iter()
            .filter(|(name, _)| name != "value" && name != "element")
            .cloned()
            .collect();

        if wrapper.is_none() && passthrough.is_empty() {
            return Ok(TokenOutput::Replace(XmlNode::Text(value)));
        }

        let mut out = Element::new(wrapper.unwrap_or_else(|| "span".to_string()));
        out.attributes = passthrough;
        out.children.push(XmlNode::Text(value));
        Ok(TokenOutput::Replace(XmlNode::Element(out)))
    }
}
