//! `selectItems` — build a `select` element from a collection.

use crate::error::{EngineError, EngineResult};
use crate::populate::strip_query_wrapper;
use crate::tokens::{
    iteration_keys, require_attr, IterationRewriter, RenderContext, Stage, Token, TokenOutput,
};
use crate::xml::{Element, XmlNode};

pub const NAME: &str = "selectItems";
pub const PRIORITY: i32 = 2;

const RESERVED: [&str; 6] = ["items", "var", "key", "value", "label", "selected"];

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(SelectItemsToken { element })
}

/// Iterates a collection into `option` elements. The `value` and
/// `label` attributes are per-item templates over the loop variable;
/// the option whose rendered value equals the resolved `selected`
/// query (or its literal text when it is not a query) is marked
/// selected. Non-reserved attributes pass through to the `select`
/// element.
pub struct SelectItemsToken {
    element: Element,
}

impl Token for SelectItemsToken {
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
        require_attr(&self.element, "items", "b:selectItems")?;
        require_attr(&self.element, "var", "b:selectItems")?;
        require_attr(&self.element, "value", "b:selectItems")?;
        require_attr(&self.element, "label", "b:selectItems")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        let collection =
            strip_query_wrapper(require_attr(&self.element, "items", "b:selectItems")?);
        let var = require_attr(&self.element, "var", "b:selectItems")?;
        let value_template = require_attr(&self.element, "value", "b:selectItems")?;
        let label_template = require_attr(&self.element, "label", "b:selectItems")?;
        let key = self.element.attr("key");

        let data = ctx.resolver.resolve_raw(collection)?;
        let keys = iteration_keys(&data).ok_or_else(|| {
            EngineError::InvalidData(format!(
                "the value of \"{collection}\" is not iterable"
            ))
        })?;

        // `selected` names a query when it resolves; otherwise its
        // literal text is matched against the option values.
        let selected = match self.element.attr("selected") {
            Some(query) => Some(
                ctx.resolver
                    .resolve_raw(strip_query_wrapper(query))
                    .map(|v| v.display_string())
                    .unwrap_or_else(|_| query.to_string()),
            ),
            None => None,
        };

        let rewriter = IterationRewriter::new(var, collection, key)?;

        let mut select = Element::new("select");
        for (attr, value) in &self.element.attributes {
            if !RESERVED.contains(&attr.as_str()) {
                select.set_attr(attr.clone(), value.clone());
            }
        }

        for index in &keys {
            // Raw substitution: these strings become node content, and
            // the serializer escapes node content itself.
            let value = crate::populate::populate_node_text(
                &rewriter.rewrite(value_template, index)?,
                ctx.resolver,
                ctx.functions(),
            )?;
            let label = crate::populate::populate_node_text(
                &rewriter.rewrite(label_template, index)?,
                ctx.resolver,
                ctx.functions(),
            )?;

            let mut option = Element::new("option");
            option.set_attr("value", value.clone());
            if selected.as_deref() == Some(value.as_str()) {
                option.set_attr("selected", "true");
            }
            option.children.push(XmlNode::Text(label));
            select.children.push(XmlNode::Element(option));
        }

        Ok(TokenOutput::Replace(XmlNode::Element(select)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Document;

    #[test]
    fn test_parse_requires_item_templates() {
        let doc =
            Document::parse(r#"<b:selectItems items="${countries}" var="c"/>"#).unwrap();
        let mut token = SelectItemsToken { element: doc.root };
        assert!(matches!(
            token.parse(),
            Err(EngineError::ElementNotFound(_))
        ));
    }
}
