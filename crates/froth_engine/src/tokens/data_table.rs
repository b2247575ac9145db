//! `dataTable` — build a table from a collection and column templates.

use crate::error::{EngineError, EngineResult};
use crate::populate::strip_query_wrapper;
use crate::tokens::{
    iteration_keys, require_attr, IterationRewriter, RenderContext, Stage, Token, TokenOutput,
};
use crate::xml::{Document, Element, XmlNode};

pub const NAME: &str = "dataTable";
pub const PRIORITY: i32 = 3;

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(DataTableToken {
        element,
        columns: Vec::new(),
    })
}

/// One `column` child: optional head and foot cells around the
/// per-row content template.
struct Column {
    head: String,
    content: String,
    foot: String,
}

/// Iterates a collection into a `table` element: one `tbody` row per
/// entry with one cell per column, plus `thead`/`tfoot` rows that are
/// omitted entirely when every column leaves them empty. Non-reserved
/// attributes pass through to the `table` element.
pub struct DataTableToken {
    element: Element,
    columns: Vec<Column>,
}

impl Token for DataTableToken {
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
        require_attr(&self.element, "value", "b:dataTable")?;
        require_attr(&self.element, "var", "b:dataTable")?;

        let mut columns = Vec::new();
        for child in &self.element.children {
            let column = match child {
                XmlNode::Element(e) if e.name == "column" => e,
                XmlNode::Text(t) if t.trim().is_empty() => continue,
                XmlNode::Comment(_) => continue,
                _ => {
                    return Err(EngineError::UnexpectedToken(
                        "only \"column\" elements may appear in \"b:dataTable\"".to_string(),
                    ))
                }
            };

            let mut head = String::new();
            let mut content = None;
            let mut foot = String::new();
            for cell in &column.children {
                let part = match cell {
                    XmlNode::Element(e) => e,
                    XmlNode::Text(t) if t.trim().is_empty() => continue,
                    XmlNode::Comment(_) => continue,
                    _ => {
                        return Err(EngineError::UnexpectedToken(
                            "a \"column\" may only contain \"head\", \"content\" and \"foot\""
                                .to_string(),
                        ))
                    }
                };
                match part.name.as_str() {
                    "head" => head = part.inner_markup(),
                    "content" => content = Some(part.inner_markup()),
                    "foot" => foot = part.inner_markup(),
                    other => {
                        return Err(EngineError::UnexpectedToken(format!(
                            "unexpected \"{other}\" element in a \"b:dataTable\" column"
                        )))
                    }
                }
            }

            columns.push(Column {
                head,
                content: content.ok_or_else(|| {
                    EngineError::ElementNotFound(
                        "every \"b:dataTable\" column needs a \"content\" element".to_string(),
                    )
                })?,
                foot,
            });
        }

        if columns.is_empty() {
            return Err(EngineError::ElementNotFound(
                "\"b:dataTable\" must have at least one column".to_string(),
            ));
        }
        self.columns = columns;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        let collection =
            strip_query_wrapper(require_attr(&self.element, "value", "b:dataTable")?);
        let var = require_attr(&self.element, "var", "b:dataTable")?;
        let key = self.element.attr("key");

        let data = ctx.resolver.resolve_raw(collection)?;
        let keys = iteration_keys(&data).ok_or_else(|| {
            EngineError::InvalidData(format!(
                "the value of \"{collection}\" is not iterable"
            ))
        })?;

        let rewriter = IterationRewriter::new(var, collection, key)?;

        let mut table = Element::new("table");
        for (attr, value) in &self.element.attributes {
            if !matches!(attr.as_str(), "value" | "var" | "key") {
                table.set_attr(attr.clone(), value.clone());
            }
        }

        let mut body = Element::new("tbody");
        for index in &keys {
            let mut row = Element::new("tr");
            for column in &self.columns {
                row.children.push(XmlNode::Element(cell(
                    "td",
                    &rewriter.rewrite(&column.content, index)?,
                )?));
            }
            body.children.push(XmlNode::Element(row));
        }

        // Head and foot cells only see the first entry's bindings.
        if !keys.is_empty() {
            let first = &keys[0];
            if self.columns.iter().any(|c| !c.head.is_empty()) {
                let mut row = Element::new("tr");
                for column in &self.columns {
                    row.children
                        .push(XmlNode::Element(cell("th", &rewriter.rewrite(&column.head, first)?)?));
                }
                let mut head = Element::new("thead");
                head.children.push(XmlNode::Element(row));
                table.children.push(XmlNode::Element(head));
            }
        }

        table.children.push(XmlNode::Element(body));

        if !keys.is_empty() && self.columns.iter().any(|c| !c.foot.is_empty()) {
            let first = &keys[0];
            let mut row = Element::new("tr");
            for column in &self.columns {
                row.children
                    .push(XmlNode::Element(cell("th", &rewriter.rewrite(&column.foot, first)?)?));
            }
            let mut foot = Element::new("tfoot");
            foot.children.push(XmlNode::Element(row));
            table.children.push(XmlNode::Element(foot));
        }

        Ok(TokenOutput::Replace(XmlNode::Element(table)))
    }
}

fn cell(tag: &str, markup: &str) -> EngineResult<Element> {
    let mut element = Element::new(tag);
    element.children = Document::parse_fragment(markup)?;
    Ok(element)
}
