//! The document tree the rewrite pipeline operates on.
//!
//! Each pipeline stage parses the previous stage's serialized output into
//! a fresh tree, so no node reference ever survives an edit. Nodes are
//! addressed by [`NodePath`] — the child-index route from the root — and
//! a path is only valid for the snapshot it was discovered in.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{EngineError, EngineResult};
use crate::util::{escape_html, mangle_entities};

/// Child-index route from the document root to a node.
pub type NodePath = Vec<usize>;

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with its attributes in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace an attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Serialize only the children of this element.
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(&mut out, child);
        }
        out
    }

    /// The concatenated text content of this element.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => out.push_str(&e.text_content()),
                XmlNode::Comment(_) => {}
            }
        }
        out
    }
}

/// A parsed document snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doctype: Option<String>,
    pub root: Element,
}

impl Document {
    /// Parse a document from source text. Unknown entity references are
    /// pre-mangled to a private marker so strict parsing survives them.
    pub fn parse(source: &str) -> EngineResult<Document> {
        let source = mangle_entities(source);
        let mut reader = Reader::from_str(&source);

        let mut doctype = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    stack.push(element_from_start(&e)?);
                }
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        EngineError::Parse("unbalanced closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::Text(e) => {
                    let text = e.unescape()?.into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::Comment(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Comment(text));
                    }
                }
                Event::DocType(e) => {
                    doctype = Some(e.unescape()?.trim().to_string());
                }
                Event::Decl(_) | Event::PI(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(EngineError::Parse("unclosed element".to_string()));
        }

        let root = root.ok_or_else(|| EngineError::Parse("document has no root element".to_string()))?;
        Ok(Document { doctype, root })
    }

    /// Parse a markup fragment (zero or more sibling nodes).
    pub fn parse_fragment(markup: &str) -> EngineResult<Vec<XmlNode>> {
        let wrapped = format!("<fragment-wrapper>{markup}</fragment-wrapper>");
        let doc = Document::parse(&wrapped)?;
        Ok(doc.root.children)
    }

    /// Serialize the whole document, doctype included.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push_str(">\n");
        }
        write_node(&mut out, &XmlNode::Element(self.root.clone()));
        out
    }

    /// Borrow the node at a path. An empty path is the root element.
    pub fn node_at(&self, path: &[usize]) -> Option<&XmlNode> {
        let mut children = &self.root.children;
        let (last, route) = path.split_last()?;
        for &index in route {
            match children.get(index)? {
                XmlNode::Element(e) => children = &e.children,
                _ => return None,
            }
        }
        children.get(*last)
    }

    /// Replace the node at a path with another node.
    pub fn replace_node(&mut self, path: &[usize], node: XmlNode) -> EngineResult<()> {
        let (last, route) = split_path(path)?;
        let children = self.children_at_mut(route, path)?;
        if last >= children.len() {
            return Err(stale_path(path));
        }
        children[last] = node;
        Ok(())
    }

    /// Remove the node at a path.
    pub fn remove_node(&mut self, path: &[usize]) -> EngineResult<()> {
        let (last, route) = split_path(path)?;
        let children = self.children_at_mut(route, path)?;
        if last >= children.len() {
            return Err(stale_path(path));
        }
        children.remove(last);
        Ok(())
    }

    /// Replace the node at a path with a run of sibling nodes, in place.
    pub fn splice_node(&mut self, path: &[usize], nodes: Vec<XmlNode>) -> EngineResult<()> {
        let (last, route) = split_path(path)?;
        let children = self.children_at_mut(route, path)?;
        if last >= children.len() {
            return Err(stale_path(path));
        }
        children.splice(last..=last, nodes);
        Ok(())
    }

    fn children_at_mut(
        &mut self,
        route: &[usize],
        full_path: &[usize],
    ) -> EngineResult<&mut Vec<XmlNode>> {
        let mut children = &mut self.root.children;
        for &index in route {
            match children.get_mut(index) {
                Some(XmlNode::Element(e)) => children = &mut e.children,
                _ => return Err(stale_path(full_path)),
            }
        }
        Ok(children)
    }
}

fn split_path(path: &[usize]) -> EngineResult<(usize, &[usize])> {
    match path.split_last() {
        Some((last, route)) => Ok((*last, route)),
        None => Err(EngineError::Parse(
            "the document root cannot be edited".to_string(),
        )),
    }
}

fn stale_path(path: &[usize]) -> EngineError {
    EngineError::Parse(format!("stale node path {path:?}"))
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> EngineResult<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
    node: XmlNode,
) -> EngineResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(element) => {
            if root.is_some() {
                return Err(EngineError::Parse(
                    "document has more than one root element".to_string(),
                ));
            }
            *root = Some(element);
            Ok(())
        }
        // Stray text or comments outside the root are dropped.
        _ => Ok(()),
    }
}

fn write_node(out: &mut String, node: &XmlNode) {
    match node {
        XmlNode::Text(text) => out.push_str(&escape_text(text)),
        XmlNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        XmlNode::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_html(value));
                out.push('"');
            }
            if element.children.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in &element.children {
                    write_node(out, child);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

// Text nodes only need the markup-significant characters escaped;
// quotes stay literal.
fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_round_trip() {
        let source = r#"<b:template xmlns:b="https://example.com/b"><p class="x">hi &amp; bye</p></b:template>"#;
        let doc = Document::parse(source).unwrap();
        assert_eq!(doc.root.name, "b:template");
        let serialized = doc.serialize();
        let reparsed = Document::parse(&serialized).unwrap();
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn test_unknown_entities_survive_parsing() {
        let doc = Document::parse("<r>caf&eacute;</r>").unwrap();
        assert_eq!(
            doc.root.children,
            vec![XmlNode::Text("caf[b:entity eacute]".to_string())]
        );
    }

    #[test]
    fn test_node_at_and_edits() {
        let mut doc = Document::parse("<r><a/><b><c/></b></r>").unwrap();
        assert!(matches!(
            doc.node_at(&[1, 0]),
            Some(XmlNode::Element(e)) if e.name == "c"
        ));

        doc.replace_node(&[0], XmlNode::Text("x".to_string())).unwrap();
        doc.splice_node(&[1], vec![XmlNode::Element(Element::new("d")), XmlNode::Element(Element::new("e"))])
            .unwrap();
        assert_eq!(doc.serialize(), "<r>x<d/><e/></r>");

        doc.remove_node(&[2]).unwrap();
        assert_eq!(doc.serialize(), "<r>x<d/></r>");
    }

    #[test]
    fn test_parse_fragment() {
        let nodes = Document::parse_fragment("text<hr/>more").unwrap();
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn test_multiple_roots_rejected() {
        assert!(Document::parse("<a/><b/>").is_err());
    }
}
