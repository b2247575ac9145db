//! Directive discovery over a parsed document snapshot.
//!
//! Discovery walks the tree bottom-up (children before their parent,
//! matching the order nested directives must expand in) and binds each
//! directive element to a fresh token. Bindings are node paths into the
//! snapshot they were discovered in; any tree edit invalidates the
//! whole list and requires re-discovery.

use tracing::trace;

use crate::error::{EngineError, EngineResult};
use crate::registry::{Registries, ROOT_LOCAL_NAME};
use crate::tokens::Token;
use crate::xml::{Document, Element, NodePath, XmlNode};

/// A directive handler bound to a node path in one snapshot.
pub struct DiscoveredToken {
    pub token: Box<dyn Token>,
    pub path: NodePath,
}

/// Scan a document for directive elements.
///
/// The root must be the `template` sentinel in a registered directive
/// namespace; a sentinel anywhere else is a parse error, and a
/// directive-namespaced element with no registered handler is
/// [`EngineError::UnknownToken`].
pub fn tokenize(doc: &Document, registries: &Registries) -> EngineResult<Vec<DiscoveredToken>> {
    match registries.namespaces.split_directive_name(&doc.root.name) {
        Some((_, local)) if local == ROOT_LOCAL_NAME => {}
        _ => {
            return Err(EngineError::Parse(format!(
                "the document root must be the template sentinel element, found \"{}\"",
                doc.root.name
            )))
        }
    }

    let mut discovered = Vec::new();
    walk(&doc.root, &mut Vec::new(), registries, &mut discovered)?;
    trace!(count = discovered.len(), "discovered directive tokens");
    Ok(discovered)
}

fn walk(
    element: &Element,
    path: &mut NodePath,
    registries: &Registries,
    discovered: &mut Vec<DiscoveredToken>,
) -> EngineResult<()> {
    for (index, child) in element.children.iter().enumerate() {
        let XmlNode::Element(child) = child else {
            continue;
        };
        path.push(index);
        walk(child, path, registries, discovered)?;

        if let Some((_, local)) = registries.namespaces.split_directive_name(&child.name) {
            if local == ROOT_LOCAL_NAME {
                return Err(EngineError::Parse(
                    "the template sentinel element may only appear at the root".to_string(),
                ));
            }
            let token = registries
                .tokens
                .instantiate(local, child.clone())
                .ok_or_else(|| EngineError::UnknownToken(child.name.clone()))?;
            discovered.push(DiscoveredToken {
                token,
                path: path.clone(),
            });
        }
        path.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registries;
    use crate::tokens::Stage;

    fn registries() -> Registries {
        Registries::default()
    }

    #[test]
    fn test_discovers_nested_directives_bottom_up() {
        let doc = Document::parse(
            r#"<b:template xmlns:b="https://froth.dev/schema/template">
                <ul><b:foreach value="${xs}" var="x"><li><b:text>1</b:text></li></b:foreach></ul>
            </b:template>"#,
        )
        .unwrap();
        let tokens = tokenize(&doc, &registries()).unwrap();
        let names: Vec<&str> = tokens.iter().map(|t| t.token.name()).collect();
        assert_eq!(names, vec!["text", "foreach"]);
        assert_eq!(tokens[1].token.stage(), Stage::PreParse);
    }

    #[test]
    fn test_rejects_wrong_root() {
        let doc = Document::parse("<html><body/></html>").unwrap();
        assert!(matches!(
            tokenize(&doc, &registries()),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_nested_sentinel() {
        let doc = Document::parse("<b:template><b:template/></b:template>").unwrap();
        assert!(matches!(
            tokenize(&doc, &registries()),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_directive() {
        let doc = Document::parse("<b:template><b:widget/></b:template>").unwrap();
        assert!(matches!(
            tokenize(&doc, &registries()),
            Err(EngineError::UnknownToken(_))
        ));
    }
}
