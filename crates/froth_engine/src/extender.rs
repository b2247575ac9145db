//! Template inheritance: `extends` chain resolution and block merging.
//!
//! A child names its parent with an `extends` attribute on the root
//! sentinel; its top-level elements are named block overrides, matched
//! by tag name against the parent's `b:block` placeholders. The parent
//! is fully merged with its own ancestors first, so overrides always
//! land in a finished document.

use std::fs;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::xml::{Document, Element, NodePath, XmlNode};

const EXTENDS_ATTR: &str = "extends";
const BLOCK_LOCAL_NAME: &str = "block";

/// Resolve a template's whole inheritance chain, returning the merged
/// source. Templates without an `extends` attribute pass through
/// untouched.
pub fn resolve_inheritance(source: &str, config: &EngineConfig) -> EngineResult<String> {
    merge_chain(source, config, 0)
}

fn merge_chain(source: &str, config: &EngineConfig, depth: usize) -> EngineResult<String> {
    let child = Document::parse(source)?;
    let Some(parent_name) = child.root.attr(EXTENDS_ATTR).map(str::to_string) else {
        return Ok(source.to_string());
    };
    if depth >= config.max_include_depth {
        return Err(EngineError::IncludeDepth(config.max_include_depth));
    }

    let path = config.resolve_template_path(&parent_name);
    let parent_source =
        fs::read_to_string(&path).map_err(|_| EngineError::TemplateNotFound(path.clone()))?;
    debug!(parent = %path.display(), depth, "merging template with its parent");

    // Grandparent-first: the parent must be a finished document before
    // the child's overrides are applied to it.
    let parent_source = merge_chain(&parent_source, config, depth + 1)?;
    let mut parent = Document::parse(&parent_source)?;

    let overrides = block_overrides(&child.root);

    // An injected override may itself contain placeholders, so replace
    // until a full scan changes nothing. The cap catches an override
    // that re-introduces its own placeholder.
    let mut replacements = 0;
    loop {
        let Some((placeholder, nodes)) = next_match(&parent, &overrides) else {
            break;
        };
        if replacements == 1000 {
            return Err(EngineError::Parse(
                "block merging did not terminate".to_string(),
            ));
        }
        replacements += 1;
        parent.splice_node(&placeholder, nodes)?;
    }

    Ok(parent.serialize())
}

/// The child's top-level elements, keyed by tag name.
fn block_overrides(root: &Element) -> Vec<(String, Vec<XmlNode>)> {
    root.children
        .iter()
        .filter_map(|node| match node {
            XmlNode::Element(e) => Some((e.name.clone(), e.children.clone())),
            _ => None,
        })
        .collect()
}

/// The first `b:block` placeholder with a matching override, if any.
fn next_match(
    parent: &Document,
    overrides: &[(String, Vec<XmlNode>)],
) -> Option<(NodePath, Vec<XmlNode>)> {
    find_placeholder(&parent.root, &mut Vec::new(), overrides)
}

fn find_placeholder(
    element: &Element,
    path: &mut NodePath,
    overrides: &[(String, Vec<XmlNode>)],
) -> Option<(NodePath, Vec<XmlNode>)> {
    for (index, child) in element.children.iter().enumerate() {
        let XmlNode::Element(child) = child else {
            continue;
        };
        path.push(index);

        if is_block_placeholder(child) {
            if let Some(name) = child.attr("name") {
                if let Some((_, nodes)) = overrides.iter().find(|(n, _)| n == name) {
                    let found = (path.clone(), nodes.clone());
                    path.pop();
                    return Some(found);
                }
            }
        }

        if let Some(found) = find_placeholder(child, path, overrides) {
            path.pop();
            return Some(found);
        }
        path.pop();
    }
    None
}

fn is_block_placeholder(element: &Element) -> bool {
    element
        .name
        .split_once(':')
        .is_some_and(|(_, local)| local == BLOCK_LOCAL_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_template(dir: &std::path::Path, name: &str, body: &str) {
        let mut file = std::fs::File::create(dir.join(format!("{name}.html"))).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn test_merge_keeps_unoverridden_block_default() {
        let dir = tempfile::tempdir().unwrap();
        write_template(
            dir.path(),
            "base",
            r#"<b:template><header><b:block name="header"><h1>Default</h1></b:block></header><footer><b:block name="footer"><p>Footer</p></b:block></footer></b:template>"#,
        );
        let config = EngineConfig::new(dir.path());

        let child = r#"<b:template extends="base"><header><h1>Custom</h1></header></b:template>"#;
        let merged = resolve_inheritance(child, &config).unwrap();

        assert!(merged.contains("<h1>Custom</h1>"));
        // The footer placeholder stays for the block token to unwrap.
        assert!(merged.contains(r#"<b:block name="footer">"#));
        assert!(!merged.contains(r#"name="header""#));
    }

    #[test]
    fn test_grandparent_chain() {
        let dir = tempfile::tempdir().unwrap();
        write_template(
            dir.path(),
            "root",
            r#"<b:template><b:block name="content"><p>root</p></b:block></b:template>"#,
        );
        write_template(
            dir.path(),
            "mid",
            r#"<b:template extends="root"><content><b:block name="body"><p>mid</p></b:block></content></b:template>"#,
        );
        let config = EngineConfig::new(dir.path());

        let child = r#"<b:template extends="mid"><body><p>leaf</p></body></b:template>"#;
        let merged = resolve_inheritance(child, &config).unwrap();
        assert!(merged.contains("<p>leaf</p>"));
        assert!(!merged.contains("b:block"));
    }

    #[test]
    fn test_missing_parent_is_template_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let child = r#"<b:template extends="ghost"><x/></b:template>"#;
        assert!(matches!(
            resolve_inheritance(child, &config),
            Err(EngineError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_cyclic_chain_hits_depth_guard() {
        let dir = tempfile::tempdir().unwrap();
        write_template(
            dir.path(),
            "a",
            r#"<b:template extends="b"><x/></b:template>"#,
        );
        write_template(
            dir.path(),
            "b",
            r#"<b:template extends="a"><x/></b:template>"#,
        );
        let config = EngineConfig::new(dir.path());
        let child = r#"<b:template extends="a"><x/></b:template>"#;
        assert!(matches!(
            resolve_inheritance(child, &config),
            Err(EngineError::IncludeDepth(_))
        ));
    }
}
