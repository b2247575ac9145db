//! Whitespace-only pretty-printing of rendered markup.
//!
//! The indenter re-flows serialized markup one tag or text run per
//! line, indenting by element depth. Elements whose entire content is
//! a single text run stay on one line. It never touches the markup
//! itself, only the whitespace between tags.

const INDENT: &str = "    ";

#[derive(Debug, PartialEq)]
enum Chunk<'a> {
    Open(&'a str),
    Close(&'a str),
    /// Self-closing tags, comments, doctypes, processing instructions.
    Standalone(&'a str),
    Text(&'a str),
}

/// Re-indent serialized markup.
pub fn indent(markup: &str) -> String {
    let chunks = split(markup);
    let mut out = String::with_capacity(markup.len());
    let mut depth: usize = 0;
    let mut i = 0;

    while i < chunks.len() {
        match &chunks[i] {
            Chunk::Open(tag) => {
                // <a>text</a> stays on one line.
                if let (Some(Chunk::Text(text)), Some(Chunk::Close(close))) =
                    (chunks.get(i + 1), chunks.get(i + 2))
                {
                    push_line(&mut out, depth, &format!("{tag}{text}{close}"));
                    i += 3;
                    continue;
                }
                if let Some(Chunk::Close(close)) = chunks.get(i + 1) {
                    push_line(&mut out, depth, &format!("{tag}{close}"));
                    i += 2;
                    continue;
                }
                push_line(&mut out, depth, tag);
                depth += 1;
                i += 1;
            }
            Chunk::Close(tag) => {
                depth = depth.saturating_sub(1);
                push_line(&mut out, depth, tag);
                i += 1;
            }
            Chunk::Standalone(tag) => {
                push_line(&mut out, depth, tag);
                i += 1;
            }
            Chunk::Text(text) => {
                push_line(&mut out, depth, text);
                i += 1;
            }
        }
    }

    out
}

fn push_line(out: &mut String, depth: usize, content: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(content);
    out.push('\n');
}

/// Split markup into tag and text chunks, dropping whitespace-only
/// text runs and collapsing internal whitespace in the rest.
fn split(markup: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('<') {
            let end = match stripped.find('>') {
                Some(pos) => pos,
                // Unbalanced tail, keep it verbatim.
                None => {
                    chunks.push(Chunk::Text(rest));
                    break;
                }
            };
            let tag = &rest[..end + 2];
            let inner = &stripped[..end];
            if inner.starts_with('/') {
                chunks.push(Chunk::Close(tag));
            } else if inner.ends_with('/')
                || inner.starts_with('!')
                || inner.starts_with('?')
            {
                chunks.push(Chunk::Standalone(tag));
            } else {
                chunks.push(Chunk::Open(tag));
            }
            rest = &rest[end + 2..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            let text = &rest[..end];
            if !text.trim().is_empty() {
                chunks.push(Chunk::Text(text.trim()));
            }
            rest = &rest[end..];
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indents_nested_elements() {
        let out = indent("<div><ul><li>a</li><li>b</li></ul><hr/></div>");
        assert_eq!(
            out,
            "<div>\n    <ul>\n        <li>a</li>\n        <li>b</li>\n    </ul>\n    <hr/>\n</div>\n"
        );
    }

    #[test]
    fn test_is_whitespace_only_transformation() {
        let source = "<div><p>hi</p>\n  <hr/></div>";
        let indented = indent(source);
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&indented), strip(source));
    }

    #[test]
    fn test_doctype_stays_put() {
        let out = indent("<!DOCTYPE html>\n<html><body/></html>");
        assert!(out.starts_with("<!DOCTYPE html>\n"));
    }
}
