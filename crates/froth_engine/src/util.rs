//! Small text helpers shared across the pipeline.

use std::sync::OnceLock;

use regex::Regex;

/// Marker form that keeps `&name;` entity references alive through
/// strict XML parsing; restored by [`restore_entities`] on output.
const ENTITY_MARKER_OPEN: &str = "[b:entity ";

fn entity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(\w+);").unwrap())
}

fn marker_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[b:entity (\w+)\]").unwrap())
}

/// Escape text for HTML/XML output.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rewrite `&name;` references to a private marker so the XML parser
/// never sees an entity it cannot expand.
pub fn mangle_entities(input: &str) -> String {
    entity_pattern()
        .replace_all(input, format!("{ENTITY_MARKER_OPEN}$1]"))
        .into_owned()
}

/// Restore mangled entity markers to `&name;` references.
pub fn restore_entities(input: &str) -> String {
    marker_pattern().replace_all(input, "&$1;").into_owned()
}

/// Decode the handful of markup entities (plain or mangled) that can
/// appear inside a directive expression, so `a &gt;= b` lexes as `a >= b`.
pub fn decode_expression_text(input: &str) -> String {
    let restored = restore_entities(input);
    restored
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_entity_round_trip() {
        let mangled = mangle_entities("caf&eacute; &amp; more");
        assert_eq!(mangled, "caf[b:entity eacute] [b:entity amp] more");
        assert_eq!(restore_entities(&mangled), "caf&eacute; &amp; more");
    }

    #[test]
    fn test_decode_expression_text() {
        assert_eq!(
            decode_expression_text("1 [b:entity lt]= 2 &amp;&amp; true"),
            "1 <= 2 && true"
        );
    }
}
