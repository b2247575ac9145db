//! The data-population pass: textual substitution of `{{ expr }}`
//! islands and `${query}` placeholders in serialized markup.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::data::{DataResolver, Value};
use crate::error::{EngineError, EngineResult};
use crate::expr;
use crate::functions::FunctionRegistry;
use crate::util::escape_html;

/// Characters allowed inside a `${...}` placeholder.
const QUERY_CHARS: &str = r#"[a-zA-Z0-9,._()\[\]'"/ ]"#;

/// Substitution rounds before a circular placeholder is assumed.
const MAX_QUERY_ROUNDS: usize = 64;

pub fn query_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"\$\{{({QUERY_CHARS}+)\}}")).unwrap())
}

fn expression_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(.+?)\}\}").unwrap())
}

/// Substitute every `{{ expr }}` island, then every `${query}`
/// placeholder, repeating the query pass until none remain (a resolved
/// value may itself contain placeholders).
pub fn populate_text(
    text: &str,
    resolver: &DataResolver,
    functions: &FunctionRegistry,
) -> EngineResult<String> {
    let mut text = replace_all_fallible(expression_pattern(), text, |caps| {
        let value = expr::evaluate(&caps[1], resolver, functions)?;
        Ok(output_string(&value))
    })?;

    let mut rounds = 0;
    while query_pattern().is_match(&text) {
        if rounds == MAX_QUERY_ROUNDS {
            return Err(EngineError::Parse(
                "placeholder substitution did not terminate".to_string(),
            ));
        }
        rounds += 1;

        let next = replace_all_fallible(query_pattern(), &text, |caps| {
            Ok(resolver.resolve(&caps[1])?.display_string())
        })?;
        if next == text {
            return Err(EngineError::Parse(
                "placeholder resolves to itself".to_string(),
            ));
        }
        text = next;
    }

    Ok(text)
}

/// Like [`populate_text`], but substituted strings are not
/// HTML-escaped. For text that becomes a tree node's content, where the
/// serializer applies the markup escaping itself.
pub fn populate_node_text(
    text: &str,
    resolver: &DataResolver,
    functions: &FunctionRegistry,
) -> EngineResult<String> {
    let text = replace_all_fallible(expression_pattern(), text, |caps| {
        Ok(expr::evaluate(&caps[1], resolver, functions)?.display_string())
    })?;
    replace_all_fallible(query_pattern(), &text, |caps| {
        Ok(resolver.resolve_raw(&caps[1])?.display_string())
    })
}

/// The textual form an expression result takes in output. Strings are
/// HTML-escaped; resolver results arrive already escaped and pass
/// through `display_string` untouched.
pub fn output_string(value: &Value) -> String {
    match value {
        Value::String(s) => escape_html(s),
        other => other.display_string(),
    }
}

/// Strip a `${...}` wrapper from an attribute value, if present.
/// Iteration directives accept their collection both as a bare query
/// and in placeholder form.
pub fn strip_query_wrapper(value: &str) -> &str {
    value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .map(str::trim)
        .unwrap_or(value)
}

/// `Regex::replace_all` with a fallible replacement callback.
pub fn replace_all_fallible(
    pattern: &Regex,
    text: &str,
    mut replacement: impl FnMut(&Captures<'_>) -> EngineResult<String>,
) -> EngineResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let whole = caps.get(0).ok_or_else(|| {
            EngineError::Parse("regex match without a whole-match group".to_string())
        })?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replacement(&caps)?);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}
