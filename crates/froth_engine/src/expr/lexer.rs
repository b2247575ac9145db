//! Lexer for the directive expression grammar.

use crate::error::{EngineError, EngineResult};

/// One lexical token of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// A `${path}` resolution term.
    Query(String),
    /// An `@name` helper reference; always followed by a call.
    Helper(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Not,
    Question,
    Colon,
}

/// Tokenize an expression source string.
pub fn lex(source: &str) -> EngineResult<Vec<Tok>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '(' => push_single(&mut chars, &mut tokens, Tok::LParen),
            ')' => push_single(&mut chars, &mut tokens, Tok::RParen),
            ',' => push_single(&mut chars, &mut tokens, Tok::Comma),
            '+' => push_single(&mut chars, &mut tokens, Tok::Plus),
            '-' => push_single(&mut chars, &mut tokens, Tok::Minus),
            '*' => push_single(&mut chars, &mut tokens, Tok::Star),
            '/' => push_single(&mut chars, &mut tokens, Tok::Slash),
            '%' => push_single(&mut chars, &mut tokens, Tok::Percent),
            '?' => push_single(&mut chars, &mut tokens, Tok::Question),
            ':' => push_single(&mut chars, &mut tokens, Tok::Colon),
            '=' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    // `===` from legacy templates collapses to `==`.
                    if matches!(chars.peek(), Some((_, '='))) {
                        chars.next();
                    }
                    tokens.push(Tok::EqEq);
                } else {
                    return Err(expr_error(source, start, "expected `==`"));
                }
            }
            '!' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    if matches!(chars.peek(), Some((_, '='))) {
                        chars.next();
                    }
                    tokens.push(Tok::NotEq);
                } else {
                    tokens.push(Tok::Not);
                }
            }
            '<' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    tokens.push(Tok::Le);
                } else {
                    tokens.push(Tok::Lt);
                }
            }
            '>' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    tokens.push(Tok::Ge);
                } else {
                    tokens.push(Tok::Gt);
                }
            }
            '&' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '&'))) {
                    chars.next();
                    tokens.push(Tok::AndAnd);
                } else {
                    return Err(expr_error(source, start, "expected `&&`"));
                }
            }
            '|' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '|'))) {
                    chars.next();
                    tokens.push(Tok::OrOr);
                } else {
                    return Err(expr_error(source, start, "expected `||`"));
                }
            }
            '\'' | '"' => {
                tokens.push(lex_string(source, &mut chars, c)?);
            }
            '$' => {
                tokens.push(lex_query(source, &mut chars)?);
            }
            '@' => {
                chars.next();
                let name = lex_ident_text(&mut chars);
                if name.is_empty() {
                    return Err(expr_error(source, start, "expected helper name after `@`"));
                }
                tokens.push(Tok::Helper(name));
            }
            c if c.is_ascii_digit() => {
                tokens.push(lex_number(source, &mut chars)?);
            }
            c if c.is_alphabetic() || c == '_' => {
                tokens.push(Tok::Ident(lex_ident_text(&mut chars)));
            }
            other => {
                return Err(expr_error(
                    source,
                    start,
                    &format!("unexpected character `{other}`"),
                ));
            }
        }
    }

    Ok(tokens)
}

type CharStream<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn push_single(chars: &mut CharStream<'_>, tokens: &mut Vec<Tok>, tok: Tok) {
    chars.next();
    tokens.push(tok);
}

fn lex_ident_text(chars: &mut CharStream<'_>) -> String {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn lex_string(source: &str, chars: &mut CharStream<'_>, quote: char) -> EngineResult<Tok> {
    let (start, _) = chars.next().unwrap();
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((_, c)) if c == quote => return Ok(Tok::Str(value)),
            Some((_, '\\')) => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return Err(expr_error(source, start, "unterminated string")),
            },
            Some((_, c)) => value.push(c),
            None => return Err(expr_error(source, start, "unterminated string")),
        }
    }
}

fn lex_query(source: &str, chars: &mut CharStream<'_>) -> EngineResult<Tok> {
    let (start, _) = chars.next().unwrap();
    match chars.next() {
        Some((_, '{')) => {}
        _ => return Err(expr_error(source, start, "expected `{` after `$`")),
    }
    let mut query = String::new();
    for (_, c) in chars.by_ref() {
        if c == '}' {
            return Ok(Tok::Query(query.trim().to_string()));
        }
        query.push(c);
    }
    Err(expr_error(source, start, "unterminated `${` query"))
}

fn lex_number(source: &str, chars: &mut CharStream<'_>) -> EngineResult<Tok> {
    let (start, _) = *chars.peek().unwrap();
    let mut text = String::new();
    let mut is_float = false;
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else if c == '.' && !is_float {
            // Only consume the dot when a digit follows; `1.x` is not a number.
            let mut ahead = chars.clone();
            ahead.next();
            if matches!(ahead.peek(), Some((_, d)) if d.is_ascii_digit()) {
                is_float = true;
                text.push(c);
                chars.next();
            } else {
                break;
            }
        } else {
            break;
        }
    }

    if is_float {
        text.parse::<f64>()
            .map(Tok::Float)
            .map_err(|_| expr_error(source, start, "invalid number"))
    } else {
        text.parse::<i64>()
            .map(Tok::Int)
            .map_err(|_| expr_error(source, start, "invalid number"))
    }
}

fn expr_error(source: &str, at: usize, message: &str) -> EngineError {
    EngineError::Expression(format!("{message} at offset {at} in `{source}`"))
}
