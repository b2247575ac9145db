//! Recursive-descent parser for the expression grammar.
//!
//! Precedence, loosest first: ternary, `||`, `&&`, equality,
//! comparison, additive, multiplicative, unary, primary.

use crate::data::Value;
use crate::error::{EngineError, EngineResult};
use crate::expr::lexer::Tok;

#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// A `${path}` term, resolved against the data model at eval time.
    Query(String),
    /// A bare identifier. Legacy templates reach the evaluator with
    /// pre-substituted words in place of values, so a bareword
    /// evaluates to its own spelling as a string.
    Bareword(String),
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// Parse a token stream into an expression tree.
pub fn parse(tokens: &[Tok]) -> EngineResult<Expr> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.ternary()?;
    if parser.pos != tokens.len() {
        return Err(parser.unexpected("end of expression"));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Tok],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Tok> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Tok) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Tok, what: &str) -> EngineResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> EngineError {
        match self.peek() {
            Some(tok) => EngineError::Expression(format!("expected {expected}, found {tok:?}")),
            None => EngineError::Expression(format!("expected {expected}, found end of input")),
        }
    }

    fn ternary(&mut self) -> EngineResult<Expr> {
        let cond = self.or()?;
        if self.eat(&Tok::Question) {
            let then = self.ternary()?;
            self.expect(&Tok::Colon, "`:` in ternary")?;
            let other = self.ternary()?;
            return Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(other)));
        }
        Ok(cond)
    }

    fn or(&mut self) -> EngineResult<Expr> {
        let mut lhs = self.and()?;
        while self.eat(&Tok::OrOr) {
            let rhs = self.and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> EngineResult<Expr> {
        let mut lhs = self.equality()?;
        while self.eat(&Tok::AndAnd) {
            let rhs = self.equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> EngineResult<Expr> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq) => BinaryOp::Eq,
                Some(Tok::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.comparison()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> EngineResult<Expr> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Lt) => BinaryOp::Lt,
                Some(Tok::Le) => BinaryOp::Le,
                Some(Tok::Gt) => BinaryOp::Gt,
                Some(Tok::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> EngineResult<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinaryOp::Add,
                Some(Tok::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> EngineResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinaryOp::Mul,
                Some(Tok::Slash) => BinaryOp::Div,
                Some(Tok::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> EngineResult<Expr> {
        if self.eat(&Tok::Not) {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(&Tok::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> EngineResult<Expr> {
        let Some(tok) = self.advance().cloned() else {
            return Err(self.unexpected("an expression"));
        };

        match tok {
            Tok::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Tok::Float(n) => Ok(Expr::Literal(Value::Float(n))),
            Tok::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Tok::Query(q) => Ok(Expr::Query(q)),
            Tok::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ => Ok(Expr::Bareword(name)),
            },
            Tok::Helper(name) => {
                self.expect(&Tok::LParen, "`(` after helper name")?;
                let mut args = Vec::new();
                if !self.eat(&Tok::RParen) {
                    loop {
                        args.push(self.ternary()?);
                        if self.eat(&Tok::RParen) {
                            break;
                        }
                        self.expect(&Tok::Comma, "`,` between helper arguments")?;
                    }
                }
                Ok(Expr::Call(name, args))
            }
            Tok::LParen => {
                let inner = self.ternary()?;
                self.expect(&Tok::RParen, "closing `)`")?;
                Ok(inner)
            }
            other => Err(EngineError::Expression(format!(
                "expected an expression, found {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::lexer::lex;

    fn parse_str(source: &str) -> Expr {
        parse(&lex(source).unwrap()).unwrap()
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 groups the multiplication first.
        let expr = parse_str("1 + 2 * 3");
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Literal(Value::Int(1))),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Literal(Value::Int(2))),
                    Box::new(Expr::Literal(Value::Int(3))),
                )),
            )
        );
    }

    #[test]
    fn test_ternary_and_call() {
        let expr = parse_str("${a} == 1 ? @upper('x') : 'y'");
        assert!(matches!(expr, Expr::Ternary(..)));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse(&lex("1 2").unwrap()).is_err());
        assert!(parse(&lex("(1").unwrap()).is_err());
    }
}
