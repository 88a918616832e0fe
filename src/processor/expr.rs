//! Integer expression evaluator.
//!
//! ```text
//! expr   := term (("+"|"-") term)*
//! term   := factor (("*"|"/") factor)*
//! factor := ("+"|"-")? factor | number | identifier | "(" expr ")"
//! ```
//!
//! Parsing and evaluation happen in one pass; nothing is cached between calls.

use super::ast::Expr;
use super::lexer::{Lexer, Token, is_identifier};
use crate::error::{BlueprintError, ParseError};
use crate::model::{Scope, ScopeValue};

/// Deepest nesting of parentheses and unary signs accepted.
const MAX_NESTING: usize = 64;

pub fn evaluate(expr: &str, scope: &Scope) -> Result<i64, ParseError> {
    let tokens: Vec<Token> = Lexer::new(expr).collect::<Result<_, _>>()?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut p = Evaluator {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        scope,
    };
    let value = p.expr()?;
    if let Some(tok) = p.peek() {
        return Err(ParseError::Trailing(tok.to_string()));
    }
    Ok(value)
}

struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    scope: &'a Scope,
}

impl<'a> Evaluator<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expr(&mut self) -> Result<i64, ParseError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    acc = acc.checked_add(self.term()?).ok_or(ParseError::Overflow)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    acc = acc.checked_sub(self.term()?).ok_or(ParseError::Overflow)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<i64, ParseError> {
        let mut acc = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    acc = acc.checked_mul(self.factor()?).ok_or(ParseError::Overflow)?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    if rhs == 0 {
                        return Err(ParseError::DivisionByZero);
                    }
                    // `/` on integers already truncates toward zero
                    acc = acc.checked_div(rhs).ok_or(ParseError::Overflow)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn factor(&mut self) -> Result<i64, ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::TooDeep(MAX_NESTING));
        }
        let res = self.atom();
        self.depth -= 1;
        res
    }

    fn atom(&mut self) -> Result<i64, ParseError> {
        match self.next() {
            Some(Token::Plus) => self.factor(),
            Some(Token::Minus) => self.factor()?.checked_neg().ok_or(ParseError::Overflow),
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::Ident(name)) => self.lookup(name),
            Some(Token::LParen) => {
                let v = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(v),
                    Some(tok) => Err(ParseError::UnexpectedToken(tok.to_string())),
                    None => Err(ParseError::UnclosedParen),
                }
            }
            Some(tok) => Err(ParseError::UnexpectedToken(tok.to_string())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn lookup(&self, name: &str) -> Result<i64, ParseError> {
        self.scope
            .get(name)
            .ok_or_else(|| ParseError::UnboundVariable(name.to_string()))?
            .to_int(name)
    }
}

/// Evaluate a step field to an integer, tagging failures with `path`.
pub fn eval_int(expr: &Expr, scope: &Scope, path: &str) -> Result<i64, BlueprintError> {
    match expr {
        Expr::Int(n) => Ok(*n),
        Expr::Text(s) => evaluate(s, scope).map_err(|e| BlueprintError::eval(path, s.as_str(), e)),
    }
}

/// Like `eval_int`, for a block coordinate.
pub fn eval_coord(expr: &Expr, scope: &Scope, path: &str) -> Result<i32, BlueprintError> {
    let n = eval_int(expr, scope, path)?;
    i32::try_from(n).map_err(|_| BlueprintError::eval(path, expr.to_string(), ParseError::Overflow))
}

/// Resolve a call argument. Order matters and never fails:
/// integer literal, then a bound identifier passed through as-is, then
/// arithmetic, then the raw text.
pub fn coerce_argument(raw: &Expr, scope: &Scope) -> ScopeValue {
    let text = match raw {
        Expr::Int(n) => return ScopeValue::Int(*n),
        Expr::Text(s) => s,
    };

    let trimmed = text.trim();
    if is_identifier(trimmed) {
        if let Some(bound) = scope.get(trimmed) {
            return bound.clone();
        }
    }

    match evaluate(text, scope) {
        Ok(n) => ScopeValue::Int(n),
        Err(_) => ScopeValue::Text(text.clone()),
    }
}
