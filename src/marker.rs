//! Environment marker expressions
//!
//! Dependencies may be gated by a small boolean expression language, e.g.
//! `python_version < "3.7"` or `extra == 'full'`. Expressions are parsed by
//! a recursive-descent parser into a tree and evaluated against a
//! [`MarkerContext`]. Unknown variables evaluate to the empty string so a
//! partial environment degrades to "does not match" instead of erroring.
//!
//! # Examples
//!
//! ```
//! use picopip::marker::{Marker, MarkerContext};
//!
//! let marker: Marker = "extra == 'full' or python_version >= '3.99'".parse().unwrap();
//! let ctx = MarkerContext::default();
//! assert!(!marker.evaluate(&ctx));
//! assert!(marker.evaluate(&ctx.with_extra("full")));
//! ```

use crate::version::{Specifier, Version};
use crate::{Error, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// Variable bindings a marker is evaluated against.
///
/// `extra` is bound separately because the transaction re-evaluates each
/// dependency once per requested extra.
#[derive(Debug, Clone, Default)]
pub struct MarkerContext {
    values: HashMap<String, String>,
    extra: Option<String>,
}

impl MarkerContext {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self {
            values,
            extra: None,
        }
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    /// A copy of this context with `extra` bound.
    pub fn with_extra(&self, extra: &str) -> Self {
        Self {
            values: self.values.clone(),
            extra: Some(extra.to_string()),
        }
    }

    fn get(&self, name: &str) -> String {
        if name == "extra" {
            return self.extra.clone().unwrap_or_default();
        }
        self.values.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Variable(String),
    Literal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Compatible,
    In,
    NotIn,
}

/// A parsed marker expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    And(Box<Marker>, Box<Marker>),
    Or(Box<Marker>, Box<Marker>),
    Compare { lhs: Value, op: CmpOp, rhs: Value },
}

impl Marker {
    /// Evaluate the expression against a context.
    ///
    /// Comparisons are version-aware: when both sides parse as versions
    /// they compare numerically, otherwise lexicographically.
    pub fn evaluate(&self, ctx: &MarkerContext) -> bool {
        match self {
            Marker::And(a, b) => a.evaluate(ctx) && b.evaluate(ctx),
            Marker::Or(a, b) => a.evaluate(ctx) || b.evaluate(ctx),
            Marker::Compare { lhs, op, rhs } => {
                let left = resolve(lhs, ctx);
                let right = resolve(rhs, ctx);
                compare(&left, *op, &right)
            }
        }
    }
}

fn resolve(value: &Value, ctx: &MarkerContext) -> String {
    match value {
        Value::Variable(name) => ctx.get(name),
        Value::Literal(s) => s.clone(),
    }
}

fn compare(left: &str, op: CmpOp, right: &str) -> bool {
    match op {
        CmpOp::In => right.contains(left),
        CmpOp::NotIn => !right.contains(left),
        CmpOp::Compatible => {
            match (right.parse::<Version>(), left.parse::<Version>()) {
                (Ok(version), Ok(v)) => Specifier {
                    op: crate::version::Op::Compatible,
                    version,
                }
                .matches(&v),
                _ => false,
            }
        }
        _ => {
            if let (Ok(a), Ok(b)) = (left.parse::<Version>(), right.parse::<Version>()) {
                let ord = a.cmp(&b);
                match op {
                    CmpOp::Eq => ord.is_eq(),
                    CmpOp::Ne => ord.is_ne(),
                    CmpOp::Lt => ord.is_lt(),
                    CmpOp::Le => ord.is_le(),
                    CmpOp::Gt => ord.is_gt(),
                    CmpOp::Ge => ord.is_ge(),
                    _ => unreachable!(),
                }
            } else {
                match op {
                    CmpOp::Eq => left == right,
                    CmpOp::Ne => left != right,
                    CmpOp::Lt => left < right,
                    CmpOp::Le => left <= right,
                    CmpOp::Gt => left > right,
                    CmpOp::Ge => left >= right,
                    _ => unreachable!(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Literal(String),
    Op(CmpOp),
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => s.push(ch),
                        None => return Err(Error::InvalidMarker(input.to_string())),
                    }
                }
                tokens.push(Token::Literal(s));
            }
            '=' | '!' | '<' | '>' | '~' => {
                chars.next();
                let two = chars.peek() == Some(&'=');
                let op = match (c, two) {
                    ('=', true) => CmpOp::Eq,
                    ('!', true) => CmpOp::Ne,
                    ('<', true) => CmpOp::Le,
                    ('>', true) => CmpOp::Ge,
                    ('~', true) => CmpOp::Compatible,
                    ('<', false) => CmpOp::Lt,
                    ('>', false) => CmpOp::Gt,
                    _ => return Err(Error::InvalidMarker(input.to_string())),
                };
                if two {
                    chars.next();
                }
                tokens.push(Token::Op(op));
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                        word.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    _ => Token::Ident(word),
                });
            }
            _ => return Err(Error::InvalidMarker(input.to_string())),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn error(&self) -> Error {
        Error::InvalidMarker(self.input.to_string())
    }

    // marker := and_expr ( 'or' and_expr )*
    fn marker(&mut self) -> Result<Marker> {
        let mut node = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let rhs = self.and_expr()?;
            node = Marker::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // and_expr := atom ( 'and' atom )*
    fn and_expr(&mut self) -> Result<Marker> {
        let mut node = self.atom()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let rhs = self.atom()?;
            node = Marker::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // atom := '(' marker ')' | value op value
    fn atom(&mut self) -> Result<Marker> {
        if self.peek() == Some(&Token::LParen) {
            self.next();
            let node = self.marker()?;
            if self.next() != Some(&Token::RParen) {
                return Err(self.error());
            }
            return Ok(node);
        }
        let lhs = self.value()?;
        let op = match self.next() {
            Some(Token::Op(op)) => *op,
            Some(Token::In) => CmpOp::In,
            Some(Token::Not) => {
                if self.next() != Some(&Token::In) {
                    return Err(self.error());
                }
                CmpOp::NotIn
            }
            _ => return Err(self.error()),
        };
        let rhs = self.value()?;
        Ok(Marker::Compare { lhs, op, rhs })
    }

    fn value(&mut self) -> Result<Value> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(Value::Variable(name.clone())),
            Some(Token::Literal(s)) => Ok(Value::Literal(s.clone())),
            _ => Err(self.error()),
        }
    }
}

impl FromStr for Marker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            input: s,
        };
        let marker = parser.marker()?;
        if parser.pos != tokens.len() {
            return Err(parser.error());
        }
        Ok(marker)
    }
}
