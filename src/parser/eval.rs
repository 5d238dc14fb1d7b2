//! Safe arithmetic evaluator.
//!
//! Expressions are tokenized and parsed into an [`Expr`] tree whose only node
//! kinds are numeric literals, unary negation and the binary operators
//! `+ - * / ^` (`**` is accepted as a spelling of `^`). Nothing else can be
//! represented, so nothing else can be evaluated.
//!
//! Integer arithmetic is exact and checked; division always produces a float,
//! as does a negative integer exponent. The final value is truncated toward
//! zero.

use crate::error::ParseError;

/// Parenthesis nesting limit.
const MAX_DEPTH: usize = 64;

/// A value during evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }

    fn numeric_eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }

    /// Truncate toward zero into the engine's integer type.
    pub fn truncate(self) -> Result<i64, ParseError> {
        match self {
            Number::Int(v) => i64::try_from(v).map_err(|_| ParseError::Overflow),
            Number::Float(v) if !v.is_finite() => Err(ParseError::NotFinite),
            Number::Float(v) => {
                let t = v.trunc();
                if t < i64::MIN as f64 || t >= i64::MAX as f64 {
                    Err(ParseError::Overflow)
                } else {
                    Ok(t as i64)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Arithmetic syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Number),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn eval(&self) -> Result<Number, ParseError> {
        match self {
            Expr::Literal(n) => Ok(*n),
            Expr::Neg(inner) => match inner.eval()? {
                Number::Int(v) => v.checked_neg().map(Number::Int).ok_or(ParseError::Overflow),
                Number::Float(v) => Ok(Number::Float(-v)),
            },
            Expr::Binary { op, lhs, rhs } => apply(*op, lhs.eval()?, rhs.eval()?),
        }
    }
}

fn apply(op: BinOp, lhs: Number, rhs: Number) -> Result<Number, ParseError> {
    use Number::{Float, Int};

    let result = match (op, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => Int(a.checked_add(b).ok_or(ParseError::Overflow)?),
        (BinOp::Sub, Int(a), Int(b)) => Int(a.checked_sub(b).ok_or(ParseError::Overflow)?),
        (BinOp::Mul, Int(a), Int(b)) => Int(a.checked_mul(b).ok_or(ParseError::Overflow)?),
        (BinOp::Add, a, b) => Float(a.as_f64() + b.as_f64()),
        (BinOp::Sub, a, b) => Float(a.as_f64() - b.as_f64()),
        (BinOp::Mul, a, b) => Float(a.as_f64() * b.as_f64()),
        (BinOp::Div, _, b) if b.is_zero() => return Err(ParseError::DivisionByZero),
        (BinOp::Div, a, b) => Float(a.as_f64() / b.as_f64()),
        (BinOp::Pow, Int(a), Int(b)) if b >= 0 => {
            let exp = u32::try_from(b).map_err(|_| ParseError::Overflow)?;
            Int(a.checked_pow(exp).ok_or(ParseError::Overflow)?)
        }
        (BinOp::Pow, a, b) if a.is_zero() && b.as_f64() < 0.0 => {
            return Err(ParseError::DivisionByZero);
        }
        (BinOp::Pow, a, b) => Float(a.as_f64().powf(b.as_f64())),
    };

    match result {
        Float(v) if !v.is_finite() => Err(ParseError::NotFinite),
        other => Ok(other),
    }
}

/// Evaluate a whitelisted expression. An expression containing `=` is an
/// equation: both sides are evaluated independently and must be equal, and
/// the shared value is returned.
pub fn evaluate(expr: &str) -> Result<i64, ParseError> {
    match expr.split_once('=') {
        Some((left, right)) => {
            if right.contains('=') {
                return Err(ParseError::Syntax("more than one '='".into()));
            }
            let lhs = parse(left)?.eval()?;
            let rhs = parse(right)?.eval()?;
            if !lhs.numeric_eq(rhs) {
                return Err(ParseError::UnequalSides);
            }
            rhs.truncate()
        }
        None => parse(expr)?.eval()?.truncate(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Num(parse_literal(&literal)?));
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '+' | '-' | '/' | '^' | '(' | ')' => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '/' => Token::Slash,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            other => return Err(ParseError::ForbiddenChar(other)),
        }
    }

    Ok(tokens)
}

fn parse_literal(literal: &str) -> Result<Number, ParseError> {
    if !literal.contains('.') {
        return literal
            .parse::<i128>()
            .map(Number::Int)
            .map_err(|_| ParseError::Overflow);
    }
    if literal == "." || literal.matches('.').count() > 1 {
        return Err(ParseError::Syntax(format!("invalid number '{literal}'")));
    }
    literal
        .parse::<f64>()
        .map(Number::Float)
        .map_err(|_| ParseError::Syntax(format!("invalid number '{literal}'")))
}

/// Parse one side of an expression into a tree.
pub fn parse(expr: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ParseError::Syntax("empty expression".into()));
    }
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let tree = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::Syntax("unexpected trailing input".into()));
    }
    Ok(tree)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.factor()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    // factor := ('-' | '+') factor | power
    fn factor(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.nested(Self::factor)?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::factor)
            }
            _ => self.power(),
        }
    }

    // power := atom ('^' factor)?   -- right associative, binds tighter than unary minus on its left
    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::factor)?;
            return Ok(binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    // atom := NUMBER | '(' expr ')'
    fn atom(&mut self) -> Result<Expr, ParseError> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(Expr::Literal(n)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseError::Syntax("unclosed '('".into())),
                }
            }
            Some(tok) => Err(ParseError::Syntax(format!("unexpected {tok:?}"))),
            None => Err(ParseError::Syntax("unexpected end of expression".into())),
        }
    }

    fn nested(&mut self, rule: fn(&mut Self) -> Result<Expr, ParseError>) -> Result<Expr, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::Syntax("expression nested too deeply".into()));
        }
        let result = rule(self);
        self.depth -= 1;
        result
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(evaluate("3+4*2"), Ok(11));
        assert_eq!(evaluate("(3+4)*2"), Ok(14));
        assert_eq!(evaluate("10-4-3"), Ok(3));
        assert_eq!(evaluate("2**3**2"), Ok(512));
        assert_eq!(evaluate("2^10"), Ok(1024));
        assert_eq!(evaluate("-2^2"), Ok(-4));
        assert_eq!(evaluate("2^-1*4"), Ok(2));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(evaluate("7/2"), Ok(3));
        assert_eq!(evaluate("-7/2"), Ok(-3));
        assert_eq!(evaluate("2.5*2"), Ok(5));
    }

    #[test]
    fn equations() {
        assert_eq!(evaluate("5=2+3"), Ok(5));
        assert_eq!(evaluate("5=2+4"), Err(ParseError::UnequalSides));
        assert_eq!(evaluate("6/2=3"), Ok(3));
        assert!(matches!(evaluate("1=1=1"), Err(ParseError::Syntax(_))));
        assert!(matches!(evaluate("=3"), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn arithmetic_faults_fail_closed() {
        assert_eq!(evaluate("1/0"), Err(ParseError::DivisionByZero));
        assert_eq!(evaluate("0^-1"), Err(ParseError::DivisionByZero));
        assert_eq!(evaluate("10**100"), Err(ParseError::Overflow));
        assert_eq!(evaluate("9^9^9"), Err(ParseError::Overflow));
    }

    #[test]
    fn anything_outside_the_operator_set_is_rejected() {
        assert_eq!(evaluate("abs(1)"), Err(ParseError::ForbiddenChar('a')));
        assert_eq!(evaluate("1%2"), Err(ParseError::ForbiddenChar('%')));
        assert_eq!(evaluate("1&2"), Err(ParseError::ForbiddenChar('&')));
        assert!(matches!(evaluate("2+"), Err(ParseError::Syntax(_))));
        assert!(matches!(evaluate("(2"), Err(ParseError::Syntax(_))));
        assert!(matches!(evaluate("1..2"), Err(ParseError::Syntax(_))));
        assert!(matches!(evaluate("3 4"), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let expr = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(matches!(evaluate(&expr), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn tree_only_contains_arithmetic_nodes() {
        let tree = parse("-(1+2)").unwrap();
        assert_eq!(
            tree,
            Expr::Neg(Box::new(binary(
                BinOp::Add,
                Expr::Literal(Number::Int(1)),
                Expr::Literal(Number::Int(2)),
            )))
        );
    }
}
