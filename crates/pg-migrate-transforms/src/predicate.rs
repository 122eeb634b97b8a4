//! Typmod predicates: a tiny boolean language over `precision` and `scale`.
//!
//! Rules use predicates to decide whether they apply to a column, e.g.
//! `precision <= 18 and scale = 0`. An expression is parsed (or deserialized)
//! into a [`TypmodExpr`] tree, checked, and compiled once into a
//! [`TypmodPredicate`] closure that is then evaluated for every candidate
//! column.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := and ( ("or" | "||") and )*
//! and     := unary ( ("and" | "&&") unary )*
//! unary   := ("not" | "!") unary | primary
//! primary := "(" expr ")" | "true" | "false" | operand cmp operand
//! operand := "precision" | "scale" | ["-"] integer
//! cmp     := "<" | "<=" | ">" | ">=" | "=" | "==" | "!=" | "<>"
//! ```
//!
//! Keywords and field names are case-insensitive.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TransformError};
use crate::typmod::Typmod;

/// A typmod component a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Precision,
    Scale,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("precision") {
            Some(Field::Precision)
        } else if name.eq_ignore_ascii_case("scale") {
            Some(Field::Scale)
        } else {
            None
        }
    }

    fn read(self, typmod: &Typmod) -> i64 {
        match self {
            Field::Precision => i64::from(typmod.precision),
            Field::Scale => i64::from(typmod.scale),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Precision => f.write_str("precision"),
            Field::Scale => f.write_str("scale"),
        }
    }
}

/// Comparison operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Field(Field),
    Literal(i64),
}

impl Operand {
    fn eval(self, typmod: &Typmod) -> i64 {
        match self {
            Operand::Field(field) => field.read(typmod),
            Operand::Literal(n) => n,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(field) => fmt::Display::fmt(field, f),
            Operand::Literal(n) => write!(f, "{}", n),
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CmpOp {
    fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
        }
    }
}

/// Predicate expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypmodExpr {
    Compare(Operand, CmpOp, Operand),
    And(Vec<TypmodExpr>),
    Or(Vec<TypmodExpr>),
    Not(Box<TypmodExpr>),
    Const(bool),
}

impl TypmodExpr {
    /// Parse the textual form.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            text,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_or()?;
        if let Some(tok) = parser.peek() {
            return Err(parser.error(&format!("unexpected {}", tok)));
        }
        Ok(expr)
    }

    /// Evaluate the tree directly.
    pub fn eval(&self, typmod: &Typmod) -> bool {
        match self {
            TypmodExpr::Compare(lhs, op, rhs) => op.apply(lhs.eval(typmod), rhs.eval(typmod)),
            TypmodExpr::And(terms) => terms.iter().all(|t| t.eval(typmod)),
            TypmodExpr::Or(terms) => terms.iter().any(|t| t.eval(typmod)),
            TypmodExpr::Not(inner) => !inner.eval(typmod),
            TypmodExpr::Const(b) => *b,
        }
    }

    /// Check structural validity: boolean nodes need at least one term.
    pub fn validate(&self) -> Result<()> {
        match self {
            TypmodExpr::And(terms) | TypmodExpr::Or(terms) => {
                if terms.is_empty() {
                    return Err(TransformError::Config(format!(
                        "Typmod predicate has an empty boolean node: {}",
                        self
                    )));
                }
                terms.iter().try_for_each(TypmodExpr::validate)
            }
            TypmodExpr::Not(inner) => inner.validate(),
            TypmodExpr::Compare(..) | TypmodExpr::Const(_) => Ok(()),
        }
    }

    /// Compile into a reusable predicate.
    pub fn compile(&self) -> Result<TypmodPredicate> {
        self.validate()?;
        let func = build(self);
        debug!("Compiled typmod predicate: {}", self);
        Ok(TypmodPredicate {
            expr: Arc::new(self.clone()),
            func,
        })
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, terms: &[TypmodExpr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", term)?;
    }
    f.write_str(")")
}

impl fmt::Display for TypmodExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypmodExpr::Compare(lhs, op, rhs) => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            TypmodExpr::And(terms) => write_joined(f, terms, "and"),
            TypmodExpr::Or(terms) => write_joined(f, terms, "or"),
            TypmodExpr::Not(inner) => write!(f, "not ({})", inner),
            TypmodExpr::Const(b) => write!(f, "{}", b),
        }
    }
}

type PredicateFn = dyn Fn(&Typmod) -> bool + Send + Sync;

fn build(expr: &TypmodExpr) -> Arc<PredicateFn> {
    match expr {
        TypmodExpr::Compare(lhs, op, rhs) => {
            let (lhs, op, rhs) = (*lhs, *op, *rhs);
            Arc::new(move |t: &Typmod| op.apply(lhs.eval(t), rhs.eval(t)))
        }
        TypmodExpr::And(terms) => {
            let terms: Vec<_> = terms.iter().map(build).collect();
            Arc::new(move |t: &Typmod| terms.iter().all(|p| p(t)))
        }
        TypmodExpr::Or(terms) => {
            let terms: Vec<_> = terms.iter().map(build).collect();
            Arc::new(move |t: &Typmod| terms.iter().any(|p| p(t)))
        }
        TypmodExpr::Not(inner) => {
            let inner = build(inner);
            Arc::new(move |t: &Typmod| !inner(t))
        }
        TypmodExpr::Const(b) => {
            let b = *b;
            Arc::new(move |_: &Typmod| b)
        }
    }
}

/// Compiled typmod predicate. Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct TypmodPredicate {
    expr: Arc<TypmodExpr>,
    func: Arc<PredicateFn>,
}

impl TypmodPredicate {
    /// Parse and compile the textual form in one step.
    pub fn compile_str(text: &str) -> Result<Self> {
        TypmodExpr::parse(text)?.compile()
    }

    pub fn matches(&self, typmod: &Typmod) -> bool {
        (self.func)(typmod)
    }

    /// The expression this predicate was compiled from.
    pub fn expr(&self) -> &TypmodExpr {
        &self.expr
    }
}

impl fmt::Debug for TypmodPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypmodPredicate")
            .field(&self.expr.to_string())
            .finish()
    }
}

impl fmt::Display for TypmodPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Cmp(CmpOp),
    And,
    Or,
    Not,
    Minus,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Int(n) => write!(f, "integer {}", n),
            Token::Cmp(op) => write!(f, "'{}'", op.symbol()),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::Not => f.write_str("'not'"),
            Token::Minus => f.write_str("'-'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let err = |msg: String| {
        TransformError::Config(format!("Invalid typmod predicate '{}': {}", text, msg))
    };

    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '<' | '>' | '=' | '!' => {
                let (tok, len) = match (c, next) {
                    ('<', Some('=')) => (Token::Cmp(CmpOp::Le), 2),
                    ('<', Some('>')) => (Token::Cmp(CmpOp::Ne), 2),
                    ('<', _) => (Token::Cmp(CmpOp::Lt), 1),
                    ('>', Some('=')) => (Token::Cmp(CmpOp::Ge), 2),
                    ('>', _) => (Token::Cmp(CmpOp::Gt), 1),
                    ('=', Some('=')) => (Token::Cmp(CmpOp::Eq), 2),
                    ('=', _) => (Token::Cmp(CmpOp::Eq), 1),
                    ('!', Some('=')) => (Token::Cmp(CmpOp::Ne), 2),
                    _ => (Token::Not, 1),
                };
                tokens.push(tok);
                i += len;
            }
            '&' | '|' => {
                if next != Some(c) {
                    return Err(err(format!("expected '{c}{c}' at offset {i}")));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
                i += 2;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                let n = digits
                    .parse::<i64>()
                    .map_err(|_| err(format!("integer {} out of range", digits)))?;
                tokens.push(Token::Int(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(err(format!(
                    "unexpected character '{}' at offset {}",
                    other, i
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> TransformError {
        TransformError::Config(format!("Invalid typmod predicate '{}': {}", self.text, msg))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<TypmodExpr> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            TypmodExpr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> Result<TypmodExpr> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat(&Token::And) {
            terms.push(self.parse_unary()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            TypmodExpr::And(terms)
        })
    }

    fn parse_unary(&mut self) -> Result<TypmodExpr> {
        if self.eat(&Token::Not) {
            return Ok(TypmodExpr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<TypmodExpr> {
        if self.eat(&Token::LParen) {
            let inner = self.parse_or()?;
            if !self.eat(&Token::RParen) {
                return Err(self.error("missing ')'"));
            }
            return Ok(inner);
        }

        if let Some(Token::Ident(word)) = self.peek() {
            if word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false") {
                let b = word.eq_ignore_ascii_case("true");
                self.pos += 1;
                return Ok(TypmodExpr::Const(b));
            }
        }

        let lhs = self.parse_operand()?;
        let op = match self.next() {
            Some(Token::Cmp(op)) => op,
            Some(tok) => return Err(self.error(&format!("expected comparison, found {}", tok))),
            None => return Err(self.error("expected comparison, found end of input")),
        };
        let rhs = self.parse_operand()?;
        Ok(TypmodExpr::Compare(lhs, op, rhs))
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        match self.next() {
            Some(Token::Ident(name)) => match Field::from_name(&name) {
                Some(field) => Ok(Operand::Field(field)),
                None => Err(self.error(&format!(
                    "unknown identifier '{}', only precision and scale are allowed",
                    name
                ))),
            },
            Some(Token::Int(n)) => Ok(Operand::Literal(n)),
            Some(Token::Minus) => match self.next() {
                Some(Token::Int(n)) => Ok(Operand::Literal(-n)),
                _ => Err(self.error("expected integer after '-'")),
            },
            Some(tok) => Err(self.error(&format!("expected operand, found {}", tok))),
            None => Err(self.error("expected operand, found end of input")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str, precision: i32, scale: i32) -> bool {
        TypmodPredicate::compile_str(text)
            .unwrap()
            .matches(&Typmod::new(precision, scale))
    }

    #[test]
    fn test_precision_less_than() {
        let pred = TypmodPredicate::compile_str("precision < 10").unwrap();
        assert!(pred.matches(&Typmod::new(5, 0)));
        assert!(!pred.matches(&Typmod::new(10, 2)));
    }

    #[test]
    fn test_scale_defaults_to_zero() {
        let pred = TypmodPredicate::compile_str("scale = 0").unwrap();
        assert!(pred.matches(&Typmod::precision(12)));
    }

    #[test]
    fn test_boolean_operators() {
        assert!(check("precision <= 18 and scale = 0", 18, 0));
        assert!(!check("precision <= 18 and scale = 0", 18, 2));
        assert!(check("precision > 38 or scale > 10", 10, 11));
        assert!(check("not (precision >= 10)", 9, 0));
        assert!(check("!(scale != 0) && precision == 4", 4, 0));
        assert!(check("precision = 1 || precision <> 1", 7, 0));
    }

    #[test]
    fn test_precedence() {
        // and binds tighter than or
        assert!(check("precision = 1 or precision = 2 and scale = 5", 1, 0));
        assert!(!check("(precision = 1 or precision = 2) and scale = 5", 1, 0));
    }

    #[test]
    fn test_literal_on_either_side() {
        assert!(check("10 > precision", 3, 0));
        assert!(check("scale >= -1", 0, 0));
    }

    #[test]
    fn test_constants() {
        assert!(check("true", 1, 0));
        assert!(!check("FALSE", 1, 0));
    }

    #[test]
    fn test_unknown_identifier_is_config_error() {
        let err = TypmodPredicate::compile_str("length < 10").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("length"));
    }

    #[test]
    fn test_malformed_expressions() {
        let cases = [
            "",
            "precision <",
            "precision 10",
            "(precision < 10",
            "precision < 10)",
            "a & b",
            "precision ~ 1",
        ];
        for text in cases {
            assert!(
                TypmodPredicate::compile_str(text).unwrap_err().is_config(),
                "{:?} should not compile",
                text
            );
        }
    }

    #[test]
    fn test_tree_from_yaml() {
        let expr: TypmodExpr = serde_yaml::from_str(
            "and:\n  - compare: [precision, \"<=\", 18]\n  - compare: [scale, \"=\", 0]\n",
        )
        .unwrap();
        let pred = expr.compile().unwrap();
        assert!(pred.matches(&Typmod::new(10, 0)));
        assert!(!pred.matches(&Typmod::new(10, 1)));
    }

    #[test]
    fn test_empty_boolean_node_rejected() {
        assert!(TypmodExpr::And(vec![]).compile().unwrap_err().is_config());
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let expr = TypmodExpr::parse("precision < 10 and not scale = 2").unwrap();
        assert_eq!(TypmodExpr::parse(&expr.to_string()).unwrap(), expr);
    }
}
