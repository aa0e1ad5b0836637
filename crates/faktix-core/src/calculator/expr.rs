//! # Arithmetic Expressions
//!
//! A small recursive-descent parser for calculator formulas. Formulas are
//! free text written by users or the AI assistant, so the grammar admits
//! nothing but arithmetic:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := NUMBER | FIELD | '(' expr ')'
//!
//! NUMBER  := digits with at most one '.'      (12, 12.5, .5)
//! FIELD   := a whole word naming an input field of the schema
//! ```
//!
//! Any other character is rejected while tokenizing. A word that is not a
//! field (`alert`, `Math.pow`, `constructor`) is rejected while evaluating.
//! There is no call syntax at all.

use std::collections::HashMap;
use std::fmt;

use crate::error::FormulaError;

/// Longest formula accepted, in characters.
pub const MAX_EXPRESSION_LEN: usize = 1024;

/// Deepest nesting of parentheses and unary signs.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Field name → numeric value.
pub type Bindings = HashMap<String, f64>;

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    token: Token,
    /// Character offset in the formula.
    position: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Turns a maximal word into a number or a field reference.
fn classify_word(word: String) -> Result<Token, FormulaError> {
    let starts_numeric = word.starts_with(|c: char| c.is_ascii_digit() || c == '.');

    if starts_numeric {
        let well_formed = word.chars().all(|c| c.is_ascii_digit() || c == '.')
            && word.matches('.').count() <= 1
            && word != ".";
        return match word.parse::<f64>() {
            Ok(n) if well_formed => Ok(Token::Number(n)),
            _ => Err(FormulaError::InvalidNumber(word)),
        };
    }

    // member access such as Math.pow
    if word.contains('.') {
        return Err(FormulaError::UnknownIdentifier(word));
    }

    Ok(Token::Ident(word))
}

fn tokenize(src: &str) -> Result<Vec<Spanned>, FormulaError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let position = i;

        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if is_word_char(c) => {
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[position..i].iter().collect();
                tokens.push(Spanned {
                    token: classify_word(word)?,
                    position,
                });
                continue;
            }
            other => {
                return Err(FormulaError::DisallowedCharacter { ch: other, position });
            }
        };

        tokens.push(Spanned { token, position });
        i += 1;
    }

    Ok(tokens)
}

// =============================================================================
// Syntax Tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Field(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluates against field values.
    ///
    /// Fails on fields missing from `bindings`, on division by zero and on
    /// any non-finite intermediate value.
    pub fn eval(&self, bindings: &Bindings) -> Result<f64, FormulaError> {
        let value = match self {
            Expr::Number(n) => *n,
            Expr::Field(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| FormulaError::UnknownIdentifier(name.clone()))?,
            Expr::Neg(inner) => -inner.eval(bindings)?,
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval(bindings)?;
                let rhs = rhs.eval(bindings)?;
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div if rhs == 0.0 => return Err(FormulaError::DivisionByZero),
                    BinaryOp::Div => lhs / rhs,
                }
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn unexpected(&self) -> FormulaError {
        match self.tokens.get(self.pos) {
            Some(s) => FormulaError::UnexpectedToken {
                found: s.token.to_string(),
                position: s.position,
            },
            None => FormulaError::UnexpectedEnd,
        }
    }

    fn descend(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::TooDeep { max: MAX_NESTING_DEPTH });
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        let negate = match self.peek() {
            Some(Token::Minus) => true,
            Some(Token::Plus) => false,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        self.descend()?;
        let inner = self.parse_unary()?;
        self.ascend();

        Ok(if negate { Expr::Neg(Box::new(inner)) } else { inner })
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let expr = match self.peek() {
            Some(Token::Number(n)) => Expr::Number(*n),
            Some(Token::Ident(name)) => Expr::Field(name.clone()),
            Some(Token::LParen) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.parse_expr()?;
                self.ascend();
                if self.peek() != Some(&Token::RParen) {
                    return Err(self.unexpected());
                }
                inner
            }
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        Ok(expr)
    }
}

/// Parses a formula.
///
/// ## Example
/// ```rust
/// use faktix_core::calculator::expr::{parse, Bindings};
///
/// let expr = parse("(a + b) * 1.1").unwrap();
/// let bindings = Bindings::from([("a".to_string(), 2.0), ("b".to_string(), 3.0)]);
/// assert!((expr.eval(&bindings).unwrap() - 5.5).abs() < 1e-9);
///
/// assert!(parse("alert(1)").is_err());
/// ```
pub fn parse(src: &str) -> Result<Expr, FormulaError> {
    let len = src.chars().count();
    if len > MAX_EXPRESSION_LEN {
        return Err(FormulaError::TooLong {
            len,
            max: MAX_EXPRESSION_LEN,
        });
    }

    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    if parser.pos < tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

/// Parses and evaluates in one step.
pub fn evaluate(src: &str, bindings: &Bindings) -> Result<f64, FormulaError> {
    parse(src)?.eval(bindings)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, f64)]) -> Bindings {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn eval(src: &str) -> Result<f64, FormulaError> {
        evaluate(src, &bindings(&[("m", 12.5), ("sirka", 2.0), ("vyska_m", 3.0)]))
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(eval("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(eval("16 / 4 / 2").unwrap(), 2.0);
        assert_eq!(eval("2 * -3").unwrap(), -6.0);
        assert_eq!(eval("--2").unwrap(), 2.0);
        assert_eq!(eval("+.5 + 5.").unwrap(), 5.5);
    }

    #[test]
    fn test_fields_are_whole_words() {
        assert_eq!(eval("m * 4").unwrap(), 50.0);
        assert_eq!(eval("sirka*vyska_m").unwrap(), 6.0);
        assert_eq!(
            eval("m2 * 4"),
            Err(FormulaError::UnknownIdentifier("m2".to_string()))
        );
        assert_eq!(eval("2m"), Err(FormulaError::InvalidNumber("2m".to_string())));
    }

    #[test]
    fn test_rejects_code() {
        // a call is a name followed by a stray parenthesis
        assert_eq!(
            eval("alert(1)"),
            Err(FormulaError::UnexpectedToken {
                found: "(".to_string(),
                position: 5
            })
        );
        assert_eq!(
            eval("alert"),
            Err(FormulaError::UnknownIdentifier("alert".to_string()))
        );
        assert_eq!(
            eval("Math.pow(m, 2)"),
            Err(FormulaError::UnknownIdentifier("Math.pow".to_string()))
        );
        assert_eq!(
            eval("m; process.exit()"),
            Err(FormulaError::DisallowedCharacter { ch: ';', position: 1 })
        );
        assert!(matches!(eval("m ** 2"), Err(FormulaError::UnexpectedToken { .. })));
        assert!(matches!(eval("`m`"), Err(FormulaError::DisallowedCharacter { ch: '`', .. })));
        assert!(matches!(eval("m % 2"), Err(FormulaError::DisallowedCharacter { ch: '%', .. })));
        assert!(matches!(eval("1e3"), Err(FormulaError::InvalidNumber(_))));
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(eval(""), Err(FormulaError::Empty));
        assert_eq!(eval("   "), Err(FormulaError::Empty));
        assert_eq!(eval("(m + 1"), Err(FormulaError::UnexpectedEnd));
        assert_eq!(eval("m +"), Err(FormulaError::UnexpectedEnd));
        assert_eq!(
            eval("m 4"),
            Err(FormulaError::UnexpectedToken {
                found: "4".to_string(),
                position: 2
            })
        );
        assert!(matches!(eval("1..2"), Err(FormulaError::InvalidNumber(_))));
        assert!(matches!(eval("()"), Err(FormulaError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_arithmetic_failures() {
        assert_eq!(eval("m / 0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("m / (sirka - 2)"), Err(FormulaError::DivisionByZero));

        let huge = bindings(&[("x", 1e200)]);
        assert_eq!(evaluate("x * x", &huge), Err(FormulaError::NonFinite));
        // overflow is caught where it happens, not hidden by a later division
        assert_eq!(evaluate("1 / (x * x)", &huge), Err(FormulaError::NonFinite));
    }

    #[test]
    fn test_limits() {
        let deep = format!("{}1{}", "(".repeat(MAX_NESTING_DEPTH + 1), ")".repeat(MAX_NESTING_DEPTH + 1));
        assert_eq!(eval(&deep), Err(FormulaError::TooDeep { max: MAX_NESTING_DEPTH }));

        let ok = format!("{}1{}", "(".repeat(MAX_NESTING_DEPTH), ")".repeat(MAX_NESTING_DEPTH));
        assert_eq!(eval(&ok).unwrap(), 1.0);

        let long = "1+".repeat(MAX_EXPRESSION_LEN) + "1";
        assert!(matches!(eval(&long), Err(FormulaError::TooLong { .. })));
    }
}
