//! A small expression language for expanded info filters.
//!
//! Expanded filters carry expressions such as `arrayMax(variant.INFO.AF) < 0.2`
//! or `variant.INFO.IMPACT == 'HIGH'`.  This module implements the subset of
//! the jexl syntax that these expressions use: property paths, literals,
//! comparisons, boolean connectives, `in` and a handful of array helpers.

mod eval;
mod lexer;
mod parser;

use serde_json::Value;

pub use eval::{truthy, Scope};
pub use parser::{BinaryOp, Expr, UnaryOp, MAX_DEPTH};

/// Error type for parsing and evaluating expressions.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("lexer error at position {pos}: {message}")]
    Lex { pos: usize, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("undefined identifier {0:?}")]
    UndefinedIdentifier(String),
    #[error("missing property {0:?}")]
    MissingProperty(String),
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: String, len: usize },
    #[error("cannot apply {op:?} to {lhs} and {rhs}")]
    TypeMismatch {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("unknown function {0:?}")]
    UnknownFunction(String),
    #[error("invalid argument to {function}: {reason}")]
    InvalidArgument { function: String, reason: String },
}

/// A parsed expression, ready to be evaluated many times.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse `source` into an `Expression`.
    pub fn parse(source: &str) -> Result<Self, Error> {
        Ok(Self {
            source: source.to_string(),
            ast: parser::parse(source)?,
        })
    }

    /// The source text the expression was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression tree.
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluate the expression in `scope`.
    pub fn evaluate<S: Scope + ?Sized>(&self, scope: &S) -> Result<Value, Error> {
        eval::evaluate(&self.ast, scope)
    }

    /// Evaluate the expression and apply truthiness to the result.
    pub fn evaluate_bool<S: Scope + ?Sized>(&self, scope: &S) -> Result<bool, Error> {
        self.evaluate(scope).map(|value| truthy(&value))
    }
}

impl std::str::FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_once_evaluate_many() -> Result<(), anyhow::Error> {
        let expr: Expression = "arrayMax(variant.INFO.AF) < 0.2".parse()?;
        assert_eq!(expr.source(), "arrayMax(variant.INFO.AF) < 0.2");
        assert!(expr.evaluate_bool(&json!({"variant": {"INFO": {"AF": [0.1]}}}))?);
        assert!(!expr.evaluate_bool(&json!({"variant": {"INFO": {"AF": [0.5]}}}))?);
        Ok(())
    }

    #[test]
    fn display_error() {
        let err = Expression::parse("a <").unwrap_err();
        assert_eq!(err.to_string(), "parse error: unexpected end of input");
    }
}
