//! Error types of the filter model.

use crate::expr;

/// Errors raised by the catalog, codec, query generation and evaluation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The filter references a field that is not in the catalog.
    #[error("Unknown field: {0:?}")]
    UnknownField(String),
    /// A filter string does not have the `field<sep>operator<sep>value` shape
    /// or misses one of its components.
    #[error("Invalid filter string {input:?}: {reason}")]
    InvalidFilterString { input: String, reason: String },
    /// The operator token is not known at all.
    #[error("Invalid operator: {0:?}")]
    InvalidOperator(String),
    /// The operator has no translation in the requested target syntax.
    #[error("Unsupported operator {operator:?} for {target}")]
    UnsupportedOperator {
        operator: String,
        target: &'static str,
    },
    /// The operator is known but not allowed for the field.
    #[error("Operator {operator:?} not allowed for field {field:?}")]
    OperatorNotAllowed { field: String, operator: String },
    /// The value is not valid for the field.
    #[error("Invalid value {value:?} for field {field:?}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    /// The field has no expression location and cannot be expanded.
    #[error("Field {0:?} has no expression location")]
    MissingLocation(String),
    /// Evaluating an expanded expression failed for one feature.
    #[error("Error in filter execution of {expression:?}: {source}")]
    ExpressionEvaluation {
        expression: String,
        #[source]
        source: expr::Error,
    },
}

impl Error {
    /// Shortcut for building an `InvalidFilterString` error.
    pub fn invalid_filter_string(input: &str, reason: &str) -> Self {
        Error::InvalidFilterString {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}
