//! Data structures for representing filters.

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::IntoEnumIterator as _;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Data type of a filterable field.
#[derive(
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Clone,
    Copy,
    Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FieldDataType {
    /// Numeric values, compared with range operators.
    Number,
    /// Categorical or free-text values.
    #[default]
    String,
    /// Multi-valued field such as the samples carrying a variant.
    MultiValued,
}

/// Filter operators and their wire tokens.
///
/// The first three are used by the track info-filter widget; the others by the
/// variant search (Lucene query) front-end.
#[derive(
    SerializeDisplay,
    DeserializeFromStr,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Clone,
    Copy,
)]
pub enum Operator {
    #[strum(serialize = "lt")]
    LessThan,
    #[strum(serialize = "gt")]
    GreaterThan,
    #[strum(serialize = "eq")]
    Equal,

    #[strum(serialize = "=")]
    NumEq,
    #[strum(serialize = "!=")]
    NumNe,
    #[strum(serialize = ">")]
    NumGt,
    #[strum(serialize = ">=")]
    NumGe,
    #[strum(serialize = "<")]
    NumLt,
    #[strum(serialize = "<=")]
    NumLe,

    #[strum(serialize = "equals")]
    Equals,
    #[strum(serialize = "does not equal")]
    DoesNotEqual,
    #[strum(serialize = "contains")]
    Contains,
    #[strum(serialize = "does not contain")]
    DoesNotContain,
    #[strum(serialize = "starts with")]
    StartsWith,
    #[strum(serialize = "ends with")]
    EndsWith,
    #[strum(serialize = "is empty")]
    IsEmpty,
    #[strum(serialize = "is not empty")]
    IsNotEmpty,

    #[strum(serialize = "in set")]
    InSet,
    #[strum(serialize = "variable in all of")]
    VariableInAllOf,
    #[strum(serialize = "variable in any of")]
    VariableInAnyOf,
    #[strum(serialize = "not variable in any of")]
    NotVariableInAnyOf,
    #[strum(serialize = "not variable in one of")]
    NotVariableInOneOf,
}

impl Operator {
    /// The wire token of the operator.
    pub fn token(&self) -> &'static str {
        self.into()
    }

    /// Whether `token` names a known operator.
    pub fn is_token(token: &str) -> bool {
        Operator::iter().any(|op| op.token() == token)
    }

    /// Symbol used in expanded (jexl) expressions, if the operator has one.
    pub fn jexl_symbol(&self) -> Option<&'static str> {
        match self {
            Operator::LessThan => Some("<"),
            Operator::GreaterThan => Some(">"),
            Operator::Equal => Some("=="),
            _ => None,
        }
    }

    /// Whether the operator needs a value; `is empty`/`is not empty` do not.
    pub fn requires_value(&self) -> bool {
        !matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }

    /// Whether the value is a comma-separated list of items.
    pub fn takes_value_list(&self) -> bool {
        matches!(
            self,
            Operator::VariableInAllOf
                | Operator::VariableInAnyOf
                | Operator::NotVariableInAnyOf
                | Operator::NotVariableInOneOf
        )
    }

    /// Default operators for fields of the given data type, in display order.
    pub fn defaults_for(data_type: FieldDataType) -> &'static [Operator] {
        match data_type {
            FieldDataType::Number => &[
                Operator::NumEq,
                Operator::NumNe,
                Operator::NumGt,
                Operator::NumGe,
                Operator::NumLt,
                Operator::NumLe,
            ],
            FieldDataType::String => &[
                Operator::Equals,
                Operator::DoesNotEqual,
                Operator::Contains,
                Operator::DoesNotContain,
                Operator::StartsWith,
                Operator::EndsWith,
                Operator::IsEmpty,
                Operator::IsNotEmpty,
            ],
            FieldDataType::MultiValued => &[
                Operator::InSet,
                Operator::VariableInAllOf,
                Operator::VariableInAnyOf,
                Operator::NotVariableInAnyOf,
                Operator::NotVariableInOneOf,
                Operator::IsEmpty,
                Operator::IsNotEmpty,
            ],
        }
    }
}

/// A single `(field, operator, value)` constraint as entered by the user.
///
/// All three components are kept as strings; typing happens on validation
/// against a `FieldCatalog`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl Filter {
    pub fn new(field: &str, operator: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    /// Whether field, operator and value are all given.  Operators that take
    /// no value (`is empty`, `is not empty`) only need field and operator.
    pub fn is_complete(&self) -> bool {
        if self.field.is_empty() || self.operator.is_empty() {
            return false;
        }
        match self.operator.parse::<Operator>() {
            Ok(op) if !op.requires_value() => true,
            _ => !self.value.is_empty(),
        }
    }

    /// Whether all three components are empty (a placeholder row).
    pub fn is_blank(&self) -> bool {
        self.field.is_empty() && self.operator.is_empty() && self.value.is_empty()
    }
}

/// A `Filter` that has been checked against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFilter {
    pub field: String,
    pub operator: Operator,
    pub value: String,
    pub data_type: FieldDataType,
}

impl From<&ValidatedFilter> for Filter {
    fn from(val: &ValidatedFilter) -> Self {
        Filter {
            field: val.field.clone(),
            operator: val.operator.to_string(),
            value: val.value.clone(),
        }
    }
}

/// A filter together with its evaluable expression.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedFilter {
    pub field: String,
    pub operator: String,
    pub value: String,
    pub jexl_expression: String,
}
