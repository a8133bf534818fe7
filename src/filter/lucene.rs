//! Translation of filters into Lucene query clauses.

use indexmap::IndexMap;
use itertools::Itertools as _;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use super::schema::Operator;
use crate::err::Error;

/// Half-width of the range used for matching non-integral numbers.
pub const EPSILON: f64 = 0.000001;

lazy_static::lazy_static! {
    static ref SAMPLE_SET_PLACEHOLDER: Regex =
        Regex::new(r"~(.*?)~").expect("invalid regex in source code");
}

/// Parsed numeric operand of `=` and `!=`.
enum Numeric {
    Integer(i64),
    Float(f64),
}

fn parse_numeric(field: &str, value: &str) -> Result<Numeric, Error> {
    let number = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "not a number".to_string(),
        })?;
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Ok(Numeric::Integer(number as i64))
    } else {
        Ok(Numeric::Float(number))
    }
}

/// Split a comma-separated value list, dropping empty items.
fn value_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Build the Lucene clause for `field operator value`.
///
/// Fails with `UnsupportedOperator` for operators outside the query syntax
/// table, including the info-widget operators `lt`, `gt` and `eq`.
pub fn generate_lucene_string(field: &str, operator: &str, value: &str) -> Result<String, Error> {
    let unsupported = || Error::UnsupportedOperator {
        operator: operator.to_string(),
        target: "lucene",
    };
    let op = operator.parse::<Operator>().map_err(|_| unsupported())?;

    let clause = match op {
        Operator::NumEq => match parse_numeric(field, value)? {
            Numeric::Integer(v) => format!("{field}:[{v} TO {v}]"),
            Numeric::Float(v) => format!("{field}:[{} TO {}]", v - EPSILON, v + EPSILON),
        },
        Operator::NumNe => match parse_numeric(field, value)? {
            Numeric::Integer(v) => format!("{field}:[* TO {v}}} OR {field}:{{{v} TO *]"),
            Numeric::Float(v) => format!(
                "{field}:[* TO {}}} OR {field}:{{{} TO *]",
                v - EPSILON,
                v + EPSILON
            ),
        },
        Operator::NumGt => format!("{field}:{{{value} TO *]"),
        Operator::NumGe => format!("{field}:[{value} TO *]"),
        Operator::NumLt => format!("{field}:[* TO {value}}}"),
        Operator::NumLe => format!("{field}:[* TO {value}]"),
        Operator::Equals => format!("{field}:{value}"),
        Operator::DoesNotEqual => format!("*:* -{field}:{value}"),
        Operator::Contains => format!("{field}:*{value}*"),
        Operator::DoesNotContain => format!("*:* -{field}:*{value}*"),
        Operator::StartsWith => format!("{field}:{value}*"),
        Operator::EndsWith => format!("{field}:*{value}"),
        Operator::IsEmpty => format!("*:* -{field}:*"),
        Operator::IsNotEmpty => format!("{field}:*"),
        Operator::InSet => format!("{field}:~{value}~"),
        Operator::VariableInAllOf => value_list(value)
            .into_iter()
            .map(|v| format!("+{field}:{v}"))
            .join(" "),
        Operator::VariableInAnyOf => value_list(value)
            .into_iter()
            .map(|v| format!("{field}:{v}"))
            .join(" OR "),
        Operator::NotVariableInAnyOf => format!(
            "*:* {}",
            value_list(value)
                .into_iter()
                .map(|v| format!("-{field}:{v}"))
                .join(" ")
        ),
        Operator::NotVariableInOneOf => value_list(value)
            .into_iter()
            .map(|v| format!("*:* -{field}:{v}"))
            .join(" OR "),
        Operator::LessThan | Operator::GreaterThan | Operator::Equal => return Err(unsupported()),
    };

    tracing::trace!("{} {} {:?} -> {}", field, operator, value, &clause);
    Ok(clause)
}

/// Replace `~NAME~` placeholders by `(s1 OR s2 ...)` for known sample sets.
///
/// Unknown names are left as they are.
pub fn expand_sample_sets(query: &str, sample_sets: &IndexMap<String, Vec<String>>) -> String {
    SAMPLE_SET_PLACEHOLDER
        .replace_all(query, |caps: &Captures| match sample_sets.get(&caps[1]) {
            Some(samples) if !samples.is_empty() => format!("({})", samples.join(" OR ")),
            _ => {
                tracing::debug!("no sample set named {:?}", &caps[1]);
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Percent-decode `input`, returning it unchanged if it does not decode to
/// valid UTF-8.
pub fn try_url_decode(input: &str) -> String {
    match percent_decode_str(input).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::debug!("could not URL-decode {:?}: {}", input, e);
            input.to_string()
        }
    }
}
