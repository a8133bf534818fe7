//! Expansion of filters into evaluable expressions.
//!
//! Expanded filters travel as `field:expression` strings, e.g.
//! `AF:arrayMax(variant.INFO.AF) < 0.2`.

use super::{
    catalog::FieldCatalog,
    codec::{FilterCodec, UNEXPANDED_SEPARATOR},
    schema::{ExpandedFilter, Filter, Operator},
};
use crate::err::Error;

/// Expand one filter into an `ExpandedFilter`.
///
/// The filter is validated against the catalog first.  Numeric values are
/// inserted as-is, all others single-quoted.
pub fn expand_filter(catalog: &FieldCatalog, filter: &Filter) -> Result<ExpandedFilter, Error> {
    let validated = catalog.validate(filter)?;
    let def = catalog.get(&validated.field)?;
    let location = def
        .location
        .as_deref()
        .ok_or_else(|| Error::MissingLocation(def.name.clone()))?;
    let symbol = validated
        .operator
        .jexl_symbol()
        .ok_or_else(|| Error::UnsupportedOperator {
            operator: filter.operator.clone(),
            target: "jexl",
        })?;

    let jexl_expression = if def.is_numeric() {
        format!("{} {} {}", location, symbol, canonical_number(&def.name, &validated.value)?)
    } else {
        format!(
            "{} {} '{}'",
            location,
            symbol,
            validated.value.replace('\\', "\\\\").replace('\'', "\\'")
        )
    };

    Ok(ExpandedFilter {
        field: filter.field.clone(),
        operator: filter.operator.clone(),
        value: filter.value.clone(),
        jexl_expression,
    })
}

/// Write a numeric filter value the way the expression lexer reads it.
///
/// Forms such as `.5`, `+0.5`, `5.` or `1E-1` are accepted by validation
/// but not all of them are expression literals.
fn canonical_number(field: &str, value: &str) -> Result<String, Error> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number.to_string()),
        _ => Err(Error::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "not a number".to_string(),
        }),
    }
}

/// Expand the filter strings of a renderer configuration.
///
/// Strings that are already expanded are passed through.  Unexpanded strings
/// that cannot be decoded or are incomplete are skipped with a warning;
/// catalog validation failures are returned.
pub fn expand_filters(
    catalog: &FieldCatalog,
    filter_strings: &[String],
) -> Result<Vec<ExpandedFilter>, Error> {
    let codec = FilterCodec::new(catalog);
    let mut result = Vec::new();
    for filter_string in filter_strings {
        if is_filter_string_expanded(filter_string) {
            result.push(parse_expanded_filter_string(filter_string)?);
            continue;
        }
        let filter = match codec.decode_unexpanded(filter_string) {
            Ok(filter) if filter.is_complete() => filter,
            Ok(filter) => {
                tracing::warn!("skipping incomplete filter {:?}", &filter);
                continue;
            }
            Err(e) => {
                tracing::warn!("skipping filter string: {}", e);
                continue;
            }
        };
        result.push(expand_filter(catalog, &filter)?);
    }
    Ok(result)
}

/// Whether `s` is an expanded (`field:expression`) rather than an unexpanded
/// (`field:operator:value`) filter string.
pub fn is_filter_string_expanded(s: &str) -> bool {
    let mut tokens = s.split(UNEXPANDED_SEPARATOR);
    match (tokens.next(), tokens.next()) {
        (Some(field), Some(second)) => !field.is_empty() && !Operator::is_token(second),
        _ => false,
    }
}

/// Parse an expanded `field:expression` string.
///
/// Operator and value are not recoverable from the string and left empty.
pub fn parse_expanded_filter_string(s: &str) -> Result<ExpandedFilter, Error> {
    match s.split_once(UNEXPANDED_SEPARATOR) {
        Some((field, expression)) if !field.is_empty() && !expression.trim().is_empty() => {
            Ok(ExpandedFilter {
                field: field.to_string(),
                operator: String::new(),
                value: String::new(),
                jexl_expression: expression.trim().to_string(),
            })
        }
        _ => Err(Error::invalid_filter_string(s, "expected field:expression")),
    }
}

impl ExpandedFilter {
    /// Serialize as `field:expression`.
    pub fn to_filter_string(&self) -> String {
        format!(
            "{}{}{}",
            &self.field, UNEXPANDED_SEPARATOR, &self.jexl_expression
        )
    }
}
