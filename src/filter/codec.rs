//! Conversion between `Filter`s and their string encodings.
//!
//! Two encodings exist.  The legacy "unexpanded" form `field:operator:value`
//! is used for the info filters stored in the track configuration.  Filter
//! lists travel in URLs as a percent-encoded, `&`-joined list of
//! `field,operator,value` segments, or as the sentinel `all`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{catalog::FieldCatalog, lucene::generate_lucene_string, schema::Filter};
use crate::err::Error;

/// Sentinel for "no constraints".
pub const ALL: &str = "all";

/// Separator of the unexpanded (legacy) form.
pub const UNEXPANDED_SEPARATOR: char = ':';
/// Separator of the query form.
pub const QUERY_SEPARATOR: char = ',';
/// Separator between filters in an encoded list.
pub const LIST_SEPARATOR: &str = "&";

/// Characters escaped when encoding; everything but the unreserved set of
/// JavaScript's `encodeURIComponent`.  In particular `+` becomes `%2B`.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `s` like `encodeURIComponent`.
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Normalize a numeric value with a leading `.` to have a leading `0`.
pub fn normalize_numeric_value(value: &str) -> String {
    if let Some(rest) = value.strip_prefix('.') {
        format!("0.{}", rest)
    } else if let Some(rest) = value.strip_prefix("-.") {
        format!("-0.{}", rest)
    } else {
        value.to_string()
    }
}

/// Encoder/decoder for filters, using a catalog for type-dependent rules.
#[derive(Debug, Clone, Copy)]
pub struct FilterCodec<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> FilterCodec<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a FieldCatalog {
        self.catalog
    }

    /// Decode `field:operator:value`.
    ///
    /// Colons beyond the second are kept as part of the value.  Single quotes
    /// around the value, as written for string fields by older versions of
    /// the widget, are removed.  No validation against the catalog happens.
    pub fn decode_unexpanded(&self, s: &str) -> Result<Filter, Error> {
        let mut tokens = s.splitn(3, UNEXPANDED_SEPARATOR);
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(field), Some(operator), Some(value)) => {
                let value = value
                    .strip_prefix('\'')
                    .and_then(|v| v.strip_suffix('\''))
                    .unwrap_or(value);
                Ok(Filter::new(field, operator, value))
            }
            _ => Err(Error::invalid_filter_string(
                s,
                "expected field:operator:value",
            )),
        }
    }

    /// Encode `filter` as `field:operator:value`.
    pub fn encode_unexpanded(&self, filter: &Filter) -> String {
        let value = match self.catalog.get(&filter.field) {
            Ok(def) if def.is_numeric() => normalize_numeric_value(&filter.value),
            _ => filter.value.clone(),
        };
        format!(
            "{}{sep}{}{sep}{}",
            &filter.field,
            &filter.operator,
            &value,
            sep = UNEXPANDED_SEPARATOR
        )
    }

    /// Decode an encoded filter list, dropping malformed segments.
    pub fn decode_filter_list(&self, encoded: &str) -> Vec<Filter> {
        if encoded == ALL {
            return Vec::new();
        }
        let decoded = percent_decode_str(encoded).decode_utf8_lossy();
        decoded
            .split(LIST_SEPARATOR)
            .filter_map(|segment| match decode_segment(segment) {
                Ok(filter) => Some(filter),
                Err(e) => {
                    tracing::warn!("skipping malformed filter segment: {}", e);
                    None
                }
            })
            .filter(|filter| !filter.is_blank())
            .collect()
    }

    /// Decode an encoded filter list, failing on the first malformed segment.
    pub fn decode_filter_list_strict(&self, encoded: &str) -> Result<Vec<Filter>, Error> {
        if encoded == ALL {
            return Ok(Vec::new());
        }
        let decoded = percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|e| Error::invalid_filter_string(encoded, &e.to_string()))?;
        let mut result = Vec::new();
        for segment in decoded.split(LIST_SEPARATOR) {
            let filter = decode_segment(segment)?;
            if filter.is_blank() {
                continue;
            }
            if !filter.is_complete() {
                return Err(Error::invalid_filter_string(segment, "incomplete filter"));
            }
            result.push(filter);
        }
        Ok(result)
    }

    /// Encode `filters` into one URL-safe string.
    ///
    /// With `for_query`, each filter becomes a Lucene clause; otherwise a
    /// `field,operator,value` segment.  Incomplete filters are skipped and
    /// `all` is returned when nothing remains.
    pub fn encode_filter_list(&self, filters: &[Filter], for_query: bool) -> Result<String, Error> {
        let segments = filters
            .iter()
            .filter(|filter| {
                let complete = filter.is_complete();
                if !complete && !filter.is_blank() {
                    tracing::debug!("skipping incomplete filter {:?}", filter);
                }
                complete
            })
            .map(|filter| {
                if for_query {
                    generate_lucene_string(&filter.field, &filter.operator, &filter.value)
                } else {
                    Ok(self.encode_segment(filter))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if segments.is_empty() {
            return Ok(ALL.to_string());
        }
        Ok(percent_encode(&segments.join(LIST_SEPARATOR)))
    }

    /// Encode one list segment; the value is kept verbatim.
    fn encode_segment(&self, filter: &Filter) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            &filter.field,
            &filter.operator,
            &filter.value,
            sep = QUERY_SEPARATOR
        )
    }
}

/// Decode one `field,operator,value` or `field:operator:value` segment.
fn decode_segment(segment: &str) -> Result<Filter, Error> {
    let tokens = segment.split(QUERY_SEPARATOR).collect::<Vec<_>>();
    if tokens.len() >= 3 {
        return Ok(Filter::new(tokens[0], tokens[1], &tokens[2..].join(",")));
    }
    if tokens.len() == 1 {
        let tokens = segment.splitn(3, UNEXPANDED_SEPARATOR).collect::<Vec<_>>();
        if tokens.len() == 3 {
            return Ok(Filter::new(tokens[0], tokens[1], tokens[2]));
        }
    }
    Err(Error::invalid_filter_string(
        segment,
        "expected field,operator,value",
    ))
}
