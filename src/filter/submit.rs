//! Strict validation of filter rows at submission time.
//!
//! This is the only place where incomplete filters are an error; everywhere
//! else they are skipped.

use super::{
    catalog::FieldCatalog,
    codec::FilterCodec,
    schema::{Filter, Operator, ValidatedFilter},
};
use crate::err::Error;

/// The inputs of one filter row that need the user's attention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightedInputs {
    pub field: bool,
    pub operator: bool,
    pub value: bool,
}

impl HighlightedInputs {
    /// Compute the highlights for `filter`.
    pub fn of(filter: &Filter) -> Self {
        let value_required = filter
            .operator
            .parse::<Operator>()
            .map(|op| op.requires_value())
            .unwrap_or(true);
        Self {
            field: filter.field.is_empty(),
            operator: filter.operator.is_empty(),
            value: value_required && filter.value.is_empty(),
        }
    }

    pub fn any(&self) -> bool {
        self.field || self.operator || self.value
    }
}

/// Error type for `validate_submission()`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    /// Rows with missing inputs, by row index.
    #[error(
        "One or more filters is not complete. Either fill out all fields or use the 'x' \
         buttons to remove invalid filters"
    )]
    Incomplete { rows: Vec<(usize, HighlightedInputs)> },
    /// A complete row that the catalog rejects.
    #[error("Invalid filter in row {row}: {source}")]
    Invalid {
        row: usize,
        #[source]
        source: Error,
    },
}

/// Validate the rows of a filter form before submitting them.
///
/// A form consisting of a single blank row means "no filters".  Otherwise
/// every row must be complete and valid for the catalog.
pub fn validate_submission(
    catalog: &FieldCatalog,
    filters: &[Filter],
) -> Result<Vec<ValidatedFilter>, SubmissionError> {
    if filters.len() == 1 && filters[0].is_blank() {
        return Ok(Vec::new());
    }

    let rows = filters
        .iter()
        .map(HighlightedInputs::of)
        .enumerate()
        .filter(|(_, highlighted)| highlighted.any())
        .collect::<Vec<_>>();
    if !rows.is_empty() {
        tracing::debug!("incomplete filter rows: {:?}", &rows);
        return Err(SubmissionError::Incomplete { rows });
    }

    filters
        .iter()
        .enumerate()
        .map(|(row, filter)| {
            catalog
                .validate(filter)
                .map_err(|source| SubmissionError::Invalid { row, source })
        })
        .collect()
}

/// Validate unexpanded `field:operator:value` strings, as stored by the track
/// info-filter widget, before submitting them.
pub fn validate_submission_strings(
    catalog: &FieldCatalog,
    filter_strings: &[String],
) -> Result<Vec<ValidatedFilter>, SubmissionError> {
    let codec = FilterCodec::new(catalog);
    let mut filters = Vec::with_capacity(filter_strings.len());
    let mut rows = Vec::new();
    for (row, filter_string) in filter_strings.iter().enumerate() {
        match codec.decode_unexpanded(filter_string) {
            Ok(filter) => filters.push(filter),
            Err(_) => rows.push((
                row,
                HighlightedInputs {
                    field: false,
                    operator: true,
                    value: true,
                },
            )),
        }
    }
    if !rows.is_empty() {
        return Err(SubmissionError::Incomplete { rows });
    }
    if filters.is_empty() {
        return Ok(Vec::new());
    }
    validate_submission(catalog, &filters)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn single_blank_row_is_no_filter() -> Result<(), anyhow::Error> {
        let catalog = FieldCatalog::search_fields();
        assert_eq!(validate_submission(&catalog, &[Filter::default()])?, vec![]);
        assert_eq!(validate_submission(&catalog, &[])?, vec![]);
        Ok(())
    }

    #[test]
    fn incomplete_rows_are_highlighted() {
        let catalog = FieldCatalog::search_fields();
        let filters = vec![
            Filter::new("start", ">=", "100"),
            Filter::new("contig", "", ""),
            Filter::new("alt", "is empty", ""),
            Filter::default(),
        ];
        assert_eq!(
            validate_submission(&catalog, &filters),
            Err(SubmissionError::Incomplete {
                rows: vec![
                    (
                        1,
                        HighlightedInputs {
                            field: false,
                            operator: true,
                            value: true
                        }
                    ),
                    (
                        3,
                        HighlightedInputs {
                            field: true,
                            operator: true,
                            value: true
                        }
                    ),
                ]
            })
        );
    }

    #[test]
    fn invalid_row_is_reported() {
        let catalog = FieldCatalog::search_fields();
        let filters = vec![
            Filter::new("start", ">=", "100"),
            Filter::new("start", "contains", "1"),
        ];
        assert_eq!(
            validate_submission(&catalog, &filters),
            Err(SubmissionError::Invalid {
                row: 1,
                source: Error::OperatorNotAllowed {
                    field: "start".into(),
                    operator: "contains".into()
                }
            })
        );
    }

    #[test]
    fn valid_rows() -> Result<(), anyhow::Error> {
        let catalog = FieldCatalog::search_fields();
        let validated = validate_submission(
            &catalog,
            &[
                Filter::new("start", ">=", "100"),
                Filter::new("alt", "is not empty", ""),
            ],
        )?;
        assert_eq!(validated.len(), 2);
        assert_eq!(validated[1].operator, Operator::IsNotEmpty);
        Ok(())
    }

    #[test]
    fn strings() -> Result<(), anyhow::Error> {
        let catalog = FieldCatalog::info_fields();
        assert_eq!(
            validate_submission_strings(&catalog, &["AF:lt:0.1".to_string()])?.len(),
            1
        );
        assert!(matches!(
            validate_submission_strings(&catalog, &["AF:lt".to_string()]),
            Err(SubmissionError::Incomplete { .. })
        ));
        assert!(matches!(
            validate_submission_strings(&catalog, &["AF:lt:".to_string()]),
            Err(SubmissionError::Incomplete { .. })
        ));
        Ok(())
    }

    #[test]
    fn message() {
        let err = SubmissionError::Incomplete { rows: vec![] };
        assert!(err.to_string().starts_with("One or more filters is not complete"));
    }
}
