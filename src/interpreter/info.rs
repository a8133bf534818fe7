use crate::{
    err::Error,
    expr::{self, Expression},
    feature::FeatureView,
    filter::ExpandedFilter,
};

/// An expanded filter with its expression parsed once up front.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    /// The expanded filter.
    pub filter: ExpandedFilter,
    /// The parsed expression or the error from parsing it.
    expression: Result<Expression, expr::Error>,
}

impl CompiledFilter {
    pub fn new(filter: ExpandedFilter) -> Self {
        let expression = Expression::parse(&filter.jexl_expression);
        if let Err(e) = &expression {
            tracing::warn!("cannot parse {:?}: {}", &filter.jexl_expression, e);
        }
        Self { filter, expression }
    }

    /// Evaluate the filter expression on one feature.
    pub fn evaluate(&self, view: &FeatureView) -> Result<bool, Error> {
        self.expression
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|expression| expression.evaluate_bool(view))
            .map_err(|source| Error::ExpressionEvaluation {
                expression: self.filter.jexl_expression.clone(),
                source,
            })
    }
}

impl From<ExpandedFilter> for CompiledFilter {
    fn from(filter: ExpandedFilter) -> Self {
        Self::new(filter)
    }
}

/// Determine whether the feature passes all info filters.
///
/// A filter that cannot be evaluated on the feature counts as passing.
pub fn passes(filters: &[CompiledFilter], view: &FeatureView) -> bool {
    for filter in filters {
        match filter.evaluate(view) {
            Ok(true) => (),
            Ok(false) => {
                tracing::trace!("{:?} -> false", &filter.filter.jexl_expression);
                return false;
            }
            Err(e) => tracing::error!("{}", e),
        }
    }
    true
}

/// Like `passes()` but returns the first evaluation error.
pub fn passes_strict(filters: &[CompiledFilter], view: &FeatureView) -> Result<bool, Error> {
    for filter in filters {
        if !filter.evaluate(view)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use serde_json::{json, Value};
    use tracing_test::traced_test;

    use super::*;

    fn compiled(expressions: &[&str]) -> Vec<CompiledFilter> {
        expressions
            .iter()
            .map(|expression| {
                CompiledFilter::new(ExpandedFilter {
                    field: "X".into(),
                    jexl_expression: expression.to_string(),
                    ..Default::default()
                })
            })
            .collect()
    }

    #[rstest]
    #[case(json!([0.1]), "HIGH", true)]
    #[case(json!([0.5]), "HIGH", false)]
    #[case(json!([0.1]), "LOW", false)]
    #[case(json!([0.5, 0.1]), "HIGH", false)]
    fn passes_and_semantics(#[case] af: Value, #[case] impact: &str, #[case] expected: bool) {
        let filters = compiled(&[
            "arrayMax(variant.INFO.AF) < 0.2",
            "variant.INFO.IMPACT == 'HIGH'",
        ]);
        let value = json!({"variant": {"INFO": {"AF": af, "IMPACT": impact}}});
        let view = FeatureView::new(&value);
        assert_eq!(passes(&filters, &view), expected);
        assert_eq!(passes_strict(&filters, &view), Ok(expected));
    }

    #[test]
    fn empty_filters_pass() {
        let value = json!({"variant": {"INFO": {}}});
        assert!(passes(&[], &FeatureView::new(&value)));
    }

    #[traced_test]
    #[test]
    fn missing_field_fails_open() {
        let filters = compiled(&["arrayMax(variant.INFO.CADD_PH) > 20"]);
        let value = json!({"variant": {"INFO": {"AF": [0.1]}}});
        let view = FeatureView::new(&value);

        assert!(passes(&filters, &view));
        assert!(logs_contain("Error in filter execution"));

        assert!(matches!(
            passes_strict(&filters, &view),
            Err(Error::ExpressionEvaluation { .. })
        ));
    }

    #[test]
    fn deeply_nested_expression_fails_open() {
        let expression = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let filters = compiled(&[expression.as_str()]);
        let value = json!({"variant": {"INFO": {"AF": [0.9]}}});
        let view = FeatureView::new(&value);
        assert!(passes(&filters, &view));
        assert!(matches!(
            passes_strict(&filters, &view),
            Err(Error::ExpressionEvaluation {
                source: expr::Error::Parse(_),
                ..
            })
        ));
    }

    #[test]
    fn unparsable_expression_fails_open() {
        let filters = compiled(&["variant.INFO.AF <"]);
        let value = json!({"variant": {"INFO": {"AF": [0.1]}}});
        let view = FeatureView::new(&value);
        assert!(passes(&filters, &view));
        assert!(passes_strict(&filters, &view).is_err());
    }
}
