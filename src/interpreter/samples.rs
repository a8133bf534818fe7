use crate::feature::FeatureView;

/// Genotype strings that do not count as a variant call.
const NON_VARIANT_GENOTYPES: &[&str] = &["./.", ".|.", "0/0", "0|0"];

/// Whether the genotype string `gt` is a called, non-reference genotype.
pub fn is_variant(gt: &str) -> bool {
    !NON_VARIANT_GENOTYPES.contains(&gt)
}

/// Determine whether the feature is variable in any of `sample_ids`.
///
/// An empty allowlist passes.  The precomputed `_variableSamples` list is
/// used when present, otherwise the genotypes are scanned.
pub fn passes(sample_ids: &[String], view: &FeatureView) -> bool {
    if sample_ids.is_empty() {
        return true;
    }

    if let Some(variable_samples) = view.variable_samples() {
        let res = sample_ids
            .iter()
            .any(|sample_id| variable_samples.contains(&sample_id.as_str()));
        tracing::trace!("precomputed variable samples {:?} -> {}", &variable_samples, res);
        return res;
    }

    tracing::warn!("re-computing variant samples; _variableSamples should be precomputed");
    if !view.has_samples() {
        tracing::trace!("feature has no sample data");
        return false;
    }
    sample_ids.iter().any(|sample_id| {
        view.genotypes(sample_id)
            .into_iter()
            .any(is_variant)
    })
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use serde_json::json;
    use tracing_test::traced_test;

    use crate::feature::FeatureView;

    #[rstest]
    #[case("0/1", true)]
    #[case("1/1", true)]
    #[case("1|0", true)]
    #[case("./.", false)]
    #[case(".|.", false)]
    #[case("0/0", false)]
    #[case("0|0", false)]
    fn is_variant(#[case] gt: &str, #[case] expected: bool) {
        assert_eq!(super::is_variant(gt), expected);
    }

    #[rstest]
    #[case(vec![], true)]
    #[case(vec!["s1"], true)]
    #[case(vec!["s2"], false)]
    #[case(vec!["s2", "s1"], true)]
    #[case(vec!["s3"], false)]
    fn passes_genotype_scan(#[case] sample_ids: Vec<&str>, #[case] expected: bool) {
        let value = json!({
            "variant": {
                "INFO": {},
                "SAMPLES": {"s1": {"GT": ["0/1"]}, "s2": {"GT": ["0/0"]}}
            }
        });
        let sample_ids = sample_ids.into_iter().map(String::from).collect::<Vec<_>>();
        assert_eq!(super::passes(&sample_ids, &FeatureView::new(&value)), expected);
    }

    #[traced_test]
    #[test]
    fn fallback_logs_warning() {
        let value = json!({"variant": {"SAMPLES": {"s1": {"GT": ["0/1"]}}}});
        assert!(super::passes(&["s1".to_string()], &FeatureView::new(&value)));
        assert!(logs_contain("re-computing variant samples"));
    }

    #[test]
    fn precomputed_takes_precedence() {
        let value = json!({
            "variant": {
                "INFO": {"_variableSamples": ["s9"]},
                "SAMPLES": {"s9": {"GT": ["0/0"]}}
            }
        });
        let view = FeatureView::new(&value);
        assert!(super::passes(&["s9".to_string()], &view));
        assert!(!super::passes(&["s1".to_string()], &view));
    }

    #[test]
    fn no_sample_data_fails() {
        let value = json!({"variant": {"INFO": {}}});
        assert!(!super::passes(&["s1".to_string()], &FeatureView::new(&value)));
        let value = json!({"variant": {"INFO": {}, "samples": {}}});
        assert!(!super::passes(&["s1".to_string()], &FeatureView::new(&value)));
    }
}
