//! Apply expanded info filters and a sample allowlist to `Feature` records.

pub mod info;
pub mod samples;

use crate::{
    config::RendererConfig,
    err::Error,
    feature::Feature,
    filter::{expand_filters, ExpandedFilter, FieldCatalog},
};

pub use info::CompiledFilter;

/// Hold data structures that support the interpretation of one set of
/// filters to multiple `Feature` records.
#[derive(Debug, Default, Clone)]
pub struct FilterInterpreter {
    /// The info filters with their parsed expressions.
    pub info_filters: Vec<CompiledFilter>,
    /// Allowlist of sample identifiers; empty for no sample filter.
    pub sample_ids: Vec<String>,
}

/// Result type for `FilterInterpreter::passes()`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassesResult {
    /// Whether all info filters pass.
    pub pass_info: bool,
    /// Whether the sample filter passes.
    pub pass_samples: bool,
    /// Whether the feature passes overall.
    pub pass_all: bool,
}

impl PassesResult {
    fn new(pass_info: bool, pass_samples: bool) -> Self {
        Self {
            pass_info,
            pass_samples,
            pass_all: pass_info && pass_samples,
        }
    }
}

impl FilterInterpreter {
    /// Construct new `FilterInterpreter` with the given filters.
    pub fn new(info_filters: Vec<ExpandedFilter>, sample_ids: Vec<String>) -> Self {
        FilterInterpreter {
            info_filters: info_filters.into_iter().map(CompiledFilter::new).collect(),
            sample_ids,
        }
    }

    /// Construct from a renderer configuration, expanding unexpanded filter
    /// strings against `catalog`.
    pub fn from_renderer_config(
        catalog: &FieldCatalog,
        config: &RendererConfig,
    ) -> Result<Self, Error> {
        let info_filters = expand_filters(catalog, &config.info_filters)?;
        tracing::debug!(
            "{} info filter(s), samples {:?}",
            info_filters.len(),
            &config.active_samples
        );
        Ok(Self::new(info_filters, config.sample_ids()))
    }

    /// Determine whether the `Feature` passes all criteria.
    ///
    /// Evaluation errors of info filters are logged and ignored.
    pub fn passes(&self, feature: &Feature) -> PassesResult {
        let view = feature.view();
        let pass_info = info::passes(&self.info_filters, &view);
        let pass_samples = samples::passes(&self.sample_ids, &view);
        PassesResult::new(pass_info, pass_samples)
    }

    /// Like `passes()` but fails on the first evaluation error.
    pub fn passes_strict(&self, feature: &Feature) -> Result<PassesResult, Error> {
        let view = feature.view();
        let pass_info = info::passes_strict(&self.info_filters, &view)?;
        let pass_samples = samples::passes(&self.sample_ids, &view);
        Ok(PassesResult::new(pass_info, pass_samples))
    }
}

/// Determine whether `feature` passes all `filters`, ignoring evaluation errors.
pub fn passes_info_filters(feature: &Feature, filters: &[ExpandedFilter]) -> bool {
    let compiled = filters.iter().cloned().map(CompiledFilter::new).collect::<Vec<_>>();
    info::passes(&compiled, &feature.view())
}

/// Determine whether `feature` passes all `filters`, returning evaluation errors.
pub fn passes_info_filters_strict(
    feature: &Feature,
    filters: &[ExpandedFilter],
) -> Result<bool, Error> {
    let compiled = filters.iter().cloned().map(CompiledFilter::new).collect::<Vec<_>>();
    info::passes_strict(&compiled, &feature.view())
}

/// Determine whether `feature` is variable in any of `sample_ids`.
pub fn passes_sample_filters(feature: &Feature, sample_ids: &[String]) -> bool {
    samples::passes(sample_ids, &feature.view())
}
