//! Feature records and their normalized view.
//!
//! Features arrive in two shapes depending on the adapter that produced them:
//! the variant lives either below `variant` or below `data`, and per-sample
//! data lives below `SAMPLES` or `samples`.  `FeatureView` hides this.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::expr::Scope;

/// Name of the INFO entry holding the precomputed samples with a variant call.
pub const VARIABLE_SAMPLES_KEY: &str = "_variableSamples";

/// One feature (variant record) as produced by the data adapter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Feature(pub Value);

impl Feature {
    pub fn view(&self) -> FeatureView<'_> {
        FeatureView::new(&self.0)
    }
}

impl From<Value> for Feature {
    fn from(val: Value) -> Self {
        Feature(val)
    }
}

/// Borrowed, shape-independent view on a feature.
#[derive(Debug, Clone, Copy)]
pub struct FeatureView<'a> {
    record: &'a Value,
    info: Option<&'a Map<String, Value>>,
    samples: Option<&'a Map<String, Value>>,
}

impl<'a> FeatureView<'a> {
    pub fn new(feature: &'a Value) -> Self {
        let record = ["variant", "data"]
            .iter()
            .find_map(|key| feature.get(key).filter(|value| value.is_object()))
            .unwrap_or(feature);
        let info = record.get("INFO").and_then(Value::as_object);
        let samples = ["SAMPLES", "samples"]
            .iter()
            .find_map(|key| record.get(key).and_then(Value::as_object));
        Self {
            record,
            info,
            samples,
        }
    }

    /// The variant record itself.
    pub fn record(&self) -> &'a Value {
        self.record
    }

    /// The INFO map, if any.
    pub fn info(&self) -> Option<&'a Map<String, Value>> {
        self.info
    }

    /// The per-sample map, if any.
    pub fn samples(&self) -> Option<&'a Map<String, Value>> {
        self.samples
    }

    /// Whether the feature carries any per-sample data.
    pub fn has_samples(&self) -> bool {
        self.samples.map(|s| !s.is_empty()).unwrap_or(false)
    }

    /// The precomputed list of samples with a variant call, if present.
    ///
    /// Accepts a JSON array of strings or a comma-separated string.
    pub fn variable_samples(&self) -> Option<Vec<&'a str>> {
        match self.info?.get(VARIABLE_SAMPLES_KEY)? {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            Value::String(s) => Some(s.split(',').filter(|s| !s.is_empty()).collect()),
            _ => None,
        }
    }

    /// The genotype strings (`GT`) of `sample_id`; empty if unknown.
    pub fn genotypes(&self, sample_id: &str) -> Vec<&'a str> {
        match self
            .samples
            .and_then(|samples| samples.get(sample_id))
            .and_then(|sample| sample.get("GT"))
        {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(gt)) => vec![gt.as_str()],
            _ => Vec::new(),
        }
    }
}

/// Both `variant` and `data` resolve to the variant record, so expressions
/// written against either shape evaluate on both.
impl Scope for FeatureView<'_> {
    fn resolve(&self, name: &str) -> Option<&Value> {
        match name {
            "variant" | "data" => Some(self.record),
            _ => self.record.get(name),
        }
    }
}
