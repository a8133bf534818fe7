//! Registry of filterable fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::{FieldDataType, Filter, Operator, ValidatedFilter};
use crate::err::Error;

/// Definition of one filterable field.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field name, as used in `Filter::field`.
    pub name: String,
    /// Display label.
    pub title: String,
    /// Longer description, e.g., from the VCF header.
    #[serde(default)]
    pub description: Option<String>,
    /// Type of the values.
    #[serde(default)]
    pub data_type: FieldDataType,
    /// Explicit operator list; derived from `data_type` when not given.
    #[serde(default)]
    pub operators: Option<Vec<Operator>>,
    /// Allowed values for categorical fields.
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Expression fragment accessing the field's value on a feature, e.g.,
    /// `arrayMax(variant.INFO.AF)`.
    #[serde(default)]
    pub location: Option<String>,
    /// Whether the field is hidden from field pickers.
    #[serde(default)]
    pub hidden: bool,
}

impl FieldDefinition {
    pub fn new(name: &str, title: &str, data_type: FieldDataType) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            data_type,
            ..Default::default()
        }
    }

    pub fn with_operators(mut self, operators: &[Operator]) -> Self {
        self.operators = Some(operators.to_vec());
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// The operators valid for this field, in display order.
    pub fn operators(&self) -> &[Operator] {
        match self.operators.as_ref() {
            Some(operators) => operators,
            None => Operator::defaults_for(self.data_type),
        }
    }

    /// Whether values of this field are numbers.
    pub fn is_numeric(&self) -> bool {
        self.data_type == FieldDataType::Number
    }

    /// Check `value` against the field's type and options.
    fn check_value(&self, operator: Operator, value: &str) -> Result<(), Error> {
        let invalid = |reason: &str| Error::InvalidValue {
            field: self.name.clone(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        if value.is_empty() {
            return Err(invalid("missing value"));
        }
        match self.data_type {
            FieldDataType::Number => match value.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(()),
                _ => Err(invalid("not a number")),
            },
            FieldDataType::String => match self.options.as_ref() {
                Some(options) if !options.iter().any(|option| option == value) => {
                    Err(invalid("not one of the allowed values"))
                }
                _ => Ok(()),
            },
            FieldDataType::MultiValued => {
                if operator.takes_value_list() && value.split(',').any(|v| v.trim().is_empty()) {
                    Err(invalid("empty item in value list"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Immutable registry of `FieldDefinition`s, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldCatalog {
    fields: IndexMap<String, FieldDefinition>,
}

impl FieldCatalog {
    /// Construct from definitions; later definitions replace earlier ones
    /// with the same name.
    pub fn new<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = FieldDefinition>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
        }
    }

    /// Catalog of the genome track info-filter widget.
    pub fn info_fields() -> Self {
        let ops = &[
            Operator::LessThan,
            Operator::GreaterThan,
            Operator::Equal,
        ];
        Self::new([
            FieldDefinition::new("AF", "Allele Frequency", FieldDataType::Number)
                .with_operators(ops)
                .with_location("arrayMax(variant.INFO.AF)"),
            FieldDefinition::new("AC", "Allele Count", FieldDataType::Number)
                .with_operators(ops)
                .with_location("arrayMax(variant.INFO.AC)"),
            FieldDefinition::new("CADD_PH", "CADD Functional Prediction Score", FieldDataType::Number)
                .with_operators(ops)
                .with_location("arrayMax(variant.INFO.CADD_PH)"),
            FieldDefinition::new("IMPACT", "Predicted Impact", FieldDataType::String)
                .with_operators(&[Operator::Equal])
                .with_options(&["HIGH", "MODERATE", "LOW", "MODIFIER"])
                .with_location("variant.INFO.IMPACT"),
        ])
    }

    /// Catalog of the fields always present in a variant search index.
    pub fn search_fields() -> Self {
        Self::new([
            FieldDefinition::new("contig", "Chromosome", FieldDataType::String)
                .with_description("This is the chromosome/contig"),
            FieldDefinition::new("start", "Start", FieldDataType::Number)
                .with_description("The start position of this variant"),
            FieldDefinition::new("ref", "Ref Allele", FieldDataType::String)
                .with_description("The reference allele"),
            FieldDefinition::new("end", "End", FieldDataType::Number)
                .with_description("The end position of this variant"),
            FieldDefinition::new("alt", "Alt Allele", FieldDataType::String)
                .with_description("The alternate allele"),
            FieldDefinition::new("genomicPosition", "Genomic Position", FieldDataType::Number)
                .hidden(true),
            FieldDefinition::new(
                "variableSamples",
                "Samples With Variant",
                FieldDataType::MultiValued,
            )
            .with_description("All samples with this variant"),
        ])
    }

    /// Load a catalog from a JSON array of `FieldDefinition`s.
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, anyhow::Error> {
        let fields: Vec<FieldDefinition> = serde_json::from_reader(reader)?;
        Ok(Self::new(fields))
    }

    /// Build a catalog from the search index's indexed-fields document.
    pub fn from_indexed_fields(doc: &IndexedFields) -> Self {
        let mut descriptors = doc.fields.iter().collect::<Vec<_>>();
        descriptors.sort_by(|a, b| a.order_key.cmp(&b.order_key).then(a.name.cmp(&b.name)));
        Self::new(descriptors.into_iter().map(FieldDefinition::from))
    }

    /// Look up the definition of `name`.
    pub fn get(&self, name: &str) -> Result<&FieldDefinition, Error> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// The operators allowed for `name`.
    pub fn operators_for(&self, name: &str) -> Result<&[Operator], Error> {
        Ok(self.get(name)?.operators())
    }

    /// Iterate over all definitions in catalog order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    /// Iterate over the definitions that are not hidden.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values().filter(|field| !field.hidden)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check `filter` against the catalog.
    ///
    /// The field must exist, the operator must be allowed for it and the value
    /// must match the field's type.  The value of operators that take no value
    /// is dropped.
    pub fn validate(&self, filter: &Filter) -> Result<ValidatedFilter, Error> {
        let def = self.get(&filter.field)?;
        let operator = filter
            .operator
            .parse::<Operator>()
            .map_err(|_| Error::InvalidOperator(filter.operator.clone()))?;
        if !def.operators().contains(&operator) {
            return Err(Error::OperatorNotAllowed {
                field: filter.field.clone(),
                operator: filter.operator.clone(),
            });
        }
        let value = if operator.requires_value() {
            def.check_value(operator, &filter.value)?;
            filter.value.clone()
        } else {
            String::new()
        };
        Ok(ValidatedFilter {
            field: filter.field.clone(),
            operator,
            value,
            data_type: def.data_type,
        })
    }

    /// Validate all `filters`, failing on the first invalid one.
    pub fn validate_all(&self, filters: &[Filter]) -> Result<Vec<ValidatedFilter>, Error> {
        filters.iter().map(|filter| self.validate(filter)).collect()
    }
}

/// The document returned by the search index's indexed-fields endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct IndexedFields {
    pub fields: Vec<IndexedFieldDescriptor>,
}

/// One field descriptor of an `IndexedFields` document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IndexedFieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// VCF header line type (`Integer`, `Float`, `Flag`, `Character`, `String`).
    #[serde(default, rename = "type")]
    pub vcf_type: Option<String>,
    #[serde(default)]
    pub is_multi_valued: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub allowable_values: Option<Vec<String>>,
    #[serde(default)]
    pub order_key: Option<i32>,
}

impl From<&IndexedFieldDescriptor> for FieldDefinition {
    fn from(val: &IndexedFieldDescriptor) -> Self {
        let options = val
            .allowable_values
            .as_ref()
            .filter(|values| !values.is_empty())
            .cloned();
        let data_type = match val.vcf_type.as_deref() {
            Some("Integer") | Some("Float") => FieldDataType::Number,
            _ if val.is_multi_valued && options.is_none() => FieldDataType::MultiValued,
            _ => FieldDataType::String,
        };
        FieldDefinition {
            name: val.name.clone(),
            title: val.label.clone().unwrap_or_else(|| val.name.clone()),
            description: val.description.clone().filter(|d| !d.is_empty()),
            data_type,
            operators: None,
            options,
            location: None,
            hidden: val.is_hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn get_unknown_field() {
        let catalog = FieldCatalog::info_fields();
        assert_eq!(
            catalog.get("XYZ").unwrap_err(),
            Error::UnknownField("XYZ".to_string())
        );
    }

    #[test]
    fn operators_for_explicit_and_derived() -> Result<(), anyhow::Error> {
        let info = FieldCatalog::info_fields();
        assert_eq!(
            info.operators_for("AF")?,
            &[Operator::LessThan, Operator::GreaterThan, Operator::Equal]
        );
        assert_eq!(info.operators_for("IMPACT")?, &[Operator::Equal]);

        let search = FieldCatalog::search_fields();
        assert_eq!(
            search.operators_for("start")?,
            Operator::defaults_for(FieldDataType::Number)
        );
        assert_eq!(
            search.operators_for("contig")?,
            Operator::defaults_for(FieldDataType::String)
        );
        assert_eq!(search.operators_for("variableSamples")?[0], Operator::InSet);
        Ok(())
    }

    #[test]
    fn visible_fields_skips_hidden() {
        let search = FieldCatalog::search_fields();
        assert_eq!(search.len(), 7);
        assert!(search.visible_fields().all(|f| f.name != "genomicPosition"));
        assert_eq!(search.visible_fields().count(), 6);
    }

    #[rstest::rstest]
    #[case::numeric(Filter::new("AF", "lt", "0.2"))]
    #[case::numeric_leading_dot(Filter::new("AF", "gt", ".5"))]
    #[case::categorical(Filter::new("IMPACT", "eq", "HIGH"))]
    fn validate_ok(#[case] filter: Filter) -> Result<(), anyhow::Error> {
        let validated = FieldCatalog::info_fields().validate(&filter)?;
        assert_eq!(Filter::from(&validated), filter);
        Ok(())
    }

    #[test]
    fn validate_operator_not_allowed() {
        let err = FieldCatalog::info_fields()
            .validate(&Filter::new("AF", "contains", "0.1"))
            .unwrap_err();
        assert_eq!(
            err,
            Error::OperatorNotAllowed {
                field: "AF".into(),
                operator: "contains".into()
            }
        );
    }

    #[rstest::rstest]
    #[case::unknown_field(Filter::new("XX", "lt", "1"), "UnknownField")]
    #[case::unknown_operator(Filter::new("AF", "approx", "1"), "InvalidOperator")]
    #[case::not_a_number(Filter::new("AF", "lt", "abc"), "InvalidValue")]
    #[case::infinite(Filter::new("AF", "lt", "inf"), "InvalidValue")]
    #[case::missing_value(Filter::new("AF", "lt", ""), "InvalidValue")]
    #[case::not_an_option(Filter::new("IMPACT", "eq", "SEVERE"), "InvalidValue")]
    fn validate_errors(#[case] filter: Filter, #[case] expected: &str) {
        let err = FieldCatalog::info_fields().validate(&filter).unwrap_err();
        assert!(format!("{:?}", err).starts_with(expected), "{:?}", err);
    }

    #[test]
    fn validate_value_less_operator_drops_value() -> Result<(), anyhow::Error> {
        let validated =
            FieldCatalog::search_fields().validate(&Filter::new("alt", "is empty", "x"))?;
        assert_eq!(validated.operator, Operator::IsEmpty);
        assert_eq!(validated.value, "");
        Ok(())
    }

    #[test]
    fn validate_value_list() {
        let search = FieldCatalog::search_fields();
        assert!(search
            .validate(&Filter::new("variableSamples", "variable in any of", "s1,s2"))
            .is_ok());
        assert!(search
            .validate(&Filter::new("variableSamples", "variable in any of", "s1,,s2"))
            .is_err());
    }

    #[test]
    fn from_json_reader() -> Result<(), anyhow::Error> {
        let json = r#"[
            {"name": "DP", "title": "Depth", "dataType": "number", "location": "variant.INFO.DP",
             "operators": ["lt", "gt"]},
            {"name": "FILTER", "title": "Filter", "options": ["PASS", "LowQual"]}
        ]"#;
        let catalog = FieldCatalog::from_json_reader(json.as_bytes())?;
        assert_eq!(catalog.len(), 2);
        let dp = catalog.get("DP")?;
        assert!(dp.is_numeric());
        assert_eq!(dp.operators(), &[Operator::LessThan, Operator::GreaterThan]);
        let filter = catalog.get("FILTER")?;
        assert_eq!(filter.data_type, FieldDataType::String);
        assert_eq!(filter.options.as_ref().map(|o| o.len()), Some(2));
        Ok(())
    }

    #[test]
    fn from_indexed_fields() -> Result<(), anyhow::Error> {
        let json = r#"{"fields": [
            {"name": "variableSamples", "label": "Samples With Variant", "type": "Character",
             "isMultiValued": true, "orderKey": 7},
            {"name": "start", "label": "Start", "type": "Integer", "orderKey": 2},
            {"name": "CLN_SIG", "type": "String", "allowableValues": ["Benign", "Pathogenic"],
             "isMultiValued": true, "orderKey": 8, "description": ""},
            {"name": "genomicPosition", "type": "Integer", "isHidden": true, "orderKey": 6}
        ]}"#;
        let doc: IndexedFields = serde_json::from_str(json)?;
        let catalog = FieldCatalog::from_indexed_fields(&doc);

        assert_eq!(
            catalog.fields().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["start", "genomicPosition", "variableSamples", "CLN_SIG"]
        );
        assert_eq!(
            catalog.get("variableSamples")?.data_type,
            FieldDataType::MultiValued
        );
        assert_eq!(catalog.get("start")?.data_type, FieldDataType::Number);
        let cln_sig = catalog.get("CLN_SIG")?;
        assert_eq!(cln_sig.data_type, FieldDataType::String);
        assert_eq!(cln_sig.title, "CLN_SIG");
        assert_eq!(cln_sig.description, None);
        assert!(catalog.get("genomicPosition")?.hidden);
        Ok(())
    }
}
