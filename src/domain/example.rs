// ============================================================
// Layer 3 — Example Domain Types
// ============================================================
// An Example is one instance fed to the classifier: a record
// mapping field names to values. The only required field is
// the token-id sequence. Everything else is optional:
//
//   word_content_input           → token ids (required)
//   rationale_distr              → rationale target, UNK slot included
//   rationale_exclude_UNK_distr  → rationale target, UNK slot excluded
//   <any other field>            → auxiliary numeric features
//
// Data arrives "columnar": one array per field, aligned by
// index. The data layer turns those columns into Examples.
//
// Example JSON chunk:
//   {
//     "features": {
//       "word_content_input": [[1, 10, 53], [12, 20]],
//       "rationale_distr":    [[0, 0.5, 0.5], null]
//     },
//     "labels": [0, 1]
//   }

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, TrainingError};

/// Field holding the token-id sequence.
pub const TOKENS_FIELD: &str = "word_content_input";

/// Rationale target that keeps a slot for the unknown token.
pub const RATIONALE_WITH_UNK_FIELD: &str = "rationale_distr";

/// Rationale target computed without the unknown-token slot.
pub const RATIONALE_EXCLUDE_UNK_FIELD: &str = "rationale_exclude_UNK_distr";

/// Binary ground truth, 0.0 or 1.0.
pub type Label = f32;

/// Columnar data: field name → one value per example.
pub type ColumnarBatch = BTreeMap<String, Vec<FieldValue>>;

// ─── FieldValue ───────────────────────────────────────────────────────────────
/// One example's value for one field.
///
/// `Missing` deserialises from JSON `null` and marks an absent
/// optional field (e.g. an example without rationale annotation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Missing,
    Integers(Vec<i64>),
    Reals(Vec<f32>),
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValue::Missing     => 0,
            FieldValue::Integers(v) => v.len(),
            FieldValue::Reals(v)    => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric view of the value; integers are widened to f32.
    pub fn to_reals(&self) -> Option<Vec<f32>> {
        match self {
            FieldValue::Missing     => None,
            FieldValue::Integers(v) => Some(v.iter().map(|&x| x as f32).collect()),
            FieldValue::Reals(v)    => Some(v.clone()),
        }
    }
}

// ─── RationaleVariant ─────────────────────────────────────────────────────────
/// Which rationale target a training session aligns attention with.
/// Chosen once per session; the other field is never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RationaleVariant {
    #[default]
    WithUnknown,
    ExcludeUnknown,
}

impl RationaleVariant {
    pub fn field_name(self) -> &'static str {
        match self {
            RationaleVariant::WithUnknown    => RATIONALE_WITH_UNK_FIELD,
            RationaleVariant::ExcludeUnknown => RATIONALE_EXCLUDE_UNK_FIELD,
        }
    }
}

impl fmt::Display for RationaleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RationaleVariant::WithUnknown    => f.write_str("with-unk"),
            RationaleVariant::ExcludeUnknown => f.write_str("exclude-unk"),
        }
    }
}

impl FromStr for RationaleVariant {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "with-unk" | "with_unk" | "1"       => Ok(RationaleVariant::WithUnknown),
            "exclude-unk" | "exclude_unk" | "0" => Ok(RationaleVariant::ExcludeUnknown),
            other => Err(TrainingError::config(format!(
                "unknown rationale variant '{other}' (expected 'with-unk' or 'exclude-unk')"
            ))),
        }
    }
}

// ─── Example ──────────────────────────────────────────────────────────────────
/// An immutable per-example record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Example {
    fields: BTreeMap<String, FieldValue>,
}

impl Example {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    /// Convenience constructor for an example holding only tokens.
    pub fn from_tokens(tokens: Vec<i64>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(TOKENS_FIELD.to_string(), FieldValue::Integers(tokens));
        Self { fields }
    }

    /// Builder-style helper used when assembling examples by hand.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// The token-id sequence. Fails if the field is absent or not integral.
    pub fn token_ids(&self) -> Result<&[i64]> {
        match self.fields.get(TOKENS_FIELD) {
            Some(FieldValue::Integers(ids)) => Ok(ids),
            Some(FieldValue::Reals(_)) => Err(TrainingError::shape(format!(
                "field '{TOKENS_FIELD}' must hold integer token ids"
            ))),
            Some(FieldValue::Missing) | None => Err(TrainingError::shape(format!(
                "example has no '{TOKENS_FIELD}' token sequence"
            ))),
        }
    }

    /// Rationale target for `variant`, if this example carries one.
    pub fn rationale(&self, variant: RationaleVariant) -> Option<Vec<f32>> {
        self.fields
            .get(variant.field_name())
            .and_then(FieldValue::to_reals)
    }

    /// Every auxiliary feature vector, concatenated in field-name order.
    /// Token ids and both rationale targets are never part of it.
    pub fn auxiliary_features(&self) -> Vec<f32> {
        self.fields
            .iter()
            .filter(|(name, _)| !is_reserved_field(name))
            .filter_map(|(_, value)| value.to_reals())
            .flatten()
            .collect()
    }
}

fn is_reserved_field(name: &str) -> bool {
    name == TOKENS_FIELD || name == RATIONALE_WITH_UNK_FIELD || name == RATIONALE_EXCLUDE_UNK_FIELD
}

// ─── LabelledChunk ────────────────────────────────────────────────────────────
/// A columnar chunk plus its parallel labels, as stored on disk
/// or yielded by a streaming producer. Labels may be empty for
/// prediction-only inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelledChunk {
    pub features: ColumnarBatch,
    #[serde(default)]
    pub labels: Vec<Label>,
}

// ─── LabelledExamples ─────────────────────────────────────────────────────────
/// Materialised examples with their labels, paired by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelledExamples {
    examples: Vec<Example>,
    labels:   Vec<Label>,
}

impl LabelledExamples {
    pub fn new(examples: Vec<Example>, labels: Vec<Label>) -> Result<Self> {
        if examples.len() != labels.len() {
            return Err(TrainingError::shape(format!(
                "{} examples but {} labels",
                examples.len(),
                labels.len()
            )));
        }
        Ok(Self { examples, labels })
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Example, Label)> + '_ {
        self.examples.iter().zip(self.labels.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_values_parse_from_json() {
        let chunk: LabelledChunk = serde_json::from_str(
            r#"{
                "features": {
                    "word_content_input": [[1, 10, 53], [12, 20]],
                    "rationale_distr": [[0, 0.5, 0.5], null]
                },
                "labels": [0, 1]
            }"#,
        )
        .unwrap();

        let tokens = &chunk.features[TOKENS_FIELD];
        assert_eq!(tokens[0], FieldValue::Integers(vec![1, 10, 53]));
        let rationale = &chunk.features[RATIONALE_WITH_UNK_FIELD];
        assert_eq!(rationale[0], FieldValue::Reals(vec![0.0, 0.5, 0.5]));
        assert!(rationale[1].is_missing());
        assert_eq!(chunk.labels, vec![0.0, 1.0]);
    }

    #[test]
    fn test_integral_rationale_widens_to_reals() {
        let ex = Example::from_tokens(vec![4, 5])
            .with_field(RATIONALE_WITH_UNK_FIELD, FieldValue::Integers(vec![0, 1]));
        assert_eq!(ex.rationale(RationaleVariant::WithUnknown), Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_rationale_only_reads_requested_variant() {
        let ex = Example::from_tokens(vec![4, 5])
            .with_field(RATIONALE_EXCLUDE_UNK_FIELD, FieldValue::Reals(vec![0.5, 0.5]));
        assert_eq!(ex.rationale(RationaleVariant::WithUnknown), None);
        assert!(ex.rationale(RationaleVariant::ExcludeUnknown).is_some());
    }

    #[test]
    fn test_auxiliary_features_skip_reserved_fields() {
        let ex = Example::from_tokens(vec![1, 2, 3])
            .with_field(RATIONALE_WITH_UNK_FIELD, FieldValue::Reals(vec![0.2, 0.3, 0.5]))
            .with_field("splex_score_input", FieldValue::Integers(vec![35, 12]))
            .with_field("cl_score_input", FieldValue::Reals(vec![0.5]))
            .with_field("empty_feature", FieldValue::Missing);
        // BTreeMap order: cl_score_input before splex_score_input
        assert_eq!(ex.auxiliary_features(), vec![0.5, 35.0, 12.0]);
    }

    #[test]
    fn test_missing_tokens_is_an_error() {
        let ex = Example::default();
        assert!(matches!(ex.token_ids(), Err(TrainingError::Shape(_))));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("with-unk".parse::<RationaleVariant>().unwrap(), RationaleVariant::WithUnknown);
        assert_eq!("0".parse::<RationaleVariant>().unwrap(), RationaleVariant::ExcludeUnknown);
        assert!("sometimes".parse::<RationaleVariant>().is_err());
    }

    #[test]
    fn test_labelled_examples_reject_length_mismatch() {
        let err = LabelledExamples::new(vec![Example::from_tokens(vec![1])], vec![]);
        assert!(matches!(err, Err(TrainingError::Shape(_))));
    }
}
