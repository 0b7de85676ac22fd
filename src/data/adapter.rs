// ============================================================
// Layer 4 — Data Adapter
// ============================================================
// Turns columnar data into per-example records.
//
//   columns:  { "word_content_input": [a0, a1, a2],
//               "rationale_distr":    [r0, r1, r2] }
//   records:  [ {word_content_input: a0, rationale_distr: r0},
//               {word_content_input: a1, rationale_distr: r1},
//               {word_content_input: a2, rationale_distr: r2} ]
//
// Every column must have the same length. Field semantics are
// not checked here; that is the model's and the loss's job.

use crate::domain::{
    error::{Result, TrainingError},
    example::{ColumnarBatch, Example, LabelledChunk, LabelledExamples},
};

/// Convert a columnar batch into one Example per index, in order.
///
/// Fails with a shape error when the batch has no fields or when
/// the columns disagree on length.
pub fn to_records(batch: ColumnarBatch) -> Result<Vec<Example>> {
    let len = column_length(&batch)?;

    let mut columns: Vec<(String, std::vec::IntoIter<_>)> = batch
        .into_iter()
        .map(|(name, values)| (name, values.into_iter()))
        .collect();

    let records = (0..len)
        .map(|_| {
            let fields = columns
                .iter_mut()
                .filter_map(|(name, values)| values.next().map(|v| (name.clone(), v)))
                .collect();
            Example::new(fields)
        })
        .collect();

    Ok(records)
}

/// Convert a labelled chunk into examples paired with their labels.
pub fn to_labelled(chunk: LabelledChunk) -> Result<LabelledExamples> {
    let examples = to_records(chunk.features)?;
    LabelledExamples::new(examples, chunk.labels)
}

/// Shared length of every column, or a shape error.
fn column_length(batch: &ColumnarBatch) -> Result<usize> {
    let mut columns = batch.iter();
    let (first_name, first) = columns
        .next()
        .ok_or_else(|| TrainingError::shape("columnar batch has no fields"))?;

    for (name, values) in columns {
        if values.len() != first.len() {
            return Err(TrainingError::shape(format!(
                "column '{name}' has {} values but '{first_name}' has {}",
                values.len(),
                first.len()
            )));
        }
    }
    Ok(first.len())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::{FieldValue, RATIONALE_WITH_UNK_FIELD, TOKENS_FIELD};

    fn two_column_batch() -> ColumnarBatch {
        let mut batch = ColumnarBatch::new();
        batch.insert(
            TOKENS_FIELD.to_string(),
            vec![
                FieldValue::Integers(vec![1, 10, 53]),
                FieldValue::Integers(vec![12, 20]),
                FieldValue::Integers(vec![7]),
            ],
        );
        batch.insert(
            RATIONALE_WITH_UNK_FIELD.to_string(),
            vec![
                FieldValue::Reals(vec![0.0, 0.5, 0.5]),
                FieldValue::Missing,
                FieldValue::Reals(vec![1.0]),
            ],
        );
        batch
    }

    #[test]
    fn test_one_record_per_index_in_order() {
        let records = to_records(two_column_batch()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].token_ids().unwrap(), &[1, 10, 53]);
        assert_eq!(records[1].token_ids().unwrap(), &[12, 20]);
        assert_eq!(records[2].token_ids().unwrap(), &[7]);
    }

    #[test]
    fn test_field_set_is_preserved() {
        let records = to_records(two_column_batch()).unwrap();
        for record in &records {
            let names: Vec<&str> = record.fields().keys().map(String::as_str).collect();
            assert_eq!(names, vec![RATIONALE_WITH_UNK_FIELD, TOKENS_FIELD]);
        }
        assert!(records[1].get(RATIONALE_WITH_UNK_FIELD).unwrap().is_missing());
    }

    #[test]
    fn test_length_mismatch_is_a_shape_error() {
        let mut batch = two_column_batch();
        batch.get_mut(TOKENS_FIELD).unwrap().pop();
        assert!(matches!(to_records(batch), Err(TrainingError::Shape(_))));
    }

    #[test]
    fn test_empty_mapping_is_rejected() {
        assert!(matches!(to_records(ColumnarBatch::new()), Err(TrainingError::Shape(_))));
    }

    #[test]
    fn test_labels_must_match_record_count() {
        let chunk = LabelledChunk { features: two_column_batch(), labels: vec![0.0, 1.0] };
        assert!(to_labelled(chunk).is_err());

        let chunk = LabelledChunk { features: two_column_batch(), labels: vec![0.0, 1.0, 1.0] };
        let labelled = to_labelled(chunk).unwrap();
        assert_eq!(labelled.labels(), &[0.0, 1.0, 1.0]);
    }
}
