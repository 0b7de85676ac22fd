// ============================================================
// Layer 5 — Predictor
// ============================================================
// Runs a trained model over a columnar batch in evaluation mode:
//
//   ColumnarBatch ──► to_records ──► forward_example (each)
//                                        │
//                          scores [n]  ◄─┤
//                attention [n][len_i]  ◄─┘  (only if requested)
//
// No shuffling: output i always belongs to input example i.
// The model must be an inference-mode module (inner backend),
// e.g. `trained.valid()` or one loaded from a checkpoint.

use std::{marker::PhantomData, path::Path};

use burn::prelude::*;
use serde::Serialize;

use crate::data::adapter::to_records;
use crate::domain::{
    error::{Result, TrainingError},
    example::{ColumnarBatch, Example},
};
use crate::infra::checkpoint::{CheckpointStore, MODEL_CONFIG_FILE};
use crate::ml::model::{AttentionClassifier, AttentionClassifierConfig, RationaleClassifier};

/// Scores (and optionally attention vectors) in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSet {
    pub scores: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention: Option<Vec<Vec<f32>>>,
}

pub struct Predictor<B: Backend, M: RationaleClassifier<B>> {
    model:    M,
    _backend: PhantomData<B>,
}

impl<B: Backend, M: RationaleClassifier<B>> Predictor<B, M> {
    pub fn new(model: M) -> Self {
        Self { model, _backend: PhantomData }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Predict a columnar batch.
    pub fn predict(&self, batch: ColumnarBatch, include_attention: bool) -> Result<PredictionSet> {
        let examples = to_records(batch)?;
        self.predict_examples(&examples, include_attention)
    }

    pub fn predict_examples(&self, examples: &[Example], include_attention: bool) -> Result<PredictionSet> {
        if include_attention && !self.model.uses_attention() {
            return Err(TrainingError::capability(
                "attention was requested from a model without attention",
            ));
        }

        let mut scores    = Vec::with_capacity(examples.len());
        let mut attention = include_attention.then(|| Vec::with_capacity(examples.len()));

        for example in examples {
            let prediction = self.model.forward_example(example)?;
            scores.push(prediction.output.into_scalar().elem::<f32>());

            if let Some(vectors) = attention.as_mut() {
                let weights = prediction.attention.ok_or_else(|| {
                    TrainingError::capability("model returned no attention for an example")
                })?;
                let weights = weights
                    .into_data()
                    .to_vec::<f32>()
                    .map_err(|e| TrainingError::Tensor(format!("{e:?}")))?;
                vectors.push(weights);
            }
        }

        tracing::debug!("Predicted {} examples", scores.len());
        Ok(PredictionSet { scores, attention })
    }
}

impl<B: Backend> Predictor<B, AttentionClassifier<B>> {
    /// Rebuild the bundled classifier from a checkpoint directory
    /// (model_config.json + best weights).
    pub fn from_checkpoint(dir: impl AsRef<Path>, device: &B::Device) -> Result<Self> {
        let store = CheckpointStore::open(dir.as_ref())?;
        let config: AttentionClassifierConfig = store.load_config(MODEL_CONFIG_FILE)?;
        let model = store.load(config.init::<B>(device), device)?;
        tracing::info!(
            "Loaded classifier from '{}' (vocab {}, attention {})",
            store.dir().display(),
            config.vocab_size,
            config.use_attention,
        );
        Ok(Self::new(model))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use crate::domain::example::{FieldValue, TOKENS_FIELD};
    use crate::infra::checkpoint::CheckpointStore;

    type TestBackend = NdArray<f32>;

    fn config() -> AttentionClassifierConfig {
        AttentionClassifierConfig::new(30).with_embed_dim(6).with_hidden_dim(5)
    }

    fn batch(sequences: &[&[i64]]) -> ColumnarBatch {
        let mut batch = ColumnarBatch::new();
        batch.insert(
            TOKENS_FIELD.to_string(),
            sequences.iter().map(|s| FieldValue::Integers(s.to_vec())).collect(),
        );
        batch
    }

    #[test]
    fn test_scores_follow_input_order() {
        let device = Default::default();
        let predictor = Predictor::new(config().init::<TestBackend>(&device));
        let sequences: [&[i64]; 3] = [&[1, 2, 3], &[7], &[20, 21, 22, 23]];

        let together = predictor.predict(batch(&sequences), false).unwrap();
        assert_eq!(together.scores.len(), 3);
        assert!(together.attention.is_none());

        for (i, seq) in sequences.iter().enumerate() {
            let alone = predictor.predict(batch(&[*seq]), false).unwrap();
            assert!((alone.scores[0] - together.scores[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_attention_vectors_match_sequence_lengths() {
        let device = Default::default();
        let predictor = Predictor::new(config().init::<TestBackend>(&device));
        let result = predictor.predict(batch(&[&[1, 2, 3], &[4, 5]]), true).unwrap();

        let attention = result.attention.unwrap();
        assert_eq!(attention.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 2]);
        for weights in attention {
            assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_attention_from_plain_model_is_a_capability_error() {
        let device = Default::default();
        let predictor = Predictor::new(config().with_use_attention(false).init::<TestBackend>(&device));
        assert!(predictor.predict(batch(&[&[1]]), false).is_ok());
        assert!(matches!(
            predictor.predict(batch(&[&[1]]), true),
            Err(TrainingError::Capability(_))
        ));
    }

    #[test]
    fn test_from_checkpoint_reproduces_scores() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let store  = CheckpointStore::new(dir.path()).unwrap();

        let model = config().init::<TestBackend>(&device);
        store.save_config(MODEL_CONFIG_FILE, &config()).unwrap();
        store.persist(&CheckpointStore::capture(&model, 1, 0.3)).unwrap();

        let original = Predictor::new(model).predict(batch(&[&[3, 4, 5]]), false).unwrap();
        let restored = Predictor::<TestBackend, _>::from_checkpoint(dir.path(), &device)
            .unwrap()
            .predict(batch(&[&[3, 4, 5]]), false)
            .unwrap();
        assert!((original.scores[0] - restored.scores[0]).abs() < 1e-6);
    }
}
