// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Inference-only session: rebuild the classifier from a
// checkpoint directory, then score columnar data files.
//
//   checkpoints/model_config.json ─┐
//   checkpoints/best_model.mpk ────┴─► Predictor ──► PredictionSet

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::loader::load_chunk;
use crate::infra::runtime::init_single_thread;
use crate::ml::{
    backend::{default_device, InferBackend},
    model::AttentionClassifier,
    predictor::{PredictionSet, Predictor},
};

pub struct PredictUseCase {
    checkpoint_dir: PathBuf,
    predictor:      Predictor<InferBackend, AttentionClassifier<InferBackend>>,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Result<Self> {
        init_single_thread();
        let checkpoint_dir = checkpoint_dir.into();
        let predictor = Predictor::from_checkpoint(&checkpoint_dir, &default_device())
            .with_context(|| {
                format!(
                    "Cannot load a model from '{}'. Have you run 'train' first?",
                    checkpoint_dir.display()
                )
            })?;
        Ok(Self { checkpoint_dir, predictor })
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    /// Score every example in a columnar JSON file. Labels, if present, are ignored.
    pub fn predict(&self, data_path: &Path, include_attention: bool) -> Result<PredictionSet> {
        let chunk = load_chunk(data_path)
            .with_context(|| format!("Cannot load '{}'", data_path.display()))?;
        let predictions = self.predictor.predict(chunk.features, include_attention)?;
        tracing::info!(
            "Scored {} examples from '{}'",
            predictions.scores.len(),
            data_path.display()
        );
        Ok(predictions)
    }
}
