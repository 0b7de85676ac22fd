// ============================================================
// Layer 6 — Checkpoint Store
// ============================================================
// Keeps the best-seen model in memory during training and
// writes it to disk once training has stopped.
//
//   capture(model)      → Checkpoint (independent copy of the
//                         parameters; optimizer state is never
//                         part of it)
//   persist(checkpoint) → best_model.mpk + best_checkpoint.json
//   load(model)         → the same architecture with the saved
//                         weights on top
//
// Burn parameters are immutable tensors and every optimizer
// step builds new ones, so a cloned module is already a deep,
// independent snapshot.
//
// Directory layout:
//   checkpoints/
//     best_model.mpk          ← NamedMpkFileRecorder, full precision
//     best_checkpoint.json    ← epoch + validation loss
//     model_config.json       ← architecture, for rebuilding
//     train_config.json       ← hyperparameters of the run

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    module::Module,
    prelude::Backend,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::error::{Result, TrainingError};

const MODEL_FILE: &str = "best_model";
const META_FILE:  &str = "best_checkpoint.json";

/// Architecture saved next to the weights.
pub const MODEL_CONFIG_FILE: &str = "model_config.json";
/// Hyperparameters of the run that produced the weights.
pub const TRAIN_CONFIG_FILE: &str = "train_config.json";

/// Snapshot of the model at its best epoch.
#[derive(Debug, Clone)]
pub struct Checkpoint<M> {
    pub epoch:           usize,
    pub validation_loss: f64,
    pub model:           M,
}

/// What best_checkpoint.json records next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch:           usize,
    pub validation_loss: f64,
}

/// File-system persistence sink for checkpoints and configs.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Open a store, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open an existing store for inference; the directory must exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(TrainingError::Checkpoint(format!(
                "checkpoint directory '{}' does not exist",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where persist() writes the weights.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE).with_extension("mpk")
    }

    /// Copy the model's current parameters.
    pub fn capture<M: Clone>(model: &M, epoch: usize, validation_loss: f64) -> Checkpoint<M> {
        Checkpoint { epoch, validation_loss, model: model.clone() }
    }

    /// Write a checkpoint's weights and metadata. Returns the weights path.
    pub fn persist<B: Backend, M: Module<B>>(&self, checkpoint: &Checkpoint<M>) -> Result<PathBuf> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        checkpoint
            .model
            .clone()
            .save_file(self.dir.join(MODEL_FILE), &recorder)
            .map_err(|e| {
                TrainingError::Checkpoint(format!(
                    "failed to save weights to '{}': {e}",
                    self.dir.display()
                ))
            })?;

        self.write_json(
            META_FILE,
            &CheckpointMeta {
                epoch:           checkpoint.epoch,
                validation_loss: checkpoint.validation_loss,
            },
        )?;

        let path = self.model_path();
        tracing::info!(
            "Saved best checkpoint (epoch {}, validation loss {:.4}) to '{}'",
            checkpoint.epoch,
            checkpoint.validation_loss,
            path.display()
        );
        Ok(path)
    }

    /// Load saved weights into a freshly built model of the same architecture.
    pub fn load<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.model_path();
        if !path.exists() {
            return Err(TrainingError::Checkpoint(format!(
                "no checkpoint at '{}'; has training been run?",
                path.display()
            )));
        }

        let expected = model.num_params();
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let loaded = model
            .load_file(self.dir.join(MODEL_FILE), &recorder, device)
            .map_err(|e| {
                TrainingError::shape(format!(
                    "checkpoint '{}' does not match the model: {e}",
                    path.display()
                ))
            })?;

        let found = loaded.num_params();
        if found != expected {
            return Err(TrainingError::shape(format!(
                "checkpoint '{}' holds {found} parameters, model expects {expected}",
                path.display()
            )));
        }
        tracing::debug!("Loaded {found} parameters from '{}'", path.display());
        Ok(loaded)
    }

    pub fn load_meta(&self) -> Result<CheckpointMeta> {
        self.read_json(META_FILE)
    }

    /// Save any serde config as pretty JSON under the store directory.
    pub fn save_config<T: Serialize>(&self, name: &str, config: &T) -> Result<()> {
        self.write_json(name, config)
    }

    pub fn load_config<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.read_json(name)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).map_err(|e| {
            TrainingError::Checkpoint(format!("cannot read '{}': {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use crate::domain::example::Example;
    use crate::ml::model::{AttentionClassifier, AttentionClassifierConfig, RationaleClassifier};
    use burn::tensor::ElementConversion;

    type TestBackend = NdArray<f32>;

    fn config() -> AttentionClassifierConfig {
        AttentionClassifierConfig::new(16).with_embed_dim(4).with_hidden_dim(4)
    }

    fn score(model: &AttentionClassifier<TestBackend>) -> f32 {
        model
            .forward_example(&Example::from_tokens(vec![1, 5, 9]))
            .unwrap()
            .output
            .into_scalar()
            .elem()
    }

    #[test]
    fn test_persist_then_load_restores_weights() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = CheckpointStore::new(dir.path()).unwrap();
        let device = Default::default();

        let trained: AttentionClassifier<TestBackend> = config().init(&device);
        let checkpoint = CheckpointStore::capture(&trained, 3, 0.42);
        let path = store.persist(&checkpoint).unwrap();
        assert!(path.exists());

        let fresh: AttentionClassifier<TestBackend> = config().init(&device);
        let loaded = store.load(fresh, &device).unwrap();
        assert!((score(&loaded) - score(&trained)).abs() < 1e-6);

        let meta = store.load_meta().unwrap();
        assert_eq!(meta, CheckpointMeta { epoch: 3, validation_loss: 0.42 });
    }

    #[test]
    fn test_missing_checkpoint_fails() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = CheckpointStore::new(dir.path()).unwrap();
        let device = Default::default();
        let model: AttentionClassifier<TestBackend> = config().init(&device);
        assert!(matches!(store.load(model, &device), Err(TrainingError::Checkpoint(_))));
    }

    #[test]
    fn test_incompatible_architecture_fails() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = CheckpointStore::new(dir.path()).unwrap();
        let device = Default::default();

        let saved: AttentionClassifier<TestBackend> = config().with_use_attention(false).init(&device);
        store.persist(&CheckpointStore::capture(&saved, 1, 0.5)).unwrap();

        let with_attention: AttentionClassifier<TestBackend> = config().init(&device);
        assert!(matches!(store.load(with_attention, &device), Err(TrainingError::Shape(_))));
    }

    #[test]
    fn test_config_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        store.save_config(MODEL_CONFIG_FILE, &config()).unwrap();
        let back: AttentionClassifierConfig = store.load_config(MODEL_CONFIG_FILE).unwrap();
        assert_eq!(back.vocab_size, 16);
        assert_eq!(back.hidden_dim, 4);
    }

    #[test]
    fn test_open_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointStore::open(dir.path().join("missing")).is_err());
        assert!(CheckpointStore::open(dir.path()).is_ok());
    }
}
