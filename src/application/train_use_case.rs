// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Pin the runtime to one thread  (Layer 6 - infra)
//   Step 2: Load the validation set        (Layer 4 - data)
//   Step 3: Open the training source       (Layer 4 - data)
//   Step 4: Build the classifier           (Layer 5 - ml)
//   Step 5: Save configs for inference     (Layer 6 - infra)
//   Step 6: Run the training session       (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::{load_labelled, JsonlChunkProducer},
    source::DatasetSource,
};
use crate::domain::{
    example::{LabelledExamples, RationaleVariant},
    traits::ChunkProducer,
};
use crate::infra::{
    checkpoint::{CheckpointStore, MODEL_CONFIG_FILE, TRAIN_CONFIG_FILE},
    runtime::init_single_thread,
};
use crate::ml::{
    backend::{default_device, TrainBackend},
    model::{AttentionClassifier, AttentionClassifierConfig},
    trainer::{adam_optimizer, SessionConfig, TrainingReport, TrainingSession},
};

/// Log file name used when `verbose` is on and no path was given.
pub const DEFAULT_LOG_FILE: &str = "training_log.txt";

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs: data paths, hyperparameters and model
// architecture. Saved as train_config.json next to the weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Columnar JSON training file (fixed mode)
    pub train_data:            Option<PathBuf>,
    /// JSON-lines chunk file (streaming mode)
    pub train_stream:          Option<PathBuf>,
    pub pulls_per_epoch:       usize,
    pub cycle_stream:          bool,
    pub validation_data:       PathBuf,
    pub checkpoint_dir:        PathBuf,
    pub log_path:              Option<PathBuf>,

    pub max_epochs:            usize,
    pub patience:              usize,
    pub min_epochs:            usize,
    pub batch_size:            usize,
    pub lr:                    f64,
    pub attention_loss_weight: f64,
    pub use_rationale:         bool,
    pub rationale_variant:     RationaleVariant,
    pub verbose:               bool,
    pub seed:                  Option<u64>,

    pub vocab_size:            usize,
    pub embed_dim:             usize,
    pub hidden_dim:            usize,
    /// Auxiliary feature length; `None` reads it off the validation set.
    pub feature_dim:           Option<usize>,
    pub use_attention:         bool,
    pub freeze_embeddings:     bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_data:            None,
            train_stream:          None,
            pulls_per_epoch:       1,
            cycle_stream:          false,
            validation_data:       PathBuf::from("data/validation.json"),
            checkpoint_dir:        PathBuf::from("checkpoints"),
            log_path:              None,

            max_epochs:            10,
            patience:              4,
            min_epochs:            2,
            batch_size:            64,
            lr:                    0.003,
            attention_loss_weight: 4.0,
            use_rationale:         false,
            rationale_variant:     RationaleVariant::WithUnknown,
            verbose:               false,
            seed:                  None,

            vocab_size:            10_000,
            embed_dim:             64,
            hidden_dim:            64,
            feature_dim:           None,
            use_attention:         true,
            freeze_embeddings:     false,
        }
    }
}

impl TrainConfig {
    /// Session hyperparameters. Verbose runs without an explicit log
    /// path write to `<checkpoint_dir>/training_log.txt`.
    pub fn session_config(&self) -> SessionConfig {
        let log_path = match (&self.log_path, self.verbose) {
            (Some(path), _) => Some(path.clone()),
            (None, true)    => Some(self.checkpoint_dir.join(DEFAULT_LOG_FILE)),
            (None, false)   => None,
        };
        SessionConfig {
            max_epochs:            self.max_epochs,
            patience:              self.patience,
            min_epochs:            self.min_epochs,
            batch_size:            self.batch_size,
            learning_rate:         self.lr,
            attention_loss_weight: self.attention_loss_weight,
            use_rationale:         self.use_rationale,
            rationale_variant:     self.rationale_variant,
            verbose:               self.verbose,
            log_path,
            seed:                  self.seed,
        }
    }

    pub fn model_config(&self, feature_dim: usize) -> AttentionClassifierConfig {
        AttentionClassifierConfig::new(self.vocab_size)
            .with_embed_dim(self.embed_dim)
            .with_hidden_dim(self.hidden_dim)
            .with_feature_dim(feature_dim)
            .with_use_attention(self.use_attention)
            .with_freeze_embeddings(self.freeze_embeddings)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run training end to end and return the session report.
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Single-threaded runtime ───────────────────────────────────
        init_single_thread();

        // ── Step 2: Validation set ────────────────────────────────────────────
        let validation = load_labelled(&cfg.validation_data).with_context(|| {
            format!("Cannot load validation data '{}'", cfg.validation_data.display())
        })?;
        tracing::info!("Loaded {} validation examples", validation.len());

        // ── Step 3: Training source ───────────────────────────────────────────
        let source = self.open_source()?;

        // ── Step 4: Model ─────────────────────────────────────────────────────
        let feature_dim = cfg.feature_dim.unwrap_or_else(|| infer_feature_dim(&validation));
        let model_cfg   = cfg.model_config(feature_dim);
        let device      = default_device();
        let model: AttentionClassifier<TrainBackend> = model_cfg.init(&device);
        tracing::info!(
            "Model ready: vocab={}, embed={}, hidden={}, features={}, attention={}",
            model_cfg.vocab_size,
            model_cfg.embed_dim,
            model_cfg.hidden_dim,
            model_cfg.feature_dim,
            model_cfg.use_attention,
        );

        // ── Step 5: Configs for inference ─────────────────────────────────────
        let store = CheckpointStore::new(&cfg.checkpoint_dir).with_context(|| {
            format!("Cannot create checkpoint directory '{}'", cfg.checkpoint_dir.display())
        })?;
        store.save_config(MODEL_CONFIG_FILE, &model_cfg)?;
        store.save_config(TRAIN_CONFIG_FILE, cfg)?;

        // ── Step 6: Train ─────────────────────────────────────────────────────
        let session: TrainingSession<TrainBackend, _, _> = TrainingSession::new(
            cfg.session_config(),
            model,
            adam_optimizer(),
            source,
            validation,
            store,
        )?;
        let outcome = session.run()?;
        Ok(outcome.report)
    }

    fn open_source(&self) -> Result<DatasetSource> {
        let cfg = &self.config;

        let fixed = match &cfg.train_data {
            Some(path) => Some(load_labelled(path).with_context(|| {
                format!("Cannot load training data '{}'", path.display())
            })?),
            None => None,
        };
        let streaming = match &cfg.train_stream {
            Some(path) => {
                let producer = JsonlChunkProducer::open(path, cfg.cycle_stream)?;
                tracing::info!(
                    "Streaming training chunks from '{}' ({} per epoch{})",
                    path.display(),
                    cfg.pulls_per_epoch,
                    if cfg.cycle_stream { ", cycling" } else { "" },
                );
                Some((Box::new(producer) as Box<dyn ChunkProducer>, cfg.pulls_per_epoch))
            }
            None => None,
        };

        if let Some(data) = &fixed {
            tracing::info!("Loaded {} training examples", data.len());
        }
        Ok(DatasetSource::from_parts(fixed, streaming)?)
    }
}

fn infer_feature_dim(validation: &LabelledExamples) -> usize {
    validation
        .examples()
        .first()
        .map(|e| e.auxiliary_features().len())
        .unwrap_or(0)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_without_path_logs_into_checkpoint_dir() {
        let cfg = TrainConfig {
            verbose: true,
            checkpoint_dir: PathBuf::from("runs/a"),
            ..Default::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.log_path, Some(PathBuf::from("runs/a").join(DEFAULT_LOG_FILE)));
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_defaults_match_session_defaults() {
        let session = TrainConfig::default().session_config();
        assert_eq!(session, SessionConfig::default());
    }

    #[test]
    fn test_config_survives_json() {
        let cfg = TrainConfig {
            train_stream: Some(PathBuf::from("stream.jsonl")),
            rationale_variant: RationaleVariant::ExcludeUnknown,
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.train_stream, cfg.train_stream);
        assert_eq!(back.rationale_variant, RationaleVariant::ExcludeUnknown);
    }
}
