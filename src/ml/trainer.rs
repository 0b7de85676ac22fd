// ============================================================
// Layer 5 — Training Controller
// ============================================================
// Drives one training session from start to persisted
// checkpoint. Per epoch:
//
//   IngestingEpochData   source.materialize_epoch()
//          │
//   Shuffling            scheduler.schedule()
//          │
//   IteratingBatches     Σ compose(example) over the batch
//          │             → one backward → one optimizer step
//   ValidatingEpoch      model.valid(), mean label-only loss
//          │
//   CheckingStop         EarlyStopping::observe()
//          │             improved → capture checkpoint
//     Continue ◄─┴─► Stop
//                     │
//   Persisting        best checkpoint → CheckpointStore
//
// Burn 0.20 notes:
//   - The batch loss is the *sum* of per-example losses, so a
//     single backward() yields the accumulated gradient.
//   - optim.step() consumes GradientsParams, which covers
//     "zero the gradients" as well.
//   - Parameters built with no_grad() get no gradients and
//     are never touched by the optimizer.
//
// Any error ends the session immediately. Persisting only
// happens after the stop decision, so a failed session never
// writes a checkpoint.

use std::{marker::PhantomData, path::PathBuf};

use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, decay::WeightDecayConfig, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    scheduler::{Batch, MinibatchScheduler},
    source::DatasetSource,
};
use crate::domain::{
    error::{Result, TrainingError},
    example::{LabelledExamples, RationaleVariant},
};
use crate::infra::{
    checkpoint::{Checkpoint, CheckpointStore},
    metrics::{EpochMetrics, TrainingLog},
};
use crate::ml::{
    loss::{binary_cross_entropy, LossComposer},
    model::RationaleClassifier,
    stopping::EarlyStopping,
};

/// L2 weight decay applied by the default Adam optimizer.
pub const WEIGHT_DECAY: f32 = 1e-3;

const PROGRESS_EVERY: usize = 10;

// ─── SessionConfig ────────────────────────────────────────────────────────────
/// Hyperparameters of a training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_epochs:            usize,
    pub patience:              usize,
    pub min_epochs:            usize,
    pub batch_size:            usize,
    pub learning_rate:         f64,
    pub attention_loss_weight: f64,
    pub use_rationale:         bool,
    pub rationale_variant:     RationaleVariant,
    pub verbose:               bool,
    /// Training log file; required when `verbose` is on.
    pub log_path:              Option<PathBuf>,
    /// Seed for the per-epoch shuffle. `None` draws from the OS.
    pub seed:                  Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_epochs:            10,
            patience:              4,
            min_epochs:            2,
            batch_size:            64,
            learning_rate:         0.003,
            attention_loss_weight: 4.0,
            use_rationale:         false,
            rationale_variant:     RationaleVariant::WithUnknown,
            verbose:               false,
            log_path:              None,
            seed:                  None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_epochs == 0 {
            return Err(TrainingError::config("max epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::config("batch size must be at least 1"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainingError::config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.attention_loss_weight.is_finite() && self.attention_loss_weight >= 0.0) {
            return Err(TrainingError::config(format!(
                "attention loss weight must be finite and non-negative, got {}",
                self.attention_loss_weight
            )));
        }
        if self.verbose && self.log_path.is_none() {
            return Err(TrainingError::config("verbose training needs a log path"));
        }
        Ok(())
    }
}

// ─── TrainingReport ───────────────────────────────────────────────────────────
/// Summary of a finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_epochs:       usize,
    pub best_epoch:           usize,
    pub best_validation_loss: f64,
    pub validation_history:   Vec<f64>,
    /// Mean composed training loss per epoch.
    pub training_history:     Vec<f64>,
    pub optimizer_steps:      usize,
    pub checkpoint_path:      PathBuf,
}

/// Everything a finished session hands back.
#[derive(Debug)]
pub struct TrainingOutcome<M> {
    pub report:      TrainingReport,
    /// Parameters of the best epoch (what was persisted).
    pub best_model:  M,
    /// Parameters after the last epoch.
    pub final_model: M,
}

/// Adam with the fixed L2 weight decay.
pub fn adam_optimizer<B, M>() -> OptimizerAdaptor<Adam, M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(WEIGHT_DECAY)))
        .init::<B, M>()
}

// ─── TrainingSession ──────────────────────────────────────────────────────────
pub struct TrainingSession<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + RationaleClassifier<B>,
    M::InnerModule: RationaleClassifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    config:     SessionConfig,
    model:      M,
    optimizer:  O,
    source:     DatasetSource,
    validation: LabelledExamples,
    scheduler:  MinibatchScheduler,
    composer:   LossComposer,
    store:      CheckpointStore,
    log:        Option<TrainingLog>,
    _backend:   PhantomData<B>,
}

impl<B, M, O> TrainingSession<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + RationaleClassifier<B>,
    M::InnerModule: RationaleClassifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    pub fn new(
        config:     SessionConfig,
        model:      M,
        optimizer:  O,
        source:     DatasetSource,
        validation: LabelledExamples,
        store:      CheckpointStore,
    ) -> Result<Self> {
        config.validate()?;
        if validation.is_empty() {
            return Err(TrainingError::config("validation set is empty"));
        }
        if config.use_rationale && !model.uses_attention() {
            return Err(TrainingError::capability(
                "rationale supervision needs a model that produces attention",
            ));
        }

        let scheduler = MinibatchScheduler::new(config.batch_size, config.seed)?;
        let composer  = LossComposer::new(
            config.use_rationale,
            config.rationale_variant,
            config.attention_loss_weight,
        );
        let log = match (&config.log_path, config.verbose) {
            (Some(path), true) => Some(TrainingLog::new(path)?),
            _ => None,
        };

        tracing::info!(
            "Training session ready: {} source, {} validation examples, rationale {} ({})",
            if source.is_streaming() { "streaming" } else { "fixed" },
            validation.len(),
            if config.use_rationale { "on" } else { "off" },
            config.rationale_variant,
        );

        Ok(Self {
            config,
            model,
            optimizer,
            source,
            validation,
            scheduler,
            composer,
            store,
            log,
            _backend: PhantomData,
        })
    }

    /// Train until the stopping policy fires, then persist the best checkpoint.
    pub fn run(self) -> Result<TrainingOutcome<M>> {
        let TrainingSession {
            config,
            mut model,
            mut optimizer,
            mut source,
            validation,
            mut scheduler,
            composer,
            store,
            log,
            ..
        } = self;

        let capable = model.uses_attention();
        let mut stopping = EarlyStopping::new(config.min_epochs, config.patience, config.max_epochs)?;
        let mut best: Option<Checkpoint<M>> = None;
        let mut training_history = Vec::new();
        let mut optimizer_steps  = 0usize;

        loop {
            // ── Ingest + shuffle ──────────────────────────────────────────────
            let (examples, labels) = source.materialize_epoch()?;
            let batches = scheduler.schedule(examples, labels)?;
            let total   = batches.len();

            // ── Batches ───────────────────────────────────────────────────────
            let mut loss_sum = 0.0f64;
            let mut seen     = 0usize;
            for (i, batch) in batches.iter().enumerate() {
                let (next, batch_loss) =
                    train_batch::<B, M, O>(model, &mut optimizer, &composer, capable, config.learning_rate, batch)?;
                model = next;
                loss_sum        += batch_loss;
                seen            += batch.len();
                optimizer_steps += 1;

                if (i + 1) % PROGRESS_EVERY == 0 || i + 1 == total {
                    tracing::debug!("Finished training {}/{} batches", i + 1, total);
                }
            }
            let train_loss = loss_sum / seen as f64;
            training_history.push(train_loss);

            // ── Validation (no autodiff) ──────────────────────────────────────
            let val_loss = validation_loss::<B::InnerBackend, _>(&model.valid(), &validation)?;

            // ── Stop check + checkpoint ───────────────────────────────────────
            let verdict = stopping.observe(val_loss);
            let epoch   = verdict.epoch;
            if !val_loss.is_finite() {
                tracing::warn!("Epoch {epoch}: validation loss is {val_loss}");
            }
            if verdict.improved {
                best = Some(CheckpointStore::capture(&model, epoch, val_loss));
            }

            let metrics = EpochMetrics::new(epoch, train_loss, val_loss);
            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4}{}",
                epoch,
                config.max_epochs,
                train_loss,
                val_loss,
                if verdict.improved { " | best" } else { "" },
            );
            if let Some(log) = &log {
                log.log(&metrics)?;
            }

            if verdict.stop {
                break;
            }
        }

        // ── Persist ───────────────────────────────────────────────────────────
        let best = best.ok_or_else(|| {
            TrainingError::Checkpoint("no epoch produced a usable validation loss".to_string())
        })?;
        let checkpoint_path = store.persist::<B, M>(&best)?;

        let report = TrainingReport {
            trained_epochs:       stopping.history().len(),
            best_epoch:           best.epoch,
            best_validation_loss: best.validation_loss,
            validation_history:   stopping.history().to_vec(),
            training_history,
            optimizer_steps,
            checkpoint_path,
        };
        tracing::info!(
            "Training complete after {} epochs; best epoch {} (validation loss {:.4})",
            report.trained_epochs,
            report.best_epoch,
            report.best_validation_loss,
        );

        Ok(TrainingOutcome { report, best_model: best.model, final_model: model })
    }
}

/// Forward every pair, sum the losses, take one optimizer step.
fn train_batch<B, M, O>(
    model:     M,
    optimizer: &mut O,
    composer:  &LossComposer,
    capable:   bool,
    lr:        f64,
    batch:     &Batch<'_>,
) -> Result<(M, f64)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + RationaleClassifier<B>,
    O: Optimizer<M, B>,
{
    let mut total: Option<Tensor<B, 1>> = None;
    for (example, label) in batch.iter() {
        let prediction = model.forward_example(example)?;
        let loss = composer.compose(prediction, label, example, capable)?;
        total = Some(match total {
            Some(sum) => sum + loss,
            None      => loss,
        });
    }
    let total = total.ok_or_else(|| TrainingError::shape("cannot train on an empty batch"))?;

    let batch_loss: f64 = total.clone().into_scalar().elem::<f64>();
    let grads = GradientsParams::from_grads(total.backward(), &model);
    let model = optimizer.step(lr, model, grads);
    Ok((model, batch_loss))
}

/// Mean label-only loss over the validation set, in evaluation mode.
pub fn validation_loss<B, M>(model: &M, validation: &LabelledExamples) -> Result<f64>
where
    B: Backend,
    M: RationaleClassifier<B>,
{
    if validation.is_empty() {
        return Err(TrainingError::config("validation set is empty"));
    }
    let mut sum = 0.0f64;
    for (example, label) in validation.iter() {
        let prediction = model.forward_example(example)?;
        sum += binary_cross_entropy(prediction.output, label)
            .into_scalar()
            .elem::<f64>();
    }
    Ok(sum / validation.len() as f64)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArray, Autodiff};
    use crate::domain::example::{Example, FieldValue, RATIONALE_WITH_UNK_FIELD};
    use crate::ml::model::{AttentionClassifier, AttentionClassifierConfig};

    type TestBackend = Autodiff<NdArray<f32>>;
    type TestModel   = AttentionClassifier<TestBackend>;

    fn model(use_attention: bool) -> TestModel {
        AttentionClassifierConfig::new(12)
            .with_embed_dim(4)
            .with_hidden_dim(4)
            .with_use_attention(use_attention)
            .init(&Default::default())
    }

    fn data(n: usize) -> LabelledExamples {
        let examples = (0..n)
            .map(|i| {
                Example::from_tokens(vec![1, (i % 10 + 2) as i64, 3])
                    .with_field(RATIONALE_WITH_UNK_FIELD, FieldValue::Reals(vec![0.2, 0.6, 0.2]))
            })
            .collect();
        let labels = (0..n).map(|i| (i % 2) as f32).collect();
        LabelledExamples::new(examples, labels).unwrap()
    }

    fn session(
        config: SessionConfig,
        model:  TestModel,
        dir:    &tempfile::TempDir,
    ) -> Result<TrainingSession<TestBackend, TestModel, OptimizerAdaptor<Adam, TestModel, TestBackend>>> {
        TrainingSession::new(
            config,
            model,
            adam_optimizer(),
            DatasetSource::fixed(data(6))?,
            data(4),
            CheckpointStore::new(dir.path())?,
        )
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.patience, 4);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let bad = [
            SessionConfig { batch_size: 0, ..Default::default() },
            SessionConfig { max_epochs: 0, ..Default::default() },
            SessionConfig { learning_rate: 0.0, ..Default::default() },
            SessionConfig { attention_loss_weight: f64::NAN, ..Default::default() },
            SessionConfig { verbose: true, log_path: None, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(TrainingError::Config(_))), "{config:?}");
        }
    }

    #[test]
    fn test_rationale_needs_attention_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig { use_rationale: true, ..Default::default() };
        assert!(matches!(session(config, model(false), &dir), Err(TrainingError::Capability(_))));
    }

    #[test]
    fn test_steps_match_batch_count() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            max_epochs: 3,
            min_epochs: 3,
            batch_size: 4,
            use_rationale: true,
            seed: Some(1),
            ..Default::default()
        };
        let outcome = session(config, model(true), &dir).unwrap().run().unwrap();
        // 6 examples in batches of 4 → 2 steps per epoch
        assert_eq!(outcome.report.trained_epochs, 3);
        assert_eq!(outcome.report.optimizer_steps, 6);
        assert_eq!(outcome.report.training_history.len(), 3);
        assert!(outcome.report.checkpoint_path.exists());
    }

    #[test]
    fn test_validation_loss_is_mean_label_loss() {
        let model = model(true).valid();
        let validation = data(4);
        let loss = validation_loss(&model, &validation).unwrap();

        let mut expected = 0.0;
        for (example, label) in validation.iter() {
            let p: f64 = model.forward_example(example).unwrap().output.into_scalar().elem();
            let label = label as f64;
            expected -= label * p.ln() + (1.0 - label) * (1.0 - p).ln();
        }
        expected /= 4.0;
        assert!((loss - expected).abs() < 1e-5, "{loss} vs {expected}");
    }
}
