// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands: `train` and `predict`.
//
// Training data comes from exactly one of --train-data (a
// columnar JSON file) or --train-stream (a JSON-lines file of
// chunks, pulled --pulls-per-epoch at a time).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::example::RationaleVariant;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier and save its best checkpoint
    Train(TrainArgs),

    /// Score a data file with a trained checkpoint
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Columnar JSON training file
    #[arg(long, conflicts_with = "train_stream", required_unless_present = "train_stream")]
    pub train_data: Option<PathBuf>,

    /// JSON-lines file of training chunks
    #[arg(long)]
    pub train_stream: Option<PathBuf>,

    /// Chunks pulled from the stream for each epoch
    #[arg(long, default_value_t = 1)]
    pub pulls_per_epoch: usize,

    /// Start the stream over when it runs out
    #[arg(long)]
    pub cycle_stream: bool,

    /// Columnar JSON validation file
    #[arg(long)]
    pub validation_data: PathBuf,

    /// Where the best checkpoint and configs are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Per-epoch log file (defaults to <checkpoint-dir>/training_log.txt with --verbose)
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub max_epochs: usize,

    /// Epochs without improvement before stopping
    #[arg(long, default_value_t = 4)]
    pub patience: usize,

    /// Epochs that always run before early stopping may trigger
    #[arg(long, default_value_t = 2)]
    pub min_epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 0.003)]
    pub lr: f64,

    /// Weight of the attention/rationale KL term
    #[arg(long, default_value_t = 4.0)]
    pub attention_loss_weight: f64,

    /// Align attention with rationale targets
    #[arg(long)]
    pub use_rationale: bool,

    /// Rationale target: with-unk or exclude-unk
    #[arg(long, default_value = "with-unk")]
    pub rationale_variant: RationaleVariant,

    /// Write one line per epoch to the training log
    #[arg(long)]
    pub verbose: bool,

    /// Seed for the per-epoch shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 64)]
    pub embed_dim: usize,

    #[arg(long, default_value_t = 64)]
    pub hidden_dim: usize,

    /// Auxiliary feature length (read off the validation data if omitted)
    #[arg(long)]
    pub feature_dim: Option<usize>,

    /// Build the classifier without attention pooling
    #[arg(long)]
    pub no_attention: bool,

    /// Keep the embedding table fixed during training
    #[arg(long)]
    pub freeze_embeddings: bool,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_data:            a.train_data,
            train_stream:          a.train_stream,
            pulls_per_epoch:       a.pulls_per_epoch,
            cycle_stream:          a.cycle_stream,
            validation_data:       a.validation_data,
            checkpoint_dir:        a.checkpoint_dir,
            log_path:              a.log_path,
            max_epochs:            a.max_epochs,
            patience:              a.patience,
            min_epochs:            a.min_epochs,
            batch_size:            a.batch_size,
            lr:                    a.lr,
            attention_loss_weight: a.attention_loss_weight,
            use_rationale:         a.use_rationale,
            rationale_variant:     a.rationale_variant,
            verbose:               a.verbose,
            seed:                  a.seed,
            vocab_size:            a.vocab_size,
            embed_dim:             a.embed_dim,
            hidden_dim:            a.hidden_dim,
            feature_dim:           a.feature_dim,
            use_attention:         !a.no_attention,
            freeze_embeddings:     a.freeze_embeddings,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Columnar JSON file to score
    #[arg(long)]
    pub data: PathBuf,

    /// Directory written by `train`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Also output each example's attention vector
    #[arg(long)]
    pub attention: bool,
}
