// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure in the library layers is one of:
//
//   Config      — contradictory or invalid construction arguments
//   Shape       — mismatched lengths, incompatible checkpoints
//   Capability  — attention asked of a model that has none
//   Producer    — the streaming producer failed or ran dry
//   Checkpoint  — the weight recorder could not save/load
//   Tensor      — tensor data could not be read back
//   Io / Json   — filesystem and serialisation errors
//
// All of them are terminal to the call that raised them.
// The application layer wraps them in anyhow for reporting.

/// Errors raised while preparing data, training or predicting.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    /// Invalid or contradictory construction arguments.
    #[error("configuration error: {0}")]
    Config(String),

    /// Lengths or shapes that do not line up.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// The model cannot provide what was asked of it.
    #[error("capability error: {0}")]
    Capability(String),

    /// The streaming producer has no more chunks to give.
    #[error("data producer exhausted after {pulled} chunk(s)")]
    ProducerExhausted { pulled: usize },

    /// The streaming producer failed for any other reason.
    #[error("data producer failed: {0}")]
    Producer(String),

    /// Saving or loading model weights failed.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// Tensor data could not be converted back to host values.
    #[error("tensor error: {0}")]
    Tensor(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the library layers.
pub type Result<T> = std::result::Result<T, TrainingError>;

impl TrainingError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }
}
