// ============================================================
// Layer 5 — Classifier Model
// ============================================================
// The training engine treats the model as a black box behind
// the RationaleClassifier trait:
//
//   forward_example(example) → { output: p in [0,1],
//                                attention: Option<distribution> }
//
// Train mode is the model on an AutodiffBackend; evaluation
// mode is model.valid() on the inner backend, which tracks no
// gradients. Frozen parameters are ones built with no_grad().
//
// AttentionClassifier is the bundled implementation. Trailing
// PADDING_ID tokens are dropped before embedding, so attention
// spans only the real tokens of a padded sequence:
//
//   token ids ──► Embedding ──► Linear + tanh ──► hidden [n, h]
//                                                   │
//                      attention scorer (optional)  │
//                      softmax over positions ──────┤
//                                                   ▼
//                             pooled [1, h] ++ auxiliary features
//                                                   │
//                                         Linear ──► sigmoid

use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::{
        activation::{sigmoid, softmax},
        TensorData,
    },
};

use crate::domain::{
    error::TrainingError,
    example::Example,
};

// ─── Model seam ───────────────────────────────────────────────────────────────
/// The model's output for one example.
#[derive(Debug, Clone)]
pub struct Prediction<B: Backend> {
    /// Positive-class probability, shape [1].
    pub output: Tensor<B, 1>,
    /// Attention distribution over token positions, shape [n].
    /// `None` for models without attention.
    pub attention: Option<Tensor<B, 1>>,
}

/// A sequence classifier the training engine can drive.
pub trait RationaleClassifier<B: Backend>: Module<B> {
    /// Whether forward passes produce an attention distribution.
    fn uses_attention(&self) -> bool;

    /// Run the model on a single, un-batched example.
    fn forward_example(&self, example: &Example) -> crate::domain::error::Result<Prediction<B>>;
}

/// Token id used to pad sequences to a common length.
pub const PADDING_ID: i64 = 0;

// ─── Configuration ────────────────────────────────────────────────────────────
// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct AttentionClassifierConfig {
    pub vocab_size: usize,
    #[config(default = 64)]
    pub embed_dim: usize,
    #[config(default = 64)]
    pub hidden_dim: usize,
    /// Total length of the auxiliary feature vector (0 = none).
    #[config(default = 0)]
    pub feature_dim: usize,
    #[config(default = true)]
    pub use_attention: bool,
    /// Keep the embedding table fixed during training.
    #[config(default = false)]
    pub freeze_embeddings: bool,
}

impl AttentionClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionClassifier<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device);
        let embedding = if self.freeze_embeddings {
            embedding.no_grad()
        } else {
            embedding
        };
        let projection = LinearConfig::new(self.embed_dim, self.hidden_dim).init(device);
        let attention  = self
            .use_attention
            .then(|| LinearConfig::new(self.hidden_dim, 1).init(device));
        let head = LinearConfig::new(self.hidden_dim + self.feature_dim, 1).init(device);

        AttentionClassifier {
            embedding,
            projection,
            attention,
            head,
            vocab_size:  self.vocab_size,
            feature_dim: self.feature_dim,
        }
    }
}

// ─── AttentionClassifier ──────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct AttentionClassifier<B: Backend> {
    pub embedding:   Embedding<B>,
    pub projection:  Linear<B>,
    pub attention:   Option<Linear<B>>,
    pub head:        Linear<B>,
    pub vocab_size:  usize,
    pub feature_dim: usize,
}

impl<B: Backend> AttentionClassifier<B> {
    fn checked_ids(&self, example: &Example) -> crate::domain::error::Result<Vec<i32>> {
        let ids = example.token_ids()?;
        let len = ids.iter().rposition(|&id| id != PADDING_ID).map_or(0, |last| last + 1);
        let ids = &ids[..len];
        if ids.is_empty() {
            return Err(TrainingError::shape("example has no tokens besides padding"));
        }
        ids.iter()
            .map(|&id| {
                if id < 0 || id as usize >= self.vocab_size {
                    Err(TrainingError::shape(format!(
                        "token id {id} outside vocabulary of {}",
                        self.vocab_size
                    )))
                } else {
                    Ok(id as i32)
                }
            })
            .collect()
    }
}

impl<B: Backend> RationaleClassifier<B> for AttentionClassifier<B> {
    fn uses_attention(&self) -> bool {
        self.attention.is_some()
    }

    fn forward_example(&self, example: &Example) -> crate::domain::error::Result<Prediction<B>> {
        let ids    = self.checked_ids(example)?;
        let n      = ids.len();
        let device = self.head.weight.val().device();

        let input = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &device).reshape([1, n]);
        let embedded = self.embedding.forward(input);           // [1, n, e]
        let hidden   = self.projection.forward(embedded).tanh(); // [1, n, h]
        let [_, _, h] = hidden.dims();
        let hidden   = hidden.reshape([n, h]);

        let (pooled, attention) = match &self.attention {
            Some(scorer) => {
                let scores  = scorer.forward(hidden.clone()).reshape([1, n]);
                let weights = softmax(scores, 1);                // [1, n]
                let pooled  = weights.clone().matmul(hidden);    // [1, h]
                (pooled, Some(weights.reshape([n])))
            }
            None => (hidden.mean_dim(0), None),
        };

        let features = example.auxiliary_features();
        if features.len() != self.feature_dim {
            return Err(TrainingError::shape(format!(
                "expected {} auxiliary feature values, example has {}",
                self.feature_dim,
                features.len()
            )));
        }
        let pooled = if self.feature_dim > 0 {
            let features = Tensor::<B, 2>::from_data(
                TensorData::new(features, [1, self.feature_dim]),
                &device,
            );
            Tensor::cat(vec![pooled, features], 1)
        } else {
            pooled
        };

        let output = sigmoid(self.head.forward(pooled)).reshape([1]);
        Ok(Prediction { output, attention })
    }
}
