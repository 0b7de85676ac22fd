// ============================================================
// Layer 5 — Loss Composer
// ============================================================
// Per-example training loss:
//
//   loss = BCE(output, label)
//        + λ · KL(target ‖ attention)     ← only when the gate opens
//
// The attention term is gated by three independent conditions,
// kept as an explicit decision table (AttentionGate::decide):
//
//   attention-capable │ rationale on │ target present │ gate
//   ──────────────────┼──────────────┼────────────────┼────────────
//          yes        │     yes      │      yes       │ Apply
//           *         │     no       │       *        │ Disabled
//          no         │     yes      │       *        │ NoAttention
//          yes        │     yes      │      no        │ NoTarget
//
// "Target present" means the example carries a distribution for
// the session's rationale variant. The other variant's field is
// never read.
//
// KL uses sum reduction with the target as reference:
//   KL(t ‖ a) = Σ t_i · (ln t_i − ln a_i),   0 · ln 0 = 0
//
// BCE floors its log arguments the same way as attention, so a
// saturated output gives a large finite loss and a finite gradient.

use burn::{prelude::*, tensor::TensorData};

use crate::domain::{
    error::{Result, TrainingError},
    example::{Example, Label, RationaleVariant},
};
use crate::ml::model::Prediction;

const PROBABILITY_FLOOR: f64 = 1e-12;

// ─── AttentionGate ────────────────────────────────────────────────────────────
/// Outcome of the attention-term decision table for one example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionGate {
    /// Every condition holds; the KL term is added.
    Apply,
    /// Rationale supervision is off for this session.
    Disabled,
    /// The model produces no attention distribution.
    NoAttention,
    /// The example has no target for the configured variant.
    NoTarget,
}

impl AttentionGate {
    pub fn decide(attention_capable: bool, rationale_enabled: bool, has_target: bool) -> Self {
        match (attention_capable, rationale_enabled, has_target) {
            (true, true, true)   => AttentionGate::Apply,
            (_, false, _)        => AttentionGate::Disabled,
            (false, true, _)     => AttentionGate::NoAttention,
            (true, true, false)  => AttentionGate::NoTarget,
        }
    }

    pub fn applies(self) -> bool {
        self == AttentionGate::Apply
    }
}

// ─── LossComposer ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct LossComposer {
    rationale_enabled: bool,
    variant:           RationaleVariant,
    attention_weight:  f64,
}

impl LossComposer {
    pub fn new(rationale_enabled: bool, variant: RationaleVariant, attention_weight: f64) -> Self {
        Self { rationale_enabled, variant, attention_weight }
    }

    /// Gate decision for one example, without computing anything.
    pub fn gate(&self, attention_capable: bool, example: &Example) -> AttentionGate {
        let has_target = self.rationale_enabled && example.rationale(self.variant).is_some();
        AttentionGate::decide(attention_capable, self.rationale_enabled, has_target)
    }

    /// Composite training loss for one example, shape [1].
    pub fn compose<B: Backend>(
        &self,
        prediction:        Prediction<B>,
        label:             Label,
        example:           &Example,
        attention_capable: bool,
    ) -> Result<Tensor<B, 1>> {
        let label_loss = binary_cross_entropy(prediction.output, label);

        let target = if self.rationale_enabled {
            example.rationale(self.variant)
        } else {
            None
        };
        let gate = AttentionGate::decide(attention_capable, self.rationale_enabled, target.is_some());

        match (gate, target) {
            (AttentionGate::Apply, Some(target)) => {
                let attention = prediction.attention.ok_or_else(|| {
                    TrainingError::capability(
                        "model reports attention capability but returned no attention",
                    )
                })?;
                let kl = kl_divergence(&target, attention)?;
                Ok(label_loss + kl.mul_scalar(self.attention_weight))
            }
            _ => Ok(label_loss),
        }
    }
}

// ─── Loss terms ───────────────────────────────────────────────────────────────
/// Binary cross-entropy of a single probability against a 0/1 label.
pub fn binary_cross_entropy<B: Backend>(output: Tensor<B, 1>, label: Label) -> Tensor<B, 1> {
    let log_p = output.clone().clamp_min(PROBABILITY_FLOOR).log();
    let log_q = output.neg().add_scalar(1.0).clamp_min(PROBABILITY_FLOOR).log();
    (log_p.mul_scalar(label) + log_q.mul_scalar(1.0 - label)).neg()
}

/// Sum-reduced KL(target ‖ attention), shape [1].
pub fn kl_divergence<B: Backend>(target: &[f32], attention: Tensor<B, 1>) -> Result<Tensor<B, 1>> {
    let [len] = attention.dims();
    if len != target.len() {
        return Err(TrainingError::shape(format!(
            "rationale target has {} positions but attention has {len}",
            target.len()
        )));
    }

    // Σ t ln t depends only on the data, so it is a constant
    let entropy_part: f64 = target
        .iter()
        .filter(|&&t| t > 0.0)
        .map(|&t| t as f64 * (t as f64).ln())
        .sum();

    let device = attention.device();
    let target = Tensor::<B, 1>::from_data(TensorData::new(target.to_vec(), [len]), &device);
    let cross  = (target * attention.clamp_min(PROBABILITY_FLOOR).log()).sum();

    Ok(cross.neg().add_scalar(entropy_part))
}
