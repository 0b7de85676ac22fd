// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// All tensor code lives here. The other layers only see plain
// Rust types (Example, Label, configs, reports).
//
//   backend.rs   — backend aliases (NdArray by default, Wgpu
//                  behind the `wgpu` feature)
//   model.rs     — RationaleClassifier seam + the bundled
//                  attention classifier
//   loss.rs      — BCE + gated, weighted KL attention term
//   stopping.rs  — early-stopping policy
//   trainer.rs   — TrainingSession: epochs, batches, Adam
//                  steps, validation, best checkpoint
//   predictor.rs — inference over columnar batches

/// Backend type aliases and device selection
pub mod backend;

/// Classifier trait and bundled attention model
pub mod model;

/// Per-example composite loss
pub mod loss;

/// Patience-based early stopping
pub mod stopping;

/// Training session orchestration
pub mod trainer;

/// Inference-mode scoring
pub mod predictor;
