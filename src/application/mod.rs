// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: load data, build the model, hand
// everything to the ml layer. No tensor code and no printing
// here (printing belongs to Layer 1).

// The training workflow
pub mod train_use_case;

// Scoring data with a trained checkpoint
pub mod predict_use_case;
