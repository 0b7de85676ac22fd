// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that every other layer speaks:
//
//   example.rs — Example records, field values, labels,
//                columnar chunks and rationale variants
//   error.rs   — The TrainingError taxonomy
//   traits.rs  — Seams implemented by other layers
//                (streaming chunk producers)
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums and traits

/// Examples, labels, columnar chunks and rationale variants
pub mod example;

/// Error taxonomy shared by the library layers
pub mod error;

/// Abstractions that other layers implement
pub mod traits;
