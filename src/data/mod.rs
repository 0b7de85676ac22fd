// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between files on disk and the batches the
// training loop consumes:
//
//   JSON / JSON-lines files
//       │
//       ▼
//   loader            → LabelledChunk (columnar) per file/line
//       │
//       ▼
//   source            → fixed set, or N streamed chunks per epoch
//       │
//       ▼
//   adapter           → columns become per-example records
//       │
//       ▼
//   scheduler         → per-epoch shuffle + fixed-size batches
//
// No Burn types here; tensors are built by the model itself.

/// Columnar batch → per-example records
pub mod adapter;

/// Reads columnar JSON and JSON-lines chunk files
pub mod loader;

/// Shuffles each epoch and cuts it into minibatches
pub mod scheduler;

/// Fixed vs streaming training data
pub mod source;
