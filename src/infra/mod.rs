// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the ml and application layers:
//
//   checkpoint.rs — best-model snapshot, persisted with Burn's
//                   NamedMpkFileRecorder; also stores the model
//                   and training configs as JSON so inference
//                   can rebuild the model.
//
//   metrics.rs    — optional per-epoch training log.
//
//   runtime.rs    — one-time process setup (single-thread pool).

/// Best-checkpoint capture, persistence and loading
pub mod checkpoint;

/// Per-epoch training log
pub mod metrics;

/// Process-wide runtime setup
pub mod runtime;
