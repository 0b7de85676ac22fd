// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Seams between the training engine and the outside world
// that do not involve tensors. The model seam lives in the
// ml layer because it speaks Burn types.

use crate::domain::{
    error::Result,
    example::LabelledChunk,
};

// ─── ChunkProducer ────────────────────────────────────────────────────────────
/// A pull-based source of fixed-size columnar chunks, used when
/// the training set is streamed instead of held in memory.
///
/// Each training epoch pulls a fixed number of chunks. A pull that
/// fails (or finds the source exhausted) aborts the training session.
///
/// Implementations:
///   - JsonlChunkProducer → one chunk per line of a JSON-lines file
pub trait ChunkProducer {
    /// Pull the next chunk.
    fn next_chunk(&mut self) -> Result<LabelledChunk>;
}

impl<P: ChunkProducer + ?Sized> ChunkProducer for Box<P> {
    fn next_chunk(&mut self) -> Result<LabelledChunk> {
        (**self).next_chunk()
    }
}
