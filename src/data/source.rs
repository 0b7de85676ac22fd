// ============================================================
// Layer 4 — Dataset Source
// ============================================================
// Training data comes from exactly one of two places:
//
//   Fixed      — examples and labels held in memory, reused
//                every epoch
//   Streaming  — a ChunkProducer pulled `pulls_per_epoch`
//                times per epoch; the chunks are concatenated
//                field by field and converted to records
//
// Either way the training loop sees the same thing:
// materialize_epoch() → (&[Example], &[Label]).

use std::fmt;

use crate::data::adapter::to_labelled;
use crate::domain::{
    error::{Result, TrainingError},
    example::{Example, Label, LabelledChunk, LabelledExamples},
    traits::ChunkProducer,
};

/// Where a training session gets each epoch's data.
pub enum DatasetSource {
    Fixed(LabelledExamples),
    Streaming {
        producer:        Box<dyn ChunkProducer>,
        pulls_per_epoch: usize,
        /// Data of the epoch most recently pulled.
        current:         LabelledExamples,
    },
}

impl fmt::Debug for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Fixed(data) => f
                .debug_struct("Fixed")
                .field("examples", &data.len())
                .finish(),
            DatasetSource::Streaming { pulls_per_epoch, .. } => f
                .debug_struct("Streaming")
                .field("pulls_per_epoch", pulls_per_epoch)
                .finish_non_exhaustive(),
        }
    }
}

impl DatasetSource {
    /// An in-memory training set.
    pub fn fixed(data: LabelledExamples) -> Result<Self> {
        if data.is_empty() {
            return Err(TrainingError::config("fixed training set is empty"));
        }
        Ok(DatasetSource::Fixed(data))
    }

    /// A streamed training set pulled `pulls_per_epoch` chunks at a time.
    pub fn streaming(producer: Box<dyn ChunkProducer>, pulls_per_epoch: usize) -> Result<Self> {
        if pulls_per_epoch == 0 {
            return Err(TrainingError::config("pulls per epoch must be at least 1"));
        }
        Ok(DatasetSource::Streaming {
            producer,
            pulls_per_epoch,
            current: LabelledExamples::default(),
        })
    }

    /// Build from optional parts, requiring exactly one mode.
    pub fn from_parts(
        fixed:     Option<LabelledExamples>,
        streaming: Option<(Box<dyn ChunkProducer>, usize)>,
    ) -> Result<Self> {
        match (fixed, streaming) {
            (Some(data), None)                => Self::fixed(data),
            (None, Some((producer, pulls)))   => Self::streaming(producer, pulls),
            (Some(_), Some(_)) => Err(TrainingError::config(
                "both a fixed training set and a streaming producer were supplied",
            )),
            (None, None) => Err(TrainingError::config(
                "neither a fixed training set nor a streaming producer was supplied",
            )),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, DatasetSource::Streaming { .. })
    }

    /// Data for the coming epoch. Streaming sources pull fresh chunks;
    /// a failed pull is returned as-is and ends the session.
    pub fn materialize_epoch(&mut self) -> Result<(&[Example], &[Label])> {
        match self {
            DatasetSource::Fixed(data) => Ok((data.examples(), data.labels())),
            DatasetSource::Streaming { producer, pulls_per_epoch, current } => {
                let mut chunks = Vec::with_capacity(*pulls_per_epoch);
                for _ in 0..*pulls_per_epoch {
                    chunks.push(producer.next_chunk()?);
                }
                *current = to_labelled(concat_chunks(chunks))?;
                tracing::debug!(
                    "Pulled {} chunks → {} training examples",
                    pulls_per_epoch,
                    current.len()
                );
                Ok((current.examples(), current.labels()))
            }
        }
    }
}

/// Concatenate chunks field by field, preserving order.
pub fn concat_chunks(chunks: Vec<LabelledChunk>) -> LabelledChunk {
    let mut merged = LabelledChunk::default();
    for chunk in chunks {
        for (name, values) in chunk.features {
            merged.features.entry(name).or_default().extend(values);
        }
        merged.labels.extend(chunk.labels);
    }
    merged
}
