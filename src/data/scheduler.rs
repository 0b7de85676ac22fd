// ============================================================
// Layer 4 — Minibatch Scheduler
// ============================================================
// Once per epoch: draw a uniformly random permutation of the
// training indices, apply it to examples and labels together,
// then cut the shuffled sequence into contiguous batches.
//
//   n = 5, batch_size = 2
//   permutation: [3, 0, 4, 1, 2]
//   batches:     [(x3,y3), (x0,y0)] [(x4,y4), (x1,y1)] [(x2,y2)]
//
// Examples and labels are shuffled through the same index list
// so a label never drifts away from its example.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::{
    error::{Result, TrainingError},
    example::{Example, Label},
};

// ─── Batch ────────────────────────────────────────────────────────────────────
/// An ordered, non-empty run of (example, label) pairs.
/// Borrows the epoch's data; never larger than the batch size.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    items: Vec<(&'a Example, Label)>,
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a Example, Label)> + '_ {
        self.items.iter().copied()
    }
}

/// Number of batches an epoch of `n` examples splits into.
pub fn batch_count(n: usize, batch_size: usize) -> usize {
    n.div_ceil(batch_size)
}

// ─── MinibatchScheduler ───────────────────────────────────────────────────────
/// Owns the batch size and the RNG used for per-epoch permutations.
pub struct MinibatchScheduler {
    batch_size: usize,
    rng:        StdRng,
}

impl MinibatchScheduler {
    /// Create a scheduler. A seed makes the permutations reproducible.
    pub fn new(batch_size: usize, seed: Option<u64>) -> Result<Self> {
        if batch_size == 0 {
            return Err(TrainingError::config("batch size must be at least 1"));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Ok(Self { batch_size, rng })
    }

    /// Shuffle and partition one epoch of data.
    ///
    /// Produces `ceil(n / batch_size)` batches; the last one holds the
    /// remainder, or a full batch when `n` divides evenly.
    pub fn schedule<'a>(
        &mut self,
        examples: &'a [Example],
        labels:   &[Label],
    ) -> Result<Vec<Batch<'a>>> {
        if examples.is_empty() {
            return Err(TrainingError::shape("cannot schedule an empty training set"));
        }
        if examples.len() != labels.len() {
            return Err(TrainingError::shape(format!(
                "{} examples but {} labels",
                examples.len(),
                labels.len()
            )));
        }

        let mut order: Vec<usize> = (0..examples.len()).collect();
        order.shuffle(&mut self.rng);

        let batches: Vec<Batch<'a>> = order
            .chunks(self.batch_size)
            .map(|chunk| Batch {
                items: chunk.iter().map(|&i| (&examples[i], labels[i])).collect(),
            })
            .collect();

        tracing::debug!(
            "Scheduled {} examples into {} batches of up to {}",
            examples.len(),
            batches.len(),
            self.batch_size,
        );
        Ok(batches)
    }
}
