// ============================================================
// Layer 5 — Early Stopping Policy
// ============================================================
// Fed one validation loss per epoch, in order. Answers two
// questions after each epoch: did it improve on the best so
// far, and should training stop now?
//
//   improved  ⇔ loss ≤ best            (ties count; NaN never does)
//   counter   = 0 on improvement, += 1 otherwise
//   stop      ⇔ (epoch > min_epochs ∧ counter ≥ patience)
//               ∨ epoch ≥ max_epochs
//
// Example: losses [0.9, 0.85, 0.86, 0.87], patience 2, min 2
//
//   epoch │ loss │ best │ counter │ stop
//   ──────┼──────┼──────┼─────────┼──────
//     1   │ 0.90 │ 0.90 │    0    │  no
//     2   │ 0.85 │ 0.85 │    0    │  no
//     3   │ 0.86 │ 0.85 │    1    │  no
//     4   │ 0.87 │ 0.85 │    2    │  yes   → best epoch 2

use crate::domain::error::{Result, TrainingError};

/// The policy's answer for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochVerdict {
    /// 1-based epoch number the verdict belongs to.
    pub epoch:    usize,
    pub improved: bool,
    pub stop:     bool,
}

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    min_epochs: usize,
    patience:   usize,
    max_epochs: usize,
    counter:    usize,
    best:       f64,
    best_epoch: Option<usize>,
    history:    Vec<f64>,
}

impl EarlyStopping {
    pub fn new(min_epochs: usize, patience: usize, max_epochs: usize) -> Result<Self> {
        if max_epochs == 0 {
            return Err(TrainingError::config("max epochs must be at least 1"));
        }
        Ok(Self {
            min_epochs,
            patience,
            max_epochs,
            counter: 0,
            best: f64::INFINITY,
            best_epoch: None,
            history: Vec::new(),
        })
    }

    /// Record the validation loss of the next epoch.
    pub fn observe(&mut self, loss: f64) -> EpochVerdict {
        self.history.push(loss);
        let epoch = self.history.len();

        let improved = loss <= self.best;
        if improved {
            self.best       = loss;
            self.best_epoch = Some(epoch);
            self.counter    = 0;
        } else {
            self.counter += 1;
        }

        let stop = (epoch > self.min_epochs && self.counter >= self.patience)
            || epoch >= self.max_epochs;

        EpochVerdict { epoch, improved, stop }
    }

    /// Lowest loss seen so far (infinity before the first improvement).
    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn epochs_without_improvement(&self) -> usize {
        self.counter
    }
}
