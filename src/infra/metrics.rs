// ============================================================
// Layer 6 — Training Log
// ============================================================
// Appends one human-readable line per epoch when a session
// runs verbose:
//
//   Epoch 1: training loss: 0.6931, validation loss: 0.6812
//   Epoch 2: training loss: 0.6120, validation loss: 0.6204
//
// The file is opened in append mode for every line, so several
// runs can share one log and a crash never loses earlier epochs.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::error::Result;

/// Losses recorded for a single epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch: usize,

    /// Mean composed loss per training example
    pub train_loss: f64,

    /// Mean label-only loss per validation example
    pub val_loss: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// The line written to the training log.
    pub fn log_line(&self) -> String {
        format!(
            "Epoch {}: training loss: {:.4}, validation loss: {:.4}",
            self.epoch, self.train_loss, self.val_loss
        )
    }
}

/// Per-epoch text log.
#[derive(Debug, Clone)]
pub struct TrainingLog {
    path: PathBuf,
}

impl TrainingLog {
    /// Create the parent directory if needed. Existing content is kept.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{}", m.log_line())?;
        tracing::debug!("Logged epoch {} to '{}'", m.epoch, self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line_format() {
        let m = EpochMetrics::new(3, 0.123456, 1.0);
        assert_eq!(m.log_line(), "Epoch 3: training loss: 0.1235, validation loss: 1.0000");
    }

    #[test]
    fn test_lines_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrainingLog::new(dir.path().join("logs").join("train.txt")).unwrap();
        log.log(&EpochMetrics::new(1, 0.5, 0.6)).unwrap();
        log.log(&EpochMetrics::new(2, 0.4, 0.55)).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec![
            "Epoch 1: training loss: 0.5000, validation loss: 0.6000",
            "Epoch 2: training loss: 0.4000, validation loss: 0.5500",
        ]);
    }
}
