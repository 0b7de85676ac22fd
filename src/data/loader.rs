// ============================================================
// Layer 4 — Data File Loader
// ============================================================
// Two on-disk formats, both built from LabelledChunk:
//
//   Columnar JSON file (fixed mode, validation, prediction):
//     { "features": { "<field>": [v0, v1, ...], ... },
//       "labels":   [y0, y1, ...] }
//
//   JSON-lines file (streaming mode):
//     one LabelledChunk per line; JsonlChunkProducer hands
//     them out one pull at a time. With `cycle` on, reaching
//     the end of the file starts again from the top.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::data::adapter::to_labelled;
use crate::domain::{
    error::{Result, TrainingError},
    example::{LabelledChunk, LabelledExamples},
    traits::ChunkProducer,
};

/// Read a columnar JSON file into a LabelledChunk.
pub fn load_chunk(path: impl AsRef<Path>) -> Result<LabelledChunk> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        TrainingError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open data file '{}': {e}", path.display()),
        ))
    })?;
    let chunk: LabelledChunk = serde_json::from_reader(BufReader::new(file))?;
    tracing::debug!(
        "Loaded '{}': {} fields, {} labels",
        path.display(),
        chunk.features.len(),
        chunk.labels.len()
    );
    Ok(chunk)
}

/// Read a columnar JSON file straight into labelled examples.
pub fn load_labelled(path: impl AsRef<Path>) -> Result<LabelledExamples> {
    to_labelled(load_chunk(path)?)
}

// ─── JsonlChunkProducer ───────────────────────────────────────────────────────
/// Streams LabelledChunks from a JSON-lines file.
pub struct JsonlChunkProducer {
    path:   PathBuf,
    lines:  std::io::Lines<BufReader<File>>,
    cycle:  bool,
    pulled: usize,
    line:   usize,
}

impl JsonlChunkProducer {
    pub fn open(path: impl Into<PathBuf>, cycle: bool) -> Result<Self> {
        let path  = path.into();
        let lines = open_lines(&path)?;
        Ok(Self { path, lines, cycle, pulled: 0, line: 0 })
    }

    /// Number of chunks handed out so far.
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    fn rewind(&mut self) -> Result<()> {
        tracing::debug!("Rewinding '{}' after {} chunks", self.path.display(), self.pulled);
        self.lines = open_lines(&self.path)?;
        self.line  = 0;
        Ok(())
    }
}

fn open_lines(path: &Path) -> Result<std::io::Lines<BufReader<File>>> {
    let file = File::open(path).map_err(|e| {
        TrainingError::Producer(format!("cannot open '{}': {e}", path.display()))
    })?;
    Ok(BufReader::new(file).lines())
}

impl ChunkProducer for JsonlChunkProducer {
    fn next_chunk(&mut self) -> Result<LabelledChunk> {
        let mut rewound = false;
        loop {
            match self.lines.next() {
                Some(line) => {
                    let line = line?;
                    self.line += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let chunk = serde_json::from_str(&line).map_err(|e| {
                        TrainingError::Producer(format!(
                            "{}:{}: invalid chunk: {e}",
                            self.path.display(),
                            self.line
                        ))
                    })?;
                    self.pulled += 1;
                    return Ok(chunk);
                }
                // A second rewind in one pull means the file holds no chunks
                None if self.cycle && !rewound => {
                    self.rewind()?;
                    rewound = true;
                }
                None => {
                    return Err(TrainingError::ProducerExhausted { pulled: self.pulled });
                }
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CHUNK_A: &str = r#"{"features": {"word_content_input": [[1, 2], [3]]}, "labels": [0, 1]}"#;
    const CHUNK_B: &str = r#"{"features": {"word_content_input": [[4]]}, "labels": [1]}"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_labelled_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "train.json", CHUNK_A);
        let data = load_labelled(&path).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.labels(), &[0.0, 1.0]);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_chunk(dir.path().join("nope.json")),
            Err(TrainingError::Io(_))
        ));
    }

    #[test]
    fn test_producer_without_cycle_runs_dry() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "stream.jsonl", &format!("{CHUNK_A}\n\n{CHUNK_B}\n"));
        let mut producer = JsonlChunkProducer::open(&path, false).unwrap();

        assert_eq!(producer.next_chunk().unwrap().labels, vec![0.0, 1.0]);
        assert_eq!(producer.next_chunk().unwrap().labels, vec![1.0]);
        assert!(matches!(
            producer.next_chunk(),
            Err(TrainingError::ProducerExhausted { pulled: 2 })
        ));
    }

    #[test]
    fn test_cycling_producer_starts_over() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "stream.jsonl", &format!("{CHUNK_A}\n{CHUNK_B}\n"));
        let mut producer = JsonlChunkProducer::open(&path, true).unwrap();

        let labels: Vec<usize> = (0..5).map(|_| producer.next_chunk().unwrap().labels.len()).collect();
        assert_eq!(labels, vec![2, 1, 2, 1, 2]);
        assert_eq!(producer.pulled(), 5);
    }

    #[test]
    fn test_cycling_empty_file_still_fails() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.jsonl", "\n");
        let mut producer = JsonlChunkProducer::open(&path, true).unwrap();
        assert!(producer.next_chunk().is_err());
    }

    #[test]
    fn test_malformed_line_names_its_position() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.jsonl", &format!("{CHUNK_A}\nnot json\n"));
        let mut producer = JsonlChunkProducer::open(&path, false).unwrap();
        producer.next_chunk().unwrap();
        match producer.next_chunk() {
            Err(TrainingError::Producer(msg)) => assert!(msg.contains(":2:")),
            other => panic!("expected a producer error, got {other:?}"),
        }
    }
}
