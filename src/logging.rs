// src/logging.rs
//
// JSONL progress log for training runs.
//
// The projection loop emits one record per iteration; sinks decide where the
// records go. Logging is best-effort: a failed write never aborts training.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One projection-loop iteration (JSONL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    /// Norm of the remaining expert/projection gap.
    pub margin: f64,
    /// Distance from this iteration's candidate to the expert expectations.
    pub distance_to_expert: f64,
}

/// Destination for training progress records.
pub trait TrainingSink {
    fn log_iteration(&mut self, record: &IterationRecord);
}

/// Sink that drops every record.
#[derive(Debug, Default)]
pub struct NoopSink;

impl TrainingSink for NoopSink {
    fn log_iteration(&mut self, _record: &IterationRecord) {}
}

/// JSONL sink appending to a file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrainingSink for FileSink {
    fn log_iteration(&mut self, record: &IterationRecord) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(self.writer, "{}", line);
            let _ = self.writer.flush();
        }
    }
}

/// Read a JSONL training log into memory, skipping blank or malformed lines.
pub fn read_training_log(path: &Path) -> std::io::Result<Vec<IterationRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<IterationRecord>(&line) {
            out.push(record);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_round_trips_records() {
        let path = std::env::temp_dir().join(format!("dialogsim-log-{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);

        {
            let mut sink = FileSink::create(&path).unwrap();
            for i in 0..3 {
                sink.log_iteration(&IterationRecord {
                    iteration: i,
                    margin: 1.0 / (i + 1) as f64,
                    distance_to_expert: 0.5,
                });
            }
        }

        let records = read_training_log(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].iteration, 2);
        let _ = std::fs::remove_file(&path);
    }
}
