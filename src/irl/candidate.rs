// src/irl/candidate.rs
//
// Versioned persistence for learned candidate simulations.
//
// The projection loop produces one candidate per iteration; the full list is
// checkpointed to a single JSON file so long runs survive interruption and so
// the mixture commands can run against a finished training run.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::policy::{PolicyTable, ValueTable};

/// Bump when the on-disk candidate layout changes.
pub const CANDIDATE_FORMAT_VERSION: u32 = 1;

/// One learned user simulation: the policy, the Q-values it was derived
/// from, the reward weights that produced it, and how far its feature
/// expectations sit from the expert's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSimulation {
    pub policy: PolicyTable,
    pub values: ValueTable,
    pub weights: Vec<f64>,
    pub distance_to_expert: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandidateFile {
    version: u32,
    candidates: Vec<CandidateSimulation>,
}

/// Candidate persistence error.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Format(serde_json::Error),
    VersionMismatch { found: u32, expected: u32 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "candidate store I/O error: {}", e),
            StoreError::Format(e) => write!(f, "candidate store format error: {}", e),
            StoreError::VersionMismatch { found, expected } => write!(
                f,
                "candidate file version {} does not match expected {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Format(e) => Some(e),
            StoreError::VersionMismatch { .. } => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Format(e)
    }
}

/// File-backed candidate list.
#[derive(Debug, Clone)]
pub struct CandidateStore {
    path: PathBuf,
}

impl CandidateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full candidate list, replacing any previous checkpoint.
    ///
    /// Writes to a sibling temp file and renames it over the target so a
    /// crash mid-write never leaves a truncated checkpoint behind.
    pub fn store(&self, candidates: &[CandidateSimulation]) -> Result<(), StoreError> {
        let file = CandidateFile {
            version: CANDIDATE_FORMAT_VERSION,
            candidates: candidates.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut tmp = self.path.clone();
        tmp.set_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load a previously stored candidate list.
    pub fn load(&self) -> Result<Vec<CandidateSimulation>, StoreError> {
        let json = fs::read_to_string(&self.path)?;
        let file: CandidateFile = serde_json::from_str(&json)?;
        if file.version != CANDIDATE_FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                found: file.version,
                expected: CANDIDATE_FORMAT_VERSION,
            });
        }
        Ok(file.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;

    fn sample_candidate(distance: f64) -> CandidateSimulation {
        CandidateSimulation {
            policy: PolicyTable::handcrafted(&PolicyConfig::default()),
            values: ValueTable::zeros(),
            weights: vec![0.25; 30],
            distance_to_expert: distance,
        }
    }

    #[test]
    fn store_and_load_preserve_candidates() {
        let path = std::env::temp_dir().join(format!(
            "dialogsim-candidates-{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let store = CandidateStore::new(&path);
        let candidates = vec![sample_candidate(0.9), sample_candidate(0.4)];
        store.store(&candidates).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, candidates);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_a_future_version() {
        let path = std::env::temp_dir().join(format!(
            "dialogsim-candidates-vers-{}.json",
            std::process::id()
        ));
        let file = CandidateFile {
            version: CANDIDATE_FORMAT_VERSION + 1,
            candidates: vec![],
        };
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let store = CandidateStore::new(&path);
        match store.load() {
            Err(StoreError::VersionMismatch { found, expected }) => {
                assert_eq!(found, CANDIDATE_FORMAT_VERSION + 1);
                assert_eq!(expected, CANDIDATE_FORMAT_VERSION);
            }
            other => panic!("expected version mismatch, got {:?}", other),
        }
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_reports_missing_file_as_io() {
        let store = CandidateStore::new("/nonexistent/dialogsim-candidates.json");
        assert!(matches!(store.load(), Err(StoreError::Io(_))));
    }
}
