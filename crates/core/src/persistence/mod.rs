use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Storage for the best score across sessions.
///
/// Callers treat any failure as "no previous best"; gameplay never depends on
/// the store succeeding.
pub trait ScoreStore {
    fn load_best_score(&mut self) -> Result<u32>;
    fn save_best_score(&mut self, score: u32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct BestScoreRecord {
    best_score: u32,
}

/// Keeps the best score in a small JSON file. A missing file reads as zero.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ScoreStore for FileScoreStore {
    fn load_best_score(&mut self) -> Result<u32> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let record: BestScoreRecord = serde_json::from_str(&text)?;
        Ok(record.best_score)
    }

    fn save_best_score(&mut self, score: u32) -> Result<()> {
        let json = serde_json::to_string_pretty(&BestScoreRecord { best_score: score })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests and hosts without a filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: u32,
}

impl MemoryScoreStore {
    pub fn new(best: u32) -> Self {
        Self { best }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_best_score(&mut self) -> Result<u32> {
        Ok(self.best)
    }

    fn save_best_score(&mut self, score: u32) -> Result<()> {
        self.best = score;
        Ok(())
    }
}
