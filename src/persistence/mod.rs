//! Best-score persistence
//!
//! One non-negative integer per game, stored as `"{score}\n"`. A missing or
//! unreadable file is an error; callers decide whether to seed it first with
//! [`FileScoreStore::create_if_missing`].

use std::path::{Path, PathBuf};

use crate::error::PersistenceError;

/// Load/save gateway for a single best score
pub trait ScoreStore {
    fn load(&self) -> Result<u64, PersistenceError>;
    fn save(&mut self, score: u64) -> Result<(), PersistenceError>;
}

/// Plain-text score file
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open a store, writing `"0\n"` first if the file does not exist yet
    pub fn create_if_missing(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let mut store = Self::new(path);
        if !store.path.exists() {
            log::info!("Creating score file {}", store.path.display());
            store.save(0)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> Result<u64, PersistenceError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        content
            .trim()
            .parse::<u64>()
            .map_err(|_| PersistenceError::Corrupt {
                path: self.path.clone(),
                content,
            })
    }

    fn save(&mut self, score: u64) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        std::fs::write(&self.path, format!("{score}\n")).map_err(|e| self.io_error(e))
    }
}

/// In-memory store that counts writes
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    value: u64,
    writes: usize,
}

impl MemoryScoreStore {
    pub fn new(value: u64) -> Self {
        Self { value, writes: 0 }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Result<u64, PersistenceError> {
        Ok(self.value)
    }

    fn save(&mut self, score: u64) -> Result<(), PersistenceError> {
        self.value = score;
        self.writes += 1;
        Ok(())
    }
}
