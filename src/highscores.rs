//! Best-score ratchet
//!
//! Loaded once when a screen is built and written back only when a session
//! beats it, so the stored value never decreases.

use crate::error::PersistenceError;
use crate::persistence::ScoreStore;

#[derive(Debug)]
pub struct HighScore<S: ScoreStore> {
    store: S,
    best: u64,
}

impl<S: ScoreStore> HighScore<S> {
    /// Read the stored best. Failure is a hard error for the caller.
    pub fn load(store: S) -> Result<Self, PersistenceError> {
        let best = store.load()?;
        log::info!("Loaded best score {best}");
        Ok(Self { store, best })
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Check if a score would raise the best
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.best
    }

    /// Persist `score` if it beats the best. Returns whether it did.
    ///
    /// On a write error the in-memory best is left unchanged.
    pub fn submit(&mut self, score: u64) -> Result<bool, PersistenceError> {
        if !self.qualifies(score) {
            return Ok(false);
        }
        self.store.save(score)?;
        log::info!("New best score {score} (was {})", self.best);
        self.best = score;
        Ok(true)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryScoreStore;

    struct FailingStore;

    impl ScoreStore for FailingStore {
        fn load(&self) -> Result<u64, PersistenceError> {
            Ok(10)
        }

        fn save(&mut self, _score: u64) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io {
                path: "nowhere".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    #[test]
    fn test_ratchet_only_raises() {
        let mut high = HighScore::load(MemoryScoreStore::new(100)).unwrap();
        assert!(!high.submit(50).unwrap());
        assert!(!high.submit(100).unwrap());
        assert_eq!(high.store().writes(), 0);
        assert!(high.submit(150).unwrap());
        assert_eq!(high.best(), 150);
        assert_eq!(high.store().value(), 150);
        assert_eq!(high.store().writes(), 1);
    }

    #[test]
    fn test_failed_write_keeps_best() {
        let mut high = HighScore::load(FailingStore).unwrap();
        assert!(high.submit(20).is_err());
        assert_eq!(high.best(), 10);
    }

    #[test]
    fn test_qualifies() {
        let high = HighScore::load(MemoryScoreStore::new(0)).unwrap();
        assert!(!high.qualifies(0));
        assert!(high.qualifies(1));
    }
}
