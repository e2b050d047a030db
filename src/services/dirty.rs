//! Smutsflagga för osynkade lokala ändringar
//!
//! Flaggan sparas i databasen så att den överlever en omstart. Generationen
//! hålls bara i minnet och räknas upp vid varje ändring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::store::keys;
use crate::db::Database;
use crate::utils::AppResult;

#[derive(Clone)]
pub struct DirtyTracker {
    db: Database,
    generation: Arc<AtomicU64>,
    /// Högsta generation som en lyckad push har skickat
    confirmed: Arc<AtomicU64>,
}

impl DirtyTracker {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            generation: Arc::new(AtomicU64::new(0)),
            confirmed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Markera lokala ändringar. Returnerar den nya generationen.
    pub fn mark_dirty(&self) -> AppResult<u64> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.db.kv().set(keys::DIRTY, "true")?;
        tracing::debug!("Markerad som osynkad (generation {})", generation);
        Ok(generation)
    }

    pub fn clear_dirty(&self) -> AppResult<()> {
        self.db.kv().remove(keys::DIRTY)?;
        Ok(())
    }

    /// Rensa flaggan bara om ingen ändring skett sedan `seen` lästes.
    /// Returnerar `true` om flaggan rensades.
    pub fn clear_if_unchanged(&self, seen: u64) -> AppResult<bool> {
        if self.generation() != seen {
            tracing::debug!("Ändringar under synk, behåller smutsflaggan");
            return Ok(false);
        }
        self.clear_dirty()?;
        Ok(true)
    }

    /// Avsluta en lyckad push av ögonblicksbilden från generation `seen`.
    ///
    /// Har en nyare push redan bekräftats kan servern nu ha fått den äldre
    /// bilden sist, så flaggan sätts igen. Returnerar `true` om flaggan rensades.
    pub fn settle_push(&self, seen: u64) -> AppResult<bool> {
        let newest = self.confirmed.fetch_max(seen, Ordering::SeqCst);
        if seen < newest {
            tracing::warn!(
                "Äldre push (generation {}) landade efter nyare ({}), markerar som osynkad",
                seen,
                newest
            );
            self.mark_dirty()?;
            return Ok(false);
        }
        self.clear_if_unchanged(seen)
    }

    /// Läsfel tolkas som osynkat
    pub fn is_dirty(&self) -> bool {
        match self.db.kv().get(keys::DIRTY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!("Kunde inte läsa smutsflaggan: {}", e);
                true
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let db = Database::open_in_memory().unwrap();
        let tracker = DirtyTracker::new(db);

        assert!(!tracker.is_dirty());
        tracker.mark_dirty().unwrap();
        assert!(tracker.is_dirty());
        tracker.clear_dirty().unwrap();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_flag_survives_new_tracker() {
        let db = Database::open_in_memory().unwrap();
        DirtyTracker::new(db.clone()).mark_dirty().unwrap();

        let fresh = DirtyTracker::new(db);
        assert!(fresh.is_dirty());
        assert_eq!(fresh.generation(), 0);
    }

    #[test]
    fn test_clear_if_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let tracker = DirtyTracker::new(db);

        let seen = tracker.mark_dirty().unwrap();
        tracker.mark_dirty().unwrap();
        assert!(!tracker.clear_if_unchanged(seen).unwrap());
        assert!(tracker.is_dirty());

        let seen = tracker.generation();
        assert!(tracker.clear_if_unchanged(seen).unwrap());
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_stale_push_settling_late_marks_dirty() {
        let db = Database::open_in_memory().unwrap();
        let tracker = DirtyTracker::new(db);

        let older = tracker.mark_dirty().unwrap();
        let newer = tracker.mark_dirty().unwrap();

        assert!(tracker.settle_push(newer).unwrap());
        assert!(!tracker.is_dirty());

        assert!(!tracker.settle_push(older).unwrap());
        assert!(tracker.is_dirty());
    }
}
