//! Scoped file deletion protection
//!
//! While a checkpoint or export transfers files, the engine must not delete
//! obsolete ones: a file listed as live may become obsolete a moment later.
//! [`FileDeletionGuard`] pairs every successful `disable_file_deletions`
//! with exactly one `enable_file_deletions`, whichever way the caller exits.

use strata_core::Result;
use tracing::{debug, warn};

use crate::database::DbEngine;

/// Holds the engine's deletion-protection counter for its lifetime
#[must_use = "file deletions are re-enabled as soon as the guard is dropped"]
pub struct FileDeletionGuard<'a> {
    db: &'a dyn DbEngine,
    released: bool,
}

impl<'a> FileDeletionGuard<'a> {
    /// Disable file deletions.
    ///
    /// # Errors
    ///
    /// Whatever `disable_file_deletions` returns, including `NotSupported`.
    /// No guard exists then and nothing is re-enabled later.
    pub fn acquire(db: &'a dyn DbEngine) -> Result<Self> {
        db.disable_file_deletions()?;
        debug!(target: "strata::checkpoint", "Disabled file deletions");
        Ok(FileDeletionGuard {
            db,
            released: false,
        })
    }

    /// Re-enable file deletions and report the outcome
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        let result = self.db.enable_file_deletions(false);
        debug!(target: "strata::checkpoint", ok = result.is_ok(), "Re-enabled file deletions");
        result
    }
}

impl Drop for FileDeletionGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.db.enable_file_deletions(false) {
            warn!(
                target: "strata::checkpoint",
                error = %e,
                "Failed to re-enable file deletions"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DbOptions;
    use crate::testing::{DeletionControl, TestDb};
    use tempfile::tempdir;

    #[test]
    fn test_release_enables_once() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();

        let guard = FileDeletionGuard::acquire(&db).unwrap();
        assert_eq!(db.deletions_disabled(), 1);
        guard.release().unwrap();
        assert_eq!(db.deletions_disabled(), 0);
        assert_eq!(db.enable_calls(), 1);
    }

    #[test]
    fn test_drop_enables() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();

        {
            let _guard = FileDeletionGuard::acquire(&db).unwrap();
            assert_eq!(db.deletions_disabled(), 1);
        }
        assert_eq!(db.deletions_disabled(), 0);
        assert_eq!(db.enable_calls(), 1);
    }

    #[test]
    fn test_failed_acquire_enables_nothing() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();
        db.set_disable_behavior(DeletionControl::NotSupported);

        let err = FileDeletionGuard::acquire(&db).err().unwrap();
        assert!(err.is_not_supported());
        assert_eq!(db.enable_calls(), 0);
    }

    #[test]
    fn test_release_reports_enable_failure() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();
        db.set_fail_enable(true);

        let guard = FileDeletionGuard::acquire(&db).unwrap();
        assert!(guard.release().is_err());
        assert_eq!(db.enable_calls(), 1);
    }
}
