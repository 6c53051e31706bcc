//! Where a checkpoint's WAL segments go, and what the copied OPTIONS file
//! says about the log and WAL directories.
//!
//! | configured WAL dir                 | segments written to   | `wal_dir` option |
//! |------------------------------------|-----------------------|------------------|
//! | empty, the db dir, the checkpoint  | staging               | checkpoint dir   |
//! | `<checkpoint>/<sub>`               | `staging/<sub>`       | unchanged        |
//! | anything else                      | the WAL dir itself    | unchanged        |
//!
//! Info logs are never transferred; only the `db_log_dir` option changes
//! (cleared when it pointed at the db or checkpoint dir).

use std::path::{Path, PathBuf};

use strata_core::{Error, Result};
use tracing::debug;

use crate::env::FileSystem;

fn trimmed(dir: Option<&Path>) -> Result<String> {
    let Some(dir) = dir else {
        return Ok(String::new());
    };
    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::invalid_argument(format!("directory is not valid UTF-8: {:?}", dir)))?;
    Ok(dir_str.trim_end_matches('/').to_string())
}

/// Resolved directory overrides for one checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLayout {
    /// `db_log_dir` written into the copied options file
    pub value_log_dir: String,
    /// `wal_dir` written into the copied options file
    pub value_wal_dir: String,
    /// Directory WAL segments are linked or copied into
    pub wal_dest: PathBuf,
}

impl CheckpointLayout {
    /// Resolve the layout, creating the WAL destination if it lives outside
    /// staging and does not exist yet.
    ///
    /// `db_log_dir` and `wal_dir` are the directories requested for the
    /// checkpoint. Trailing separators are ignored everywhere.
    pub fn resolve(
        fs: &dyn FileSystem,
        db_name: &Path,
        checkpoint_dir: &Path,
        staging: &Path,
        db_log_dir: Option<&Path>,
        wal_dir: Option<&Path>,
    ) -> Result<Self> {
        let db_name = trimmed(Some(db_name))?;
        let checkpoint_dir = trimmed(Some(checkpoint_dir))?;
        let log_dir = trimmed(db_log_dir)?;
        let wal_dir = trimmed(wal_dir)?;

        let value_log_dir = if log_dir == db_name || log_dir == checkpoint_dir {
            String::new()
        } else {
            log_dir
        };

        let layout = if wal_dir.is_empty() || wal_dir == db_name || wal_dir == checkpoint_dir {
            CheckpointLayout {
                value_log_dir,
                value_wal_dir: checkpoint_dir,
                wal_dest: staging.to_path_buf(),
            }
        } else {
            let prefix = format!("{}/", checkpoint_dir);
            let wal_dest = match wal_dir.strip_prefix(&prefix) {
                Some(suffix) => {
                    let mut dest = staging.to_path_buf();
                    for component in suffix.split('/').filter(|c| !c.is_empty()) {
                        dest.push(component);
                        fs.create_dir_if_missing(&dest)?;
                    }
                    dest
                }
                None => {
                    let dest = PathBuf::from(&wal_dir);
                    fs.create_dir_if_missing(&dest)?;
                    dest
                }
            };
            CheckpointLayout {
                value_log_dir,
                value_wal_dir: wal_dir,
                wal_dest,
            }
        };

        debug!(
            target: "strata::checkpoint",
            value_log_dir = %layout.value_log_dir,
            value_wal_dir = %layout.value_wal_dir,
            wal_dest = %layout.wal_dest.display(),
            "Resolved checkpoint layout"
        );
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::LocalFileSystem;
    use tempfile::tempdir;

    #[test]
    fn test_default_wal_dir_goes_to_staging() {
        let fs = LocalFileSystem::new();
        let layout = CheckpointLayout::resolve(
            &fs,
            Path::new("/db"),
            Path::new("/ckpt"),
            Path::new("/ckpt.tmp"),
            None,
            None,
        )
        .unwrap();
        assert_eq!(layout.value_log_dir, "");
        assert_eq!(layout.value_wal_dir, "/ckpt");
        assert_eq!(layout.wal_dest, PathBuf::from("/ckpt.tmp"));
    }

    #[test]
    fn test_wal_dir_equal_to_db_dir() {
        let fs = LocalFileSystem::new();
        let layout = CheckpointLayout::resolve(
            &fs,
            Path::new("/db"),
            Path::new("/ckpt"),
            Path::new("/ckpt.tmp"),
            Some(Path::new("/db/")),
            Some(Path::new("/db//")),
        )
        .unwrap();
        assert_eq!(layout.value_log_dir, "");
        assert_eq!(layout.value_wal_dir, "/ckpt");
        assert_eq!(layout.wal_dest, PathBuf::from("/ckpt.tmp"));
    }

    #[test]
    fn test_external_wal_dir_is_created() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let wal_dir = dir.path().join("wal");
        let log_dir = dir.path().join("logs");

        let layout = CheckpointLayout::resolve(
            &fs,
            &dir.path().join("db"),
            &dir.path().join("ckpt"),
            &dir.path().join("ckpt.tmp"),
            Some(&log_dir),
            Some(&wal_dir),
        )
        .unwrap();
        assert_eq!(layout.value_log_dir, log_dir.to_str().unwrap());
        assert_eq!(layout.value_wal_dir, wal_dir.to_str().unwrap());
        assert_eq!(layout.wal_dest, wal_dir);
        assert!(wal_dir.is_dir());
    }

    #[test]
    fn test_wal_dir_nested_under_checkpoint() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let ckpt = dir.path().join("ckpt");
        let staging = dir.path().join("ckpt.tmp");
        std::fs::create_dir(&staging).unwrap();
        let wal_dir = ckpt.join("wal").join("segments");

        let layout = CheckpointLayout::resolve(
            &fs,
            &dir.path().join("db"),
            &ckpt,
            &staging,
            None,
            Some(&wal_dir),
        )
        .unwrap();
        assert_eq!(layout.value_wal_dir, wal_dir.to_str().unwrap());
        assert_eq!(layout.wal_dest, staging.join("wal").join("segments"));
        assert!(layout.wal_dest.is_dir());
        assert!(!ckpt.exists());
    }
}
