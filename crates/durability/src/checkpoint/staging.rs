//! Staging directory lifecycle
//!
//! Files are assembled in `<target>.tmp` and only appear at `<target>`
//! through one rename:
//!
//! ```text
//! prepare:  clean stale <target>.tmp, create it
//! transfer: populate <target>.tmp
//! install:  rename <target>.tmp -> <target>, fsync <target>
//! discard:  delete children of the work dir, then the dir
//! ```
//!
//! Cleanup is best effort. A staging directory that survives a failed
//! cleanup is reclaimed by the next attempt's `prepare`.

use std::path::{Path, PathBuf};

use strata_core::{Error, Result};

use super::Operation;
use crate::env::FileSystem;

/// Suffix appended to the target to name the staging directory
pub const STAGING_SUFFIX: &str = ".tmp";

/// Strip trailing separators from a target directory.
///
/// # Errors
///
/// `InvalidArgument` for an empty or slash-only path, or one that is not
/// valid UTF-8.
pub fn normalize_dir(dir: &Path) -> Result<String> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::invalid_argument(format!("directory is not valid UTF-8: {:?}", dir)))?;
    let trimmed = dir_str.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::invalid_argument(format!(
            "invalid directory name '{}'",
            dir_str
        )));
    }
    Ok(trimmed.to_string())
}

/// Delete the children of `dir`, then `dir`. Failures are logged, not
/// returned; a missing directory is not a failure.
pub fn clean_directory(fs: &dyn FileSystem, dir: &Path, operation: Operation) {
    match fs.file_exists(dir) {
        Ok(false) => return,
        Ok(true) => {}
        Err(e) => {
            operation_event!(warn, operation, dir = %dir.display(), error = %e, "Cannot stat directory for cleanup");
            return;
        }
    }

    operation_event!(info, operation, dir = %dir.display(), "Cleaning directory");
    match fs.get_children(dir) {
        Ok(children) => {
            for child in children {
                let path = dir.join(&child);
                let is_dir = fs.get_children(&path).is_ok();
                if is_dir {
                    clean_directory(fs, &path, operation);
                } else if let Err(e) = fs.delete_file(&path) {
                    operation_event!(warn, operation, path = %path.display(), error = %e, "Failed to delete file");
                } else {
                    operation_event!(debug, operation, path = %path.display(), "Deleted file");
                }
            }
        }
        Err(e) => {
            operation_event!(warn, operation, dir = %dir.display(), error = %e, "Failed to list directory");
        }
    }

    if let Err(e) = fs.delete_dir(dir) {
        operation_event!(warn, operation, dir = %dir.display(), error = %e, "Failed to delete directory");
    }
}

/// A target directory and its private staging directory
pub struct StagingArea<'a> {
    fs: &'a dyn FileSystem,
    target: PathBuf,
    staging: PathBuf,
    installed: bool,
    operation: Operation,
}

impl<'a> StagingArea<'a> {
    /// Check the target and create a fresh staging directory.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the target exists
    /// - `InvalidArgument` for an empty or slash-only target
    ///
    /// Neither creates a staging directory.
    pub fn prepare(fs: &'a dyn FileSystem, target: &Path, operation: Operation) -> Result<Self> {
        let normalized = normalize_dir(target)?;
        if fs.file_exists(target)? {
            return Err(Error::already_exists(format!(
                "directory exists: {}",
                target.display()
            )));
        }
        let staging = PathBuf::from(format!("{}{}", normalized, STAGING_SUFFIX));

        clean_directory(fs, &staging, operation);
        fs.create_dir(&staging)?;
        operation_event!(info, operation, staging = %staging.display(), "Created staging directory");

        Ok(StagingArea {
            fs,
            target: PathBuf::from(normalized),
            staging,
            installed: false,
            operation,
        })
    }

    /// Target directory without trailing separators
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Staging directory
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// Directory currently holding the files: staging until the rename,
    /// the target afterwards
    pub fn work_dir(&self) -> &Path {
        if self.installed {
            &self.target
        } else {
            &self.staging
        }
    }

    /// Rename staging to the target and fsync the target
    pub fn install(&mut self) -> Result<()> {
        self.fs.rename_file(&self.staging, &self.target)?;
        self.installed = true;
        self.fs.new_directory(&self.target)?.fsync()?;
        Ok(())
    }

    /// Delete whatever the work directory holds
    pub fn discard(self) {
        clean_directory(self.fs, self.work_dir(), self.operation);
    }
}
