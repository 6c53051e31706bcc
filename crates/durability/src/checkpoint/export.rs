//! Column family export
//!
//! Copies one column family's live table files into a fresh directory and
//! describes them, so another database can ingest them. No WAL, manifest
//! or options file is transferred: the memtable is flushed first, so the
//! table files hold everything.

use std::path::{Path, PathBuf};

use strata_core::{FileType, Result};
use tracing::{debug, info, warn};

use super::guard::FileDeletionGuard;
use super::sink::StagingSink;
use super::staging::StagingArea;
use super::transfer::CheckpointSink;
use super::{Checkpoint, Operation};
use crate::checksum::FileChecksum;
use crate::database::{
    ColumnFamilyHandle, ColumnFamilyMetaData, ExportImportFilesMetaData, LiveFileMetaData,
};

/// Transfer every table file listed in `metadata` through `sink`.
///
/// Files are hard-linked from their `db_path` (or `db_name` when a file
/// has none). If the first link reports `NotSupported` this and every
/// later file is copied; a `NotSupported` from any later link is an error.
///
/// Returns the number of files transferred.
pub fn export_files_in_metadata<S: CheckpointSink + ?Sized>(
    db_name: &Path,
    metadata: &ColumnFamilyMetaData,
    sink: &mut S,
) -> Result<usize> {
    let mut hardlink = true;
    let mut num_files = 0usize;

    for (level, file) in metadata.files() {
        num_files += 1;
        let src_dir = if file.db_path.as_os_str().is_empty() {
            db_name
        } else {
            file.db_path.as_path()
        };

        if hardlink {
            match sink.link_file(src_dir, &file.name, FileType::TableFile) {
                Ok(()) => {
                    debug!(target: "strata::export", file = %file.name, level, "Linked");
                    continue;
                }
                Err(e) if num_files == 1 && e.is_not_supported() => {
                    info!(
                        target: "strata::export",
                        file = %file.name,
                        reason = %e,
                        "Hard links unavailable, copying table files"
                    );
                    hardlink = false;
                }
                Err(e) => return Err(e),
            }
        }

        sink.copy_file(
            src_dir,
            &file.name,
            0,
            FileType::TableFile,
            &FileChecksum::unknown(),
        )?;
        debug!(target: "strata::export", file = %file.name, level, "Copied");
    }

    Ok(num_files)
}

fn describe_export(
    comparator_name: &str,
    metadata: &ColumnFamilyMetaData,
    export_dir: &Path,
) -> ExportImportFilesMetaData {
    let files = metadata
        .files()
        .map(|(level, file)| LiveFileMetaData {
            size: file.size,
            name: file.name.clone(),
            file_number: file.file_number,
            db_path: export_dir.to_path_buf(),
            smallest_seqno: file.smallest_seqno,
            largest_seqno: file.largest_seqno,
            smallest_key: file.smallest_key.clone(),
            largest_key: file.largest_key.clone(),
            oldest_blob_file_number: file.oldest_blob_file_number,
            level,
        })
        .collect();
    ExportImportFilesMetaData {
        db_comparator_name: comparator_name.to_string(),
        files,
    }
}

impl Checkpoint<'_> {
    /// Export the live table files of one column family into `export_dir`.
    ///
    /// On success `export_dir` holds every table file of the column family
    /// and the returned metadata describes them (with `db_path` set to
    /// `export_dir`). On failure `export_dir` does not exist.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if `export_dir` exists
    /// - `InvalidArgument` for an empty or slash-only directory
    /// - `NotSupported` if the engine cannot disable file deletions
    /// - anything the engine or the file system reports
    pub fn export_column_family(
        &self,
        cf: &ColumnFamilyHandle,
        export_dir: &Path,
    ) -> Result<ExportImportFilesMetaData> {
        let fs = self.db.file_system();
        info!(
            target: "strata::export",
            column_family = %cf.name,
            dir = %export_dir.display(),
            "Started the export process"
        );

        let mut staging = StagingArea::prepare(fs, export_dir, Operation::Export)?;
        match self.export_into(cf, &mut staging) {
            Ok(metadata) => {
                info!(
                    target: "strata::export",
                    column_family = %cf.name,
                    dir = %staging.target().display(),
                    files = metadata.files.len(),
                    "Export DONE"
                );
                Ok(metadata)
            }
            Err(e) => {
                info!(
                    target: "strata::export",
                    column_family = %cf.name,
                    error = %e,
                    "Export failed"
                );
                staging.discard();
                Err(e)
            }
        }
    }

    fn export_into(
        &self,
        cf: &ColumnFamilyHandle,
        staging: &mut StagingArea<'_>,
    ) -> Result<ExportImportFilesMetaData> {
        let db_options = self.db.db_options();
        self.db.flush(cf)?;

        let guard = FileDeletionGuard::acquire(self.db)?;
        let metadata = self.db.column_family_metadata(cf);
        let mut sink = StagingSink::new(self.db.file_system(), staging.staging(), db_options.use_fsync)
            .with_operation(Operation::Export);
        let transferred = export_files_in_metadata(self.db.name(), &metadata, &mut sink);
        let released = guard.release();

        match (&transferred, &released) {
            (Err(_), Err(e)) => warn!(
                target: "strata::export",
                error = %e,
                "Failed to re-enable file deletions"
            ),
            (Ok(count), _) => debug!(target: "strata::export", files = count, "Transferred table files"),
            _ => {}
        }
        transferred?;
        released?;

        staging.install()?;
        let export_dir: PathBuf = staging.target().to_path_buf();
        Ok(describe_export(&cf.comparator_name, &metadata, &export_dir))
    }
}
