//! Destination-independent checkpoint transfer
//!
//! [`create_custom_checkpoint`] decides, for every file a consistent copy of
//! the database needs, whether it is linked, copied (and with what byte
//! limit and checksum) or synthesized. Where the bytes end up is the
//! [`CheckpointSink`]'s business: a local staging directory, a backup
//! engine, anything that can accept those three operations.
//!
//! # Algorithm
//!
//! 1. Decide whether to flush memtables (small WALs are cheaper to copy)
//! 2. List live files, read the min log number to keep, list live files
//!    again and use the second listing
//! 3. Hand buffered WAL bytes to the log, then list WAL segments
//! 4. Copy non-table files (the manifest truncated to the listed size)
//! 5. Link table and blob files, switching to copy on the first
//!    cross-device link
//! 6. Write CURRENT naming the copied manifest
//! 7. Link or copy the needed WAL segments; the last one is copied up to
//!    its listed size
//!
//! # Consistency
//!
//! The engine has no call returning live files and the min log number
//! atomically. Listing live files *after* reading the min log number means a
//! flush that lands in between is reflected in the copied manifest, so WAL
//! segments it made obsolete are not needed. This is sequencing, not a
//! guarantee.

use std::path::Path;

use strata_core::filename::classify;
use strata_core::{Error, FileNumber, FileType, Result, SequenceNumber};
use tracing::{debug, info};

use crate::checksum::{get_file_checksums_from_manifest, FileChecksum, FileChecksumList};
use crate::database::{join_file_name, DbEngine, DbOptions, LiveFiles};

/// Where the files of a checkpoint go.
///
/// File names carry a leading `/` and are relative to `src_dir` (or, for
/// `create_file`, to the destination root).
pub trait CheckpointSink {
    /// Hard-link a file into the destination.
    ///
    /// Return `Error::NotSupported` when linking is impossible (different
    /// device); the caller then copies this and every later file.
    fn link_file(&mut self, src_dir: &Path, fname: &str, file_type: FileType) -> Result<()>;

    /// Copy a file into the destination.
    ///
    /// `size_limit == 0` copies the whole file, otherwise exactly
    /// `size_limit` bytes.
    fn copy_file(
        &mut self,
        src_dir: &Path,
        fname: &str,
        size_limit: u64,
        file_type: FileType,
        checksum: &FileChecksum,
    ) -> Result<()>;

    /// Create a file with the given contents in the destination.
    fn create_file(&mut self, fname: &str, contents: &str, file_type: FileType) -> Result<()>;
}

/// Options for [`create_custom_checkpoint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCheckpointOptions {
    /// WAL size threshold for flushing memtables.
    ///
    /// - `None`: never flush, copy the WAL instead
    /// - `Some(0)`: always flush
    /// - `Some(n)`: flush only if the WAL segments total at least `n` bytes
    ///
    /// Ignored (always flush) when the engine runs two-phase commit.
    pub log_size_for_flush: Option<u64>,
    /// Look up table and blob checksums in the manifest and pass them to
    /// `copy_file`
    pub get_live_table_checksum: bool,
}

impl Default for CustomCheckpointOptions {
    fn default() -> Self {
        CustomCheckpointOptions {
            log_size_for_flush: Some(0),
            get_live_table_checksum: false,
        }
    }
}

impl CustomCheckpointOptions {
    /// Set the WAL size threshold for flushing
    pub fn with_log_size_for_flush(mut self, log_size_for_flush: Option<u64>) -> Self {
        self.log_size_for_flush = log_size_for_flush;
        self
    }

    /// Request table and blob checksums
    pub fn with_live_table_checksum(mut self, enabled: bool) -> Self {
        self.get_live_table_checksum = enabled;
        self
    }
}

/// How shareable files are transferred.
///
/// Starts as `Link`; the first cross-device link moves it to `Copy` for the
/// rest of the call. It never moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferMode {
    /// Hard-link into the destination
    Link,
    /// Byte-copy into the destination
    Copy,
}

/// Link-or-copy state shared by the table/blob and WAL loops.
struct Transfer<'a, S: CheckpointSink + ?Sized> {
    sink: &'a mut S,
    mode: TransferMode,
}

impl<'a, S: CheckpointSink + ?Sized> Transfer<'a, S> {
    fn new(sink: &'a mut S) -> Self {
        Transfer {
            sink,
            mode: TransferMode::Link,
        }
    }

    fn link_or_copy(
        &mut self,
        src_dir: &Path,
        fname: &str,
        file_type: FileType,
        checksum: impl FnOnce() -> FileChecksum,
    ) -> Result<()> {
        if self.mode == TransferMode::Link {
            match self.sink.link_file(src_dir, fname, file_type) {
                Err(e) if e.is_not_supported() => {
                    info!(
                        target: "strata::checkpoint",
                        file = fname,
                        reason = %e,
                        "Hard links unavailable, copying remaining files"
                    );
                    self.mode = TransferMode::Copy;
                }
                result => return result,
            }
        }
        self.sink.copy_file(src_dir, fname, 0, file_type, &checksum())
    }
}

fn should_flush_memtable(
    db: &dyn DbEngine,
    db_options: &DbOptions,
    log_size_for_flush: Option<u64>,
) -> Result<bool> {
    if db_options.allow_2pc {
        return Ok(true);
    }
    match log_size_for_flush {
        None => Ok(false),
        Some(0) => Ok(true),
        Some(threshold) => {
            let total_wal_size: u64 = db
                .sorted_wal_files()?
                .iter()
                .map(|wal| wal.size_file_bytes)
                .sum();
            debug!(
                target: "strata::checkpoint",
                total_wal_size,
                threshold,
                "Outstanding WAL size"
            );
            Ok(total_wal_size >= threshold)
        }
    }
}

fn manifest_entry(live: &LiveFiles) -> Option<&str> {
    live.files
        .iter()
        .find(|name| {
            matches!(
                strata_core::parse_file_name(name),
                Some((_, FileType::DescriptorFile))
            )
        })
        .map(String::as_str)
}

/// The second listing must not see a shorter copy of the same manifest.
fn check_manifest_progress(first: &LiveFiles, second: &LiveFiles) -> Result<()> {
    if let (Some(before), Some(after)) = (manifest_entry(first), manifest_entry(second)) {
        if before == after && second.manifest_file_size < first.manifest_file_size {
            return Err(Error::corruption(format!(
                "manifest {} shrank from {} to {} bytes between listings",
                after, first.manifest_file_size, second.manifest_file_size
            )));
        }
        debug!(
            target: "strata::checkpoint",
            before,
            after,
            size_before = first.manifest_file_size,
            size_after = second.manifest_file_size,
            "Re-listed live files"
        );
    }
    Ok(())
}

/// Produce a consistent copy of `db` through `sink`.
///
/// Returns the sequence number the copy is consistent as of. The first
/// failing sink call aborts the transfer; discarding whatever the sink
/// already received is the caller's job.
///
/// # Errors
///
/// - `InvalidArgument`: the engine cannot report its min log number
/// - `Corruption`: the live-file listing holds an unparsable or unexpected
///   name, or the manifest shrank between listings
/// - anything the engine or the sink returns
pub fn create_custom_checkpoint<S: CheckpointSink + ?Sized>(
    db: &dyn DbEngine,
    sink: &mut S,
    options: &CustomCheckpointOptions,
) -> Result<SequenceNumber> {
    let db_options = db.db_options();
    let db_name = db.name();
    let sequence_number = db.latest_sequence_number();

    let flush_memtable = should_flush_memtable(db, &db_options, options.log_size_for_flush)?;

    let first = db.live_files(flush_memtable)?;
    let min_log_num = db
        .min_log_number_to_keep()
        .ok_or_else(|| Error::invalid_argument("cannot get the min log number to keep"))?;
    let live = db.live_files(flush_memtable)?;
    check_manifest_progress(&first, &live)?;

    db.flush_wal(false)?;
    let wal_files = db.sorted_wal_files()?;

    // Non-table, non-blob files first
    let mut manifest_fname: Option<&str> = None;
    let mut current_fname: Option<&str> = None;
    let mut table_and_blob_files: Vec<(&str, FileNumber, FileType)> = Vec::new();

    for live_file in live.files.iter().map(String::as_str) {
        let (number, file_type) = classify(live_file)?;
        if !file_type.is_live_file_kind() {
            return Err(Error::corruption(format!(
                "unexpected {} file in live file listing: {}",
                file_type, live_file
            )));
        }

        match file_type {
            // Written below from the manifest name: the source CURRENT may
            // already point past the manifest being copied.
            FileType::CurrentFile => current_fname = Some(live_file),
            FileType::DescriptorFile => {
                manifest_fname = Some(live_file);
                sink.copy_file(
                    db_name,
                    live_file,
                    live.manifest_file_size,
                    file_type,
                    &FileChecksum::unknown(),
                )?;
            }
            FileType::TableFile | FileType::BlobFile => {
                table_and_blob_files.push((live_file, number, file_type));
            }
            _ => sink.copy_file(db_name, live_file, 0, file_type, &FileChecksum::unknown())?,
        }
    }

    let checksums: Option<FileChecksumList> = match (options.get_live_table_checksum, manifest_fname)
    {
        (true, Some(manifest)) => Some(get_file_checksums_from_manifest(
            db.file_system(),
            &join_file_name(db_name, manifest),
            live.manifest_file_size,
        )?),
        (true, None) => Some(FileChecksumList::new()),
        (false, _) => None,
    };

    let mut transfer = Transfer::new(sink);

    for &(fname, number, file_type) in &table_and_blob_files {
        transfer.link_or_copy(db_name, fname, file_type, || match &checksums {
            Some(list) => list.checksum_or_unknown(number),
            None => FileChecksum::unknown(),
        })?;
    }

    if let (Some(current), Some(manifest)) = (current_fname, manifest_fname) {
        let contents = format!("{}\n", manifest.trim_start_matches('/'));
        transfer
            .sink
            .create_file(current, &contents, FileType::CurrentFile)?;
    }

    debug!(
        target: "strata::checkpoint",
        table_and_blob_files = table_and_blob_files.len(),
        wal_files = wal_files.len(),
        "Transferring WAL files"
    );

    // Only the last segment can have changed since the last flush; copy it
    // up to the listed size.
    let wal_dir = db_options.wal_dir_or(db_name);
    let wal_count = wal_files.len();
    for (i, wal) in wal_files.iter().enumerate() {
        if !wal.is_alive() || (flush_memtable && wal.log_number < min_log_num) {
            continue;
        }
        if i + 1 == wal_count {
            if wal.size_file_bytes == 0 {
                transfer
                    .sink
                    .create_file(&wal.path_name, "", FileType::WalFile)?;
            } else {
                transfer.sink.copy_file(
                    &wal_dir,
                    &wal.path_name,
                    wal.size_file_bytes,
                    FileType::WalFile,
                    &FileChecksum::unknown(),
                )?;
            }
            break;
        }
        transfer.link_or_copy(&wal_dir, &wal.path_name, FileType::WalFile, FileChecksum::unknown)?;
    }

    Ok(sequence_number)
}
