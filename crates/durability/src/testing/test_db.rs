//! On-disk fake engine
//!
//! [`TestDb`] keeps a real database directory (CURRENT, MANIFEST, OPTIONS,
//! table, blob and WAL files) and implements [`DbEngine`] over it. It has
//! no read path: it exists to be checkpointed and exported.
//!
//! Every engine call is counted, and hooks let a test act "concurrently"
//! at the points where a real engine's background work would interleave.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::filename::{blob_file_name, descriptor_file_name, log_file_name, options_file_name, table_file_name};
use strata_core::{Error, FileNumber, Result, SequenceNumber, INVALID_FILE_NUMBER};

use crate::checksum::FileChecksum;
use crate::database::{
    ColumnFamilyHandle, ColumnFamilyMetaData, DbEngine, DbOptions, DbPaths, LevelMetaData,
    LiveFiles, SstFileMetaData, WalFile, WalFileKind,
};
use crate::env::{FileSystem, LocalFileSystem};
use crate::file_util::create_file;
use crate::format::{
    ColumnFamilySection, DeletedFileEntry, ManifestWriter, NewBlobFileEntry, NewFileEntry,
    OptionsFile, VersionEdit, DEFAULT_COMPARATOR,
};

/// Callback run by [`TestDb`] with no internal lock held
pub type EngineHook = Arc<dyn Fn(&TestDb) + Send + Sync>;

/// How `disable_file_deletions` answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionControl {
    /// Counts like a real engine
    Supported,
    /// Returns `NotSupported`
    NotSupported,
    /// Returns an I/O error
    Fail,
}

/// A table file to add with [`TestDb::add_table`]
#[derive(Debug, Clone)]
pub struct TableSpec {
    level: i32,
    smallest_key: Vec<u8>,
    largest_key: Vec<u8>,
    size: u64,
    checksum: Option<FileChecksum>,
}

impl TableSpec {
    /// Level-0 table covering `[smallest, largest]`, `size` bytes long
    pub fn new(smallest: impl Into<Vec<u8>>, largest: impl Into<Vec<u8>>, size: u64) -> Self {
        TableSpec {
            level: 0,
            smallest_key: smallest.into(),
            largest_key: largest.into(),
            size,
            checksum: None,
        }
    }

    /// Place the table on another level
    pub fn at_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Record a checksum for the table in the manifest
    pub fn with_checksum(mut self, func_name: &str, value: &str) -> Self {
        self.checksum = Some(FileChecksum::new(func_name, value));
        self
    }
}

struct TableFile {
    cf_id: u32,
    level: i32,
    meta: SstFileMetaData,
}

struct State {
    last_sequence: SequenceNumber,
    next_file_number: FileNumber,
    manifest_number: FileNumber,
    manifest: ManifestWriter,
    options_number: FileNumber,
    column_families: Vec<ColumnFamilyHandle>,
    tables: Vec<TableFile>,
    blobs: Vec<FileNumber>,
    wals: Vec<(u64, WalFileKind)>,
    memtable: Vec<(Vec<u8>, Vec<u8>, SequenceNumber)>,
    min_log_to_keep: u64,
    min_log_override: Option<Option<u64>>,
    extra_live_files: Vec<String>,
    pending_deletions: Vec<PathBuf>,
}

impl State {
    fn allocate_file_number(&mut self) -> FileNumber {
        let number = self.next_file_number;
        self.next_file_number += 1;
        number
    }

    fn current_wal(&self) -> u64 {
        self.wals.last().map(|(n, _)| *n).unwrap_or(0)
    }
}

/// Deterministic table/blob body so copies can be compared byte for byte
fn file_body(number: FileNumber, size: u64) -> Vec<u8> {
    (0..size)
        .map(|i| (number as u8).wrapping_mul(31).wrapping_add(i as u8))
        .collect()
}

fn encode_wal_record(sequence: SequenceNumber, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(16 + key.len() + value.len());
    record.extend_from_slice(&sequence.to_le_bytes());
    record.extend_from_slice(&(key.len() as u32).to_le_bytes());
    record.extend_from_slice(key);
    record.extend_from_slice(&(value.len() as u32).to_le_bytes());
    record.extend_from_slice(value);
    record
}

/// Fake engine over a real database directory
pub struct TestDb {
    paths: DbPaths,
    options: DbOptions,
    local: LocalFileSystem,
    fs: Arc<dyn FileSystem>,
    state: Mutex<State>,
    deletions_disabled: AtomicUsize,
    disable_behavior: Mutex<DeletionControl>,
    fail_enable: AtomicBool,
    after_wal_enumeration: Mutex<Option<EngineHook>>,
    disable_calls: AtomicUsize,
    enable_calls: AtomicUsize,
    flush_requests: AtomicUsize,
    memtable_flushes: AtomicUsize,
    flush_wal_calls: AtomicUsize,
    live_files_calls: AtomicUsize,
}

impl TestDb {
    /// Create a database in `dir` (which may not exist yet).
    ///
    /// Lays out MANIFEST-000001, OPTIONS-000002, an empty WAL 000003.log
    /// and CURRENT; the next file number is 4.
    pub fn open(dir: impl AsRef<Path>, options: DbOptions) -> Result<Self> {
        let root = dir.as_ref();
        let paths = DbPaths::from_root(root).with_wal_dir(options.wal_dir_or(root));
        let local = LocalFileSystem::new();
        paths.create_directories(&local)?;

        let (manifest_number, options_number, wal_number) = (1, 2, 3);
        let default_cf = ColumnFamilyHandle::new(0, "default", DEFAULT_COMPARATOR);

        let mut manifest = ManifestWriter::create(&local, &paths.manifest(manifest_number))?;
        manifest.add_record(&VersionEdit {
            comparator: Some(DEFAULT_COMPARATOR.to_string()),
            log_number: Some(wal_number),
            next_file_number: Some(4),
            last_sequence: Some(0),
            ..Default::default()
        })?;
        OptionsFile::from_db_options(
            &options,
            vec![ColumnFamilySection::new("default", DEFAULT_COMPARATOR)],
        )
        .persist(&local, &paths.options(options_number), false)?;
        create_file(&local, &paths.wal(wal_number), "", false)?;
        create_file(
            &local,
            &paths.current(),
            &format!("{}\n", descriptor_file_name(manifest_number).trim_start_matches('/')),
            false,
        )?;

        Ok(TestDb {
            paths,
            options,
            local,
            fs: Arc::new(LocalFileSystem::new()),
            state: Mutex::new(State {
                last_sequence: 0,
                next_file_number: 4,
                manifest_number,
                manifest,
                options_number,
                column_families: vec![default_cf],
                tables: Vec::new(),
                blobs: Vec::new(),
                wals: vec![(wal_number, WalFileKind::Alive)],
                memtable: Vec::new(),
                min_log_to_keep: wal_number,
                min_log_override: None,
                extra_live_files: Vec::new(),
                pending_deletions: Vec::new(),
            }),
            deletions_disabled: AtomicUsize::new(0),
            disable_behavior: Mutex::new(DeletionControl::Supported),
            fail_enable: AtomicBool::new(false),
            after_wal_enumeration: Mutex::new(None),
            disable_calls: AtomicUsize::new(0),
            enable_calls: AtomicUsize::new(0),
            flush_requests: AtomicUsize::new(0),
            memtable_flushes: AtomicUsize::new(0),
            flush_wal_calls: AtomicUsize::new(0),
            live_files_calls: AtomicUsize::new(0),
        })
    }

    /// Hand this file system to checkpoint and export. The engine's own
    /// writes keep going to the local file system.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Directory layout
    pub fn paths(&self) -> &DbPaths {
        &self.paths
    }

    /// Handle of the default column family
    pub fn default_column_family(&self) -> ColumnFamilyHandle {
        self.state.lock().column_families[0].clone()
    }

    /// Create a column family and record it in the manifest and options
    pub fn create_column_family(&self, name: &str, comparator: &str) -> Result<ColumnFamilyHandle> {
        let mut state = self.state.lock();
        let handle = ColumnFamilyHandle::new(state.column_families.len() as u32, name, comparator);
        state.manifest.add_record(&VersionEdit {
            column_family: handle.id,
            comparator: Some(comparator.to_string()),
            ..Default::default()
        })?;

        let options_path = self.paths.options(state.options_number);
        let mut options = OptionsFile::load(&self.local, &options_path)?;
        options
            .column_families
            .push(ColumnFamilySection::new(name, comparator));
        options.persist(&self.local, &options_path, false)?;

        state.column_families.push(handle.clone());
        Ok(handle)
    }

    /// Write one key to the WAL and the memtable. Returns its sequence
    /// number.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<SequenceNumber> {
        let mut state = self.state.lock();
        state.last_sequence += 1;
        let sequence = state.last_sequence;
        let wal_path = self.paths.wal(state.current_wal());
        OpenOptions::new()
            .append(true)
            .open(&wal_path)?
            .write_all(&encode_wal_record(sequence, key, value))?;
        state.memtable.push((key.to_vec(), value.to_vec(), sequence));
        Ok(sequence)
    }

    /// Add a table file to a column family. Returns its file number.
    pub fn add_table(&self, cf: &ColumnFamilyHandle, spec: TableSpec) -> Result<FileNumber> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let number = state.allocate_file_number();
        state.last_sequence += 1;
        let sequence = state.last_sequence;
        std::fs::write(self.paths.table(number), file_body(number, spec.size))?;

        let checksum = spec.checksum.clone().unwrap_or_else(|| FileChecksum::new("", ""));
        state.manifest.add_record(&VersionEdit {
            column_family: cf.id,
            next_file_number: Some(state.next_file_number),
            last_sequence: Some(sequence),
            new_files: vec![NewFileEntry {
                level: spec.level,
                file_number: number,
                file_size: spec.size,
                smallest_seqno: sequence,
                largest_seqno: sequence,
                smallest_key: spec.smallest_key.clone(),
                largest_key: spec.largest_key.clone(),
                oldest_blob_file_number: INVALID_FILE_NUMBER,
                file_checksum_func_name: checksum.func_name,
                file_checksum: checksum.value,
            }],
            ..Default::default()
        })?;

        state.tables.push(TableFile {
            cf_id: cf.id,
            level: spec.level,
            meta: SstFileMetaData {
                size: spec.size,
                name: table_file_name(number),
                file_number: number,
                db_path: self.paths.root().to_path_buf(),
                smallest_seqno: sequence,
                largest_seqno: sequence,
                smallest_key: spec.smallest_key,
                largest_key: spec.largest_key,
                oldest_blob_file_number: INVALID_FILE_NUMBER,
            },
        });
        Ok(number)
    }

    /// Add a blob file. Returns its file number.
    pub fn add_blob(&self, size: u64, checksum: Option<FileChecksum>) -> Result<FileNumber> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let number = state.allocate_file_number();
        std::fs::write(self.paths.blob(number), file_body(number, size))?;

        let checksum = checksum.unwrap_or_else(|| FileChecksum::new("", ""));
        state.manifest.add_record(&VersionEdit {
            next_file_number: Some(state.next_file_number),
            new_blob_files: vec![NewBlobFileEntry {
                blob_file_number: number,
                total_blob_bytes: size,
                file_checksum_func_name: checksum.func_name,
                file_checksum: checksum.value,
            }],
            ..Default::default()
        })?;
        state.blobs.push(number);
        Ok(number)
    }

    /// Drop a table as compaction would. The file is deleted at once, or
    /// when file deletions are enabled again.
    pub fn compact_away(&self, number: FileNumber) -> Result<()> {
        let mut state = self.state.lock();
        let position = state
            .tables
            .iter()
            .position(|t| t.meta.file_number == number)
            .ok_or_else(|| Error::invalid_argument(format!("no table {}", number)))?;
        let table = state.tables.remove(position);
        state.manifest.add_record(&VersionEdit {
            column_family: table.cf_id,
            deleted_files: vec![DeletedFileEntry {
                level: table.level,
                file_number: number,
            }],
            ..Default::default()
        })?;

        let path = self.paths.table(number);
        if self.deletions_disabled.load(Ordering::SeqCst) == 0 {
            std::fs::remove_file(path)?;
        } else {
            state.pending_deletions.push(path);
        }
        Ok(())
    }

    /// Start a new WAL segment without flushing. Returns its log number.
    pub fn roll_wal(&self) -> Result<u64> {
        let mut state = self.state.lock();
        self.roll_wal_locked(&mut state)
    }

    fn roll_wal_locked(&self, state: &mut State) -> Result<u64> {
        let number = state.allocate_file_number();
        create_file(&self.local, &self.paths.wal(number), "", false)?;
        state.wals.push((number, WalFileKind::Alive));
        Ok(number)
    }

    /// Mark a WAL segment archived
    pub fn archive_wal(&self, log_number: u64) {
        let mut state = self.state.lock();
        for (number, kind) in state.wals.iter_mut() {
            if *number == log_number {
                *kind = WalFileKind::Archived;
            }
        }
    }

    fn flush_memtable_locked(&self, state: &mut State) -> Result<()> {
        if state.memtable.is_empty() {
            return Ok(());
        }
        self.memtable_flushes.fetch_add(1, Ordering::SeqCst);

        let mut entries = std::mem::take(&mut state.memtable);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let mut body = Vec::new();
        for (key, value, sequence) in &entries {
            body.extend_from_slice(&encode_wal_record(*sequence, key, value));
        }

        let number = state.allocate_file_number();
        std::fs::write(self.paths.table(number), &body)?;
        let smallest_seqno = entries.iter().map(|e| e.2).min().unwrap_or(0);
        let largest_seqno = entries.iter().map(|e| e.2).max().unwrap_or(0);
        let smallest_key = entries.first().map(|e| e.0.clone()).unwrap_or_default();
        let largest_key = entries.last().map(|e| e.0.clone()).unwrap_or_default();

        let new_log = self.roll_wal_locked(state)?;
        state.min_log_to_keep = new_log;
        state.manifest.add_record(&VersionEdit {
            log_number: Some(new_log),
            next_file_number: Some(state.next_file_number),
            last_sequence: Some(state.last_sequence),
            new_files: vec![NewFileEntry {
                level: 0,
                file_number: number,
                file_size: body.len() as u64,
                smallest_seqno,
                largest_seqno,
                smallest_key: smallest_key.clone(),
                largest_key: largest_key.clone(),
                ..Default::default()
            }],
            ..Default::default()
        })?;

        state.tables.push(TableFile {
            cf_id: 0,
            level: 0,
            meta: SstFileMetaData {
                size: body.len() as u64,
                name: table_file_name(number),
                file_number: number,
                db_path: self.paths.root().to_path_buf(),
                smallest_seqno,
                largest_seqno,
                smallest_key,
                largest_key,
                oldest_blob_file_number: INVALID_FILE_NUMBER,
            },
        });
        Ok(())
    }

    /// Make `min_log_number_to_keep` return this value instead of the
    /// engine's own
    pub fn set_min_log_number_to_keep(&self, value: Option<u64>) {
        self.state.lock().min_log_override = Some(value);
    }

    /// Add a name to every live-file listing
    pub fn inject_live_file(&self, name: &str) {
        self.state.lock().extra_live_files.push(name.to_string());
    }

    /// Choose how `disable_file_deletions` answers
    pub fn set_disable_behavior(&self, behavior: DeletionControl) {
        *self.disable_behavior.lock() = behavior;
    }

    /// Make `enable_file_deletions` fail (after counting the call)
    pub fn set_fail_enable(&self, fail: bool) {
        self.fail_enable.store(fail, Ordering::SeqCst);
    }

    /// Run `hook` after every WAL enumeration
    pub fn set_after_wal_enumeration(&self, hook: impl Fn(&TestDb) + Send + Sync + 'static) {
        *self.after_wal_enumeration.lock() = Some(Arc::new(hook));
    }

    /// Size of a WAL segment on disk
    pub fn wal_size(&self, log_number: u64) -> Result<u64> {
        Ok(std::fs::metadata(self.paths.wal(log_number))?.len())
    }

    /// Log number of the segment currently written to
    pub fn current_wal(&self) -> u64 {
        self.state.lock().current_wal()
    }

    /// Calls to `disable_file_deletions`
    pub fn disable_calls(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }

    /// Calls to `enable_file_deletions`
    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    /// Current deletion-protection counter
    pub fn deletions_disabled(&self) -> usize {
        self.deletions_disabled.load(Ordering::SeqCst)
    }

    /// Flushes requested (`live_files(true)` and `flush`)
    pub fn flush_requests(&self) -> usize {
        self.flush_requests.load(Ordering::SeqCst)
    }

    /// Flushes that wrote a table file
    pub fn memtable_flushes(&self) -> usize {
        self.memtable_flushes.load(Ordering::SeqCst)
    }

    /// Calls to `flush_wal`
    pub fn flush_wal_calls(&self) -> usize {
        self.flush_wal_calls.load(Ordering::SeqCst)
    }

    /// Calls to `live_files`
    pub fn live_files_calls(&self) -> usize {
        self.live_files_calls.load(Ordering::SeqCst)
    }
}

impl DbEngine for TestDb {
    fn name(&self) -> &Path {
        self.paths.root()
    }

    fn db_options(&self) -> DbOptions {
        self.options.clone()
    }

    fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    fn latest_sequence_number(&self) -> SequenceNumber {
        self.state.lock().last_sequence
    }

    fn live_files(&self, flush_memtable: bool) -> Result<LiveFiles> {
        self.live_files_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if flush_memtable {
            self.flush_requests.fetch_add(1, Ordering::SeqCst);
            self.flush_memtable_locked(&mut state)?;
        }

        let mut files: Vec<String> = state.tables.iter().map(|t| t.meta.name.clone()).collect();
        files.extend(state.blobs.iter().map(|n| blob_file_name(*n)));
        files.push("/CURRENT".to_string());
        files.push(descriptor_file_name(state.manifest_number));
        files.push(options_file_name(state.options_number));
        files.extend(state.extra_live_files.iter().cloned());

        Ok(LiveFiles {
            files,
            manifest_file_size: state.manifest.size(),
        })
    }

    fn sorted_wal_files(&self) -> Result<Vec<WalFile>> {
        let wals = {
            let state = self.state.lock();
            let mut wals = Vec::with_capacity(state.wals.len());
            for (number, kind) in &state.wals {
                wals.push(WalFile {
                    log_number: *number,
                    size_file_bytes: std::fs::metadata(self.paths.wal(*number))?.len(),
                    kind: *kind,
                    path_name: log_file_name(*number),
                });
            }
            wals
        };

        let hook = self.after_wal_enumeration.lock().clone();
        if let Some(hook) = hook {
            hook(self);
        }
        Ok(wals)
    }

    fn flush_wal(&self, _sync: bool) -> Result<()> {
        self.flush_wal_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn min_log_number_to_keep(&self) -> Option<u64> {
        let state = self.state.lock();
        match state.min_log_override {
            Some(value) => value,
            None => Some(state.min_log_to_keep),
        }
    }

    fn disable_file_deletions(&self) -> Result<()> {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        match *self.disable_behavior.lock() {
            DeletionControl::Supported => {
                self.deletions_disabled.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            DeletionControl::NotSupported => {
                Err(Error::not_supported("file deletions cannot be disabled"))
            }
            DeletionControl::Fail => Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected disable_file_deletions failure",
            ))),
        }
    }

    fn enable_file_deletions(&self, force: bool) -> Result<()> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_enable.load(Ordering::SeqCst) {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected enable_file_deletions failure",
            )));
        }

        let remaining = if force {
            self.deletions_disabled.store(0, Ordering::SeqCst);
            0
        } else {
            let previous = self
                .deletions_disabled
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
                .unwrap_or(0);
            previous.saturating_sub(1)
        };

        if remaining == 0 {
            let pending = std::mem::take(&mut self.state.lock().pending_deletions);
            for path in pending {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn column_family_metadata(&self, cf: &ColumnFamilyHandle) -> ColumnFamilyMetaData {
        let state = self.state.lock();
        let files: Vec<&TableFile> = state.tables.iter().filter(|t| t.cf_id == cf.id).collect();
        let max_level = files.iter().map(|t| t.level).max().unwrap_or(0);

        let levels: Vec<LevelMetaData> = (0..=max_level)
            .map(|level| {
                let level_files: Vec<SstFileMetaData> = files
                    .iter()
                    .filter(|t| t.level == level)
                    .map(|t| t.meta.clone())
                    .collect();
                LevelMetaData {
                    level,
                    size: level_files.iter().map(|f| f.size).sum(),
                    files: level_files,
                }
            })
            .collect();

        ColumnFamilyMetaData {
            name: cf.name.clone(),
            size: levels.iter().map(|l| l.size).sum(),
            file_count: files.len(),
            levels,
        }
    }

    fn flush(&self, cf: &ColumnFamilyHandle) -> Result<()> {
        self.flush_requests.fetch_add(1, Ordering::SeqCst);
        if cf.id == 0 {
            let mut state = self.state.lock();
            self.flush_memtable_locked(&mut state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::get_file_checksums_from_manifest;
    use tempfile::tempdir;

    #[test]
    fn test_open_lays_out_directory() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();

        let root = db.paths().root();
        assert_eq!(
            std::fs::read_to_string(root.join("CURRENT")).unwrap(),
            "MANIFEST-000001\n"
        );
        assert!(root.join("OPTIONS-000002").exists());
        assert!(root.join("000003.log").exists());
        assert_eq!(db.current_wal(), 3);
        assert_eq!(db.min_log_number_to_keep(), Some(3));
    }

    #[test]
    fn test_flush_rolls_wal() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();
        db.put(b"k1", b"v1").unwrap();
        db.put(b"k0", b"v0").unwrap();
        assert!(db.wal_size(3).unwrap() > 0);

        let live = db.live_files(true).unwrap();
        assert_eq!(db.memtable_flushes(), 1);
        assert!(live.files.contains(&"/000004.sst".to_string()));
        assert_eq!(db.current_wal(), 5);
        assert_eq!(db.min_log_number_to_keep(), Some(5));

        let md = db.column_family_metadata(&db.default_column_family());
        assert_eq!(md.file_count, 1);
        assert_eq!(md.levels[0].files[0].smallest_key, b"k0".to_vec());
        assert_eq!(md.levels[0].files[0].largest_key, b"k1".to_vec());

        // Nothing to flush the second time
        db.live_files(true).unwrap();
        assert_eq!(db.memtable_flushes(), 1);
        assert_eq!(db.flush_requests(), 2);
    }

    #[test]
    fn test_deferred_deletion() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();
        let cf = db.default_column_family();
        let number = db.add_table(&cf, TableSpec::new("a", "b", 10)).unwrap();

        db.disable_file_deletions().unwrap();
        db.compact_away(number).unwrap();
        assert!(db.paths().table(number).exists());

        db.enable_file_deletions(false).unwrap();
        assert!(!db.paths().table(number).exists());
        assert_eq!(db.deletions_disabled(), 0);
    }

    #[test]
    fn test_manifest_records_checksums() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();
        let cf = db.default_column_family();
        let with = db
            .add_table(&cf, TableSpec::new("a", "b", 10).with_checksum("crc32c", "deadbeef"))
            .unwrap();
        let without = db.add_table(&cf, TableSpec::new("c", "d", 10)).unwrap();

        let live = db.live_files(false).unwrap();
        let list = get_file_checksums_from_manifest(
            &LocalFileSystem::new(),
            &db.paths().manifest(1),
            live.manifest_file_size,
        )
        .unwrap();
        assert_eq!(
            list.search_one_file_checksum(with),
            Some(&FileChecksum::new("crc32c", "deadbeef"))
        );
        assert!(list.search_one_file_checksum(without).is_none());
    }

    #[test]
    fn test_column_family_recorded_in_options() {
        let dir = tempdir().unwrap();
        let db = TestDb::open(dir.path().join("db"), DbOptions::default()).unwrap();
        let cf = db.create_column_family("users", "rev").unwrap();
        assert_eq!(cf.id, 1);

        let options =
            OptionsFile::load(&LocalFileSystem::new(), &db.paths().options(2)).unwrap();
        assert_eq!(options.column_families.len(), 2);
        assert_eq!(options.column_families[1].comparator, "rev");
    }
}
