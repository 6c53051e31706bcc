//! Engine file naming
//!
//! Every file in a database directory has a name that encodes its kind and,
//! for most kinds, a file number:
//!
//! ```text
//! db/
//! ├── CURRENT            # names the active manifest
//! ├── MANIFEST-000005    # descriptor: version edits
//! ├── OPTIONS-000007     # persisted options
//! ├── 000012.sst         # table file
//! ├── 000013.blob        # blob file
//! ├── 000014.log         # WAL segment
//! ├── LOCK, IDENTITY, LOG, LOG.old.<ts>
//! └── *.dbtmp            # temporary files
//! ```
//!
//! Live-file listings report names with a leading `/`; parsing ignores it.

use crate::error::{Error, Result};
use crate::types::FileNumber;

/// Name of the file that points at the active manifest
pub const CURRENT_FILE_NAME: &str = "CURRENT";

/// Name of the engine's lock file
pub const LOCK_FILE_NAME: &str = "LOCK";

/// Name of the engine identity file
pub const IDENTITY_FILE_NAME: &str = "IDENTITY";

/// Name of the info log
pub const INFO_LOG_FILE_NAME: &str = "LOG";

const DESCRIPTOR_PREFIX: &str = "MANIFEST-";
const OPTIONS_PREFIX: &str = "OPTIONS-";
const META_DATABASE_PREFIX: &str = "METADB-";
const OLD_INFO_LOG_PREFIX: &str = "LOG.old.";
const TEMP_SUFFIX: &str = "dbtmp";

/// Kind of an engine file, as derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Write-ahead log segment (`<n>.log`)
    WalFile,
    /// Lock file (`LOCK`)
    DbLockFile,
    /// Sorted table file (`<n>.sst`, legacy `<n>.ldb`)
    TableFile,
    /// Manifest / descriptor (`MANIFEST-<n>`)
    DescriptorFile,
    /// Pointer to the active manifest (`CURRENT`)
    CurrentFile,
    /// Temporary file (`<n>.dbtmp`, `OPTIONS-<n>.dbtmp`)
    TempFile,
    /// Info log (`LOG`, `LOG.old.<ts>`)
    InfoLogFile,
    /// Meta database (`METADB-<n>`)
    MetaDatabase,
    /// Identity file (`IDENTITY`)
    IdentityFile,
    /// Persisted options (`OPTIONS-<n>`)
    OptionsFile,
    /// Large-value blob file (`<n>.blob`)
    BlobFile,
}

impl FileType {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            FileType::WalFile => "wal",
            FileType::DbLockFile => "lock",
            FileType::TableFile => "table",
            FileType::DescriptorFile => "manifest",
            FileType::CurrentFile => "current",
            FileType::TempFile => "temp",
            FileType::InfoLogFile => "info_log",
            FileType::MetaDatabase => "meta_db",
            FileType::IdentityFile => "identity",
            FileType::OptionsFile => "options",
            FileType::BlobFile => "blob",
        }
    }

    /// True for the kinds a live-file listing may contain
    pub fn is_live_file_kind(&self) -> bool {
        matches!(
            self,
            FileType::TableFile
                | FileType::BlobFile
                | FileType::DescriptorFile
                | FileType::CurrentFile
                | FileType::OptionsFile
        )
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn parse_number(digits: &str) -> Option<FileNumber> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a file name into its number and kind.
///
/// A single leading `/` is ignored. Returns `None` for names that do not
/// follow the engine's naming scheme.
pub fn parse_file_name(name: &str) -> Option<(FileNumber, FileType)> {
    let name = name.strip_prefix('/').unwrap_or(name);

    match name {
        CURRENT_FILE_NAME => return Some((0, FileType::CurrentFile)),
        LOCK_FILE_NAME => return Some((0, FileType::DbLockFile)),
        IDENTITY_FILE_NAME => return Some((0, FileType::IdentityFile)),
        INFO_LOG_FILE_NAME => return Some((0, FileType::InfoLogFile)),
        _ => {}
    }

    if let Some(ts) = name.strip_prefix(OLD_INFO_LOG_PREFIX) {
        return parse_number(ts).map(|n| (n, FileType::InfoLogFile));
    }
    if let Some(rest) = name.strip_prefix(DESCRIPTOR_PREFIX) {
        return parse_number(rest).map(|n| (n, FileType::DescriptorFile));
    }
    if let Some(rest) = name.strip_prefix(OPTIONS_PREFIX) {
        return match rest.split_once('.') {
            None => parse_number(rest).map(|n| (n, FileType::OptionsFile)),
            Some((digits, TEMP_SUFFIX)) => parse_number(digits).map(|n| (n, FileType::TempFile)),
            Some(_) => None,
        };
    }
    if let Some(rest) = name.strip_prefix(META_DATABASE_PREFIX) {
        return parse_number(rest).map(|n| (n, FileType::MetaDatabase));
    }

    let (digits, suffix) = name.split_once('.')?;
    let number = parse_number(digits)?;
    let file_type = match suffix {
        "log" => FileType::WalFile,
        "sst" | "ldb" => FileType::TableFile,
        "blob" => FileType::BlobFile,
        TEMP_SUFFIX => FileType::TempFile,
        _ => return None,
    };
    Some((number, file_type))
}

/// Classify a name from a live-file listing.
///
/// # Errors
///
/// `Corruption` if the name cannot be parsed. The engine produced the
/// listing, so an unparsable entry means its bookkeeping is inconsistent.
pub fn classify(name: &str) -> Result<(FileNumber, FileType)> {
    parse_file_name(name)
        .ok_or_else(|| Error::corruption(format!("can't parse file name '{}'", name)))
}

/// `/<n>.sst`
pub fn table_file_name(number: FileNumber) -> String {
    format!("/{:06}.sst", number)
}

/// `/<n>.blob`
pub fn blob_file_name(number: FileNumber) -> String {
    format!("/{:06}.blob", number)
}

/// `/<n>.log`
pub fn log_file_name(number: FileNumber) -> String {
    format!("/{:06}.log", number)
}

/// `/MANIFEST-<n>`
pub fn descriptor_file_name(number: FileNumber) -> String {
    format!("/{}{:06}", DESCRIPTOR_PREFIX, number)
}

/// `/OPTIONS-<n>`
pub fn options_file_name(number: FileNumber) -> String {
    format!("/{}{:06}", OPTIONS_PREFIX, number)
}

/// `/CURRENT`
pub fn current_file_name() -> String {
    format!("/{}", CURRENT_FILE_NAME)
}
