//! Error types for checkpoint and export operations
//!
//! This module defines the single error taxonomy returned by every operation
//! in the workspace. We use `thiserror` for automatic `Display` and `Error`
//! trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for checkpoint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for checkpoint and export operations
#[derive(Debug, Error)]
pub enum Error {
    /// The target path is already present
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Caller supplied an unusable argument, or the engine could not
    /// report a value the operation depends on
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Data corruption detected (unparsable file name, bad record CRC, ...)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Operation is not supported here
    ///
    /// Hard links report this across device boundaries; the transfer
    /// engine consumes it and falls back to copying.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Serialization/deserialization error (manifest records, options file)
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create an `AlreadyExists` error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Error::AlreadyExists(msg.into())
    }

    /// Create an `InvalidArgument` error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a `Corruption` error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Create a `NotSupported` error
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Error::NotSupported(msg.into())
    }

    /// True for `NotSupported`
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported(_))
    }

    /// True for `AlreadyExists`
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists(_))
    }

    /// True for `Corruption`
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }

    /// True for `InvalidArgument`
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_already_exists() {
        let err = Error::already_exists("/tmp/ckpt");
        let msg = err.to_string();
        assert!(msg.contains("Already exists"));
        assert!(msg.contains("/tmp/ckpt"));
    }

    #[test]
    fn test_error_display_corruption() {
        let err = Error::corruption("can't parse file name");
        let msg = err.to_string();
        assert!(msg.contains("Data corruption"));
        assert!(msg.contains("can't parse file name"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_predicates() {
        assert!(Error::not_supported("link").is_not_supported());
        assert!(!Error::corruption("x").is_not_supported());
        assert!(Error::already_exists("x").is_already_exists());
        assert!(Error::invalid_argument("x").is_invalid_argument());
        assert!(Error::corruption("x").is_corruption());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_error() -> Result<i32> {
            Err(Error::invalid_argument("test"))
        }

        assert!(returns_error().is_err());
    }
}
