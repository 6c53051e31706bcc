//! Core types for the Strata checkpoint engine
//!
//! This crate defines the foundational pieces shared by the durability layer:
//! - Error: Error taxonomy for checkpoint and export operations
//! - Types: Sequence and file numbers
//! - Filename: Classification and construction of engine file names

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filename;
pub mod types;

pub use error::{Error, Result};
pub use filename::{classify, parse_file_name, FileType};
pub use types::{FileNumber, SequenceNumber, INVALID_FILE_NUMBER};
