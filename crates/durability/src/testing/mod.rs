//! Testing utilities for checkpoint and export
//!
//! - **TestDb**: An on-disk fake engine with call counters and hooks
//! - **FaultInjectionFs**: A file system that fails on demand
//!
//! # Example
//!
//! ```ignore
//! use strata_durability::testing::{FaultInjectionFs, TestDb};
//!
//! let fs = Arc::new(FaultInjectionFs::new());
//! fs.set_link_not_supported(true);
//! let db = TestDb::open(dir.path().join("db"), DbOptions::default())?.with_file_system(fs);
//! ```

mod fault_fs;
mod test_db;

pub use fault_fs::FaultInjectionFs;
pub use test_db::{DeletionControl, EngineHook, TableSpec, TestDb};

/// Route `tracing` events to the test harness output. Safe to call from
/// every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
