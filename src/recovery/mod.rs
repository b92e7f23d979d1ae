//! Recovery driver: materialize selected resources as playable files.

mod driver;
mod progress;

pub use driver::{RecoveryDriver, RecoveryOptions, RecoverySummary};

/// Sentinel written into the output directory before any recovered file, so
/// other tooling can recognize a recovery output folder.
pub const OUTPUT_MARKER: &str = ".cachephoenix_marker";
