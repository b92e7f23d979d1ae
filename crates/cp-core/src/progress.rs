//! Scan and recovery progress payloads, callback sinks, and cancellation.
//!
//! Progress sinks are function objects threaded through the call stack; the
//! core never owns an output stream. Cancellation is a single atomic flag
//! observed cooperatively between phases and between resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Scan progress
// ---------------------------------------------------------------------------

/// Phase of a directory scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    Listing,
    Detecting,
    Grouping,
    Thumbnails,
    Done,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing => write!(f, "listing"),
            Self::Detecting => write!(f, "detecting"),
            Self::Grouping => write!(f, "grouping"),
            Self::Thumbnails => write!(f, "thumbnails"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Progress snapshot emitted during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    pub phase: ScanPhase,
    pub current: usize,
    pub total: usize,
    pub current_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Recovery progress
// ---------------------------------------------------------------------------

/// Phase of a recovery batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPhase {
    Copying,
    Reconstructing,
    Encoding,
    Validating,
    Complete,
}

impl fmt::Display for RecoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copying => write!(f, "copying"),
            Self::Reconstructing => write!(f, "reconstructing"),
            Self::Encoding => write!(f, "encoding"),
            Self::Validating => write!(f, "validating"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Progress snapshot emitted during recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryProgress {
    pub phase: RecoveryPhase,
    pub current: usize,
    pub total: usize,
    pub current_file: Option<String>,
    /// Accumulated log lines (throttled; the `complete` phase always flushes).
    pub log: Vec<String>,
    /// Accumulated per-resource errors. Errors never abort the batch.
    pub errors: Vec<String>,
}

/// Callback sink for scan progress.
pub type ScanProgressFn = Box<dyn Fn(&ScanProgress) + Send + Sync>;

/// Callback sink for recovery progress.
pub type RecoveryProgressFn = Box<dyn Fn(&RecoveryProgress) + Send + Sync>;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag shared between the UI and a running task.
///
/// Cancelling aborts further work but never rolls back outputs already
/// written.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
