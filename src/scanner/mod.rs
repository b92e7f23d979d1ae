//! Cache directory scanner.
//!
//! Turns a directory of raw cache files into a catalogue of [`Resource`]s:
//! listing, signature detection, Simple Cache group resolution, and the
//! Blockfile chunk-grouping walk.

mod grouper;

use std::path::Path;
use std::sync::Arc;

use cp_core::config::Config;
use cp_core::progress::{CancelFlag, ScanPhase, ScanProgress, ScanProgressFn};
use cp_core::{Resource, Result};
use tracing::info;

/// Scanner for discovering recoverable media in a cache directory.
pub struct Scanner {
    config: Arc<Config>,
    progress: Option<ScanProgressFn>,
    cancel: CancelFlag,
}

impl Scanner {
    /// Create a new scanner.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ScanProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attach an external cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn emit(&self, phase: ScanPhase, current: usize, total: usize, file: Option<&str>) {
        if let Some(ref cb) = self.progress {
            cb(&ScanProgress {
                phase,
                current,
                total,
                current_file: file.map(|s| s.to_string()),
            });
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn prefix_read_bytes(&self) -> usize {
        self.config.scan.prefix_read_bytes
    }

    /// Scan a cache directory and return the discovered resources.
    ///
    /// Resources are emitted in discovery order: Simple Cache entries first
    /// (by hash), then Blockfile groups in hex order, then one trailing
    /// `unknown_data` resource holding the unidentified leftovers.
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<Resource>> {
        info!("Scanning cache directory: {}", dir.display());
        self.emit(ScanPhase::Listing, 0, 0, None);

        let entries = cp_cache::list_cache_files(dir)?;
        info!("Found {} cache files", entries.len());

        let resources = grouper::group(self, entries)?;

        self.emit(ScanPhase::Done, resources.len(), resources.len(), None);
        info!("Scan complete: {} resources", resources.len());
        Ok(resources)
    }
}
