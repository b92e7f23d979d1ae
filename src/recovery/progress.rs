//! Throttled recovery progress reporting.

use std::time::{Duration, Instant};

use cp_core::progress::{RecoveryPhase, RecoveryProgress, RecoveryProgressFn};

/// Minimum interval between non-terminal progress emissions.
const EMIT_INTERVAL: Duration = Duration::from_millis(150);

/// Accumulates log lines and errors and forwards throttled snapshots to the
/// caller's sink. Terminal emissions (the `complete` phase) always flush.
pub(super) struct Tracker<'a> {
    sink: Option<&'a RecoveryProgressFn>,
    total: usize,
    log: Vec<String>,
    errors: Vec<String>,
    last_emit: Option<Instant>,
}

impl<'a> Tracker<'a> {
    pub(super) fn new(sink: Option<&'a RecoveryProgressFn>, total: usize) -> Self {
        Self {
            sink,
            total,
            log: Vec::new(),
            errors: Vec::new(),
            last_emit: None,
        }
    }

    pub(super) fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        self.log
            .push(format!("[{}] {line}", chrono::Local::now().format("%H:%M:%S")));
    }

    pub(super) fn error(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::error!("{line}");
        self.errors.push(line);
    }

    pub(super) fn errors(&self) -> &[String] {
        &self.errors
    }

    pub(super) fn emit(&mut self, phase: RecoveryPhase, current: usize, file: Option<&str>) {
        let terminal = phase == RecoveryPhase::Complete;
        if !terminal {
            if let Some(last) = self.last_emit {
                if last.elapsed() < EMIT_INTERVAL {
                    return;
                }
            }
        }
        self.last_emit = Some(Instant::now());

        if let Some(sink) = self.sink {
            sink(&RecoveryProgress {
                phase,
                current,
                total: self.total,
                current_file: file.map(|s| s.to_string()),
                log: self.log.clone(),
                errors: self.errors.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn non_terminal_emissions_are_throttled() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let sink: RecoveryProgressFn = Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let mut tracker = Tracker::new(Some(&sink), 10);
        for i in 0..100 {
            tracker.emit(RecoveryPhase::Copying, i, None);
        }
        // Back-to-back emissions inside the window collapse to one.
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tracker.emit(RecoveryPhase::Complete, 10, None);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn complete_always_flushes() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let sink: RecoveryProgressFn = Box::new(move |p| {
            assert_eq!(p.phase, RecoveryPhase::Complete);
            c.fetch_add(1, Ordering::SeqCst);
        });

        let mut tracker = Tracker::new(Some(&sink), 1);
        tracker.emit(RecoveryPhase::Complete, 1, None);
        tracker.emit(RecoveryPhase::Complete, 1, None);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn log_and_errors_accumulate() {
        let mut tracker = Tracker::new(None, 3);
        tracker.log("copied a");
        tracker.error("b failed");
        tracker.log("copied c");
        assert_eq!(tracker.errors().len(), 1);
        assert_eq!(tracker.log.len(), 2);
    }
}
