//! Unified error type for the cachephoenix application.
//!
//! All crates funnel their failures into [`Error`]. Failures are values:
//! nothing in the library crates panics on malformed cache data, and a
//! recovery batch keeps going when individual resources fail.

use std::path::Path;

/// errno for an operation not permitted (macOS TCC/Full Disk Access denial).
pub const EPERM: i32 = 1;
/// errno for POSIX permission denied (also raised by byte-range lock conflicts
/// on Simple Cache `_s` files held open by the running browser).
pub const EACCES: i32 = 13;

/// Unified error type covering all failure modes in cachephoenix.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read was denied by the OS. `errno` distinguishes TCC (EPERM) from
    /// POSIX permissions / byte-range locks (EACCES).
    #[error("Permission denied reading {path} (errno {errno}): {hint}")]
    PermissionDenied {
        /// Path of the file that could not be read.
        path: String,
        /// Raw OS error number.
        errno: i32,
        /// Actionable guidance for the user.
        hint: String,
    },

    /// A cache record did not match the expected on-disk format.
    #[error("Malformed cache record in {path}: {reason}")]
    CacheFormat {
        /// Path of the offending cache file.
        path: String,
        /// What failed to parse.
        reason: String,
    },

    /// Binary parsing (box walking, signature probing) failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A recovery step failed for a single resource.
    #[error("Recovery error [{step}]: {message}")]
    Recovery {
        /// The recovery step that failed (copy, assemble, remux, ...).
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify a read failure: permission errnos get their own variant with
    /// actionable guidance, everything else stays an I/O error.
    pub fn from_read(path: &Path, e: std::io::Error) -> Self {
        match e.raw_os_error() {
            Some(EPERM) => Error::PermissionDenied {
                path: path.display().to_string(),
                errno: EPERM,
                hint: "macOS TCC/FDA denial; grant Full Disk Access to this binary".into(),
            },
            Some(EACCES) => Error::PermissionDenied {
                path: path.display().to_string(),
                errno: EACCES,
                hint: "file may be locked by the running browser; close it and retry".into(),
            },
            _ => Error::Io { source: e },
        }
    }

    /// True when this error is a permission denial (either errno).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. })
    }

    /// Convenience constructor for [`Error::CacheFormat`].
    pub fn cache_format(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Error::CacheFormat {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Recovery`].
    pub fn recovery(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Recovery {
            step: step.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
