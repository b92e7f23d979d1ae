//! Core record types: cache file entries and reconstructed resources.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::media::{MediaCategory, MediaKind};

// ---------------------------------------------------------------------------
// CacheFileEntry
// ---------------------------------------------------------------------------

/// One file found in a cache directory. Produced only by filesystem listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFileEntry {
    /// Filename without directory (e.g. `f_00630b` or `170e8695a0c85bd4_s`).
    pub name: String,
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes on disk.
    pub size: u64,
    /// Modification time as Unix seconds, if the filesystem reports one.
    pub modified_at: Option<f64>,
}

// ---------------------------------------------------------------------------
// VideoInfo
// ---------------------------------------------------------------------------

/// Track metadata extracted from an MP4 `moov` subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u16,
    pub height: u16,
    /// Four-char sample-entry type of the first video track (e.g. "avc1").
    pub video_codec: String,
    /// Four-char sample-entry type of the first audio track (e.g. "mp4a").
    pub audio_codec: String,
    pub duration_seconds: f64,
    pub has_video: bool,
    pub has_audio: bool,
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A logical media object reconstructed from one or more cache files.
///
/// This is the unit the UI displays and the user selects for recovery.
/// `files` is order-significant: index 0 is always the header file for
/// multi-file resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Stable within one scan.
    pub id: u32,
    pub kind: MediaKind,
    pub category: MediaCategory,
    pub files: Vec<CacheFileEntry>,
    /// Name of the header file for multi-file resources.
    pub header_file_name: Option<String>,
    /// Sum of all member file sizes.
    pub total_size: u64,
    pub display_name: String,
    pub video_info: Option<VideoInfo>,
    /// Max of member modification times.
    pub modified_at: Option<f64>,
    /// Mutated only by the UI.
    pub selected: bool,
}

impl Resource {
    /// Build a resource from its member files, deriving the aggregate fields.
    ///
    /// `total_size` is the sum of member sizes and `modified_at` the max of
    /// member times; `header_file_name` is set for multi-file resources.
    pub fn from_files(
        id: u32,
        kind: MediaKind,
        display_name: impl Into<String>,
        files: Vec<CacheFileEntry>,
        video_info: Option<VideoInfo>,
    ) -> Self {
        let total_size = files.iter().map(|f| f.size).sum();
        let modified_at = files
            .iter()
            .filter_map(|f| f.modified_at)
            .fold(None, |acc: Option<f64>, t| {
                Some(acc.map_or(t, |a| a.max(t)))
            });
        let header_file_name = if files.len() > 1 {
            files.first().map(|f| f.name.clone())
        } else {
            None
        };

        Self {
            id,
            kind,
            category: kind.category(),
            files,
            header_file_name,
            total_size,
            display_name: display_name.into(),
            video_info,
            modified_at,
            selected: false,
        }
    }
}

// ---------------------------------------------------------------------------
// CachePathInfo
// ---------------------------------------------------------------------------

/// Descriptor of a candidate cache source directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePathInfo {
    pub path: String,
    pub exists: bool,
    /// Number of files matching a cache filename shape.
    pub file_count: usize,
    /// Total size of matching files in bytes.
    pub total_size: u64,
    /// Human-readable client name (e.g. "Discord Canary", "Chrome (Profile 2)").
    pub client_name: String,
}
