//! Application configuration types.
//!
//! The top-level [`Config`] is deserialized from JSON and carries the
//! sub-configs for tools, recovery behavior, and scanning. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub recovery: RecoveryConfig,
    pub scan: ScanConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Internal(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.scan.prefix_read_bytes < 16 {
            warnings.push(format!(
                "scan.prefix_read_bytes is {}; signature detection needs at least 16 bytes",
                self.scan.prefix_read_bytes
            ));
        }

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!("tools.ffmpeg_path does not exist: {}", p.display()));
            }
        }
        if let Some(ref p) = self.tools.ffprobe_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffprobe_path does not exist: {}",
                    p.display()
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools. When unset, tools are resolved from `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Recovery behavior switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Re-encode recovered WebM/MKV groups to MP4 (default) instead of
    /// keeping the WebM container.
    pub convert_webm_to_mp4: bool,
    /// Produce an additional MP4 rendition of recovered GIFs.
    pub gif_to_mp4: bool,
    /// Join all successfully recovered videos into one output, ordered by
    /// modification time.
    pub concatenate_videos: bool,
    /// Place outputs under per-category subdirectories.
    pub organize_by_type: bool,
    /// Render a sibling `_thumb.jpg` for every recovered video.
    pub generate_thumbnails: bool,
    /// Re-encode single-file recovered videos for playability. Disabling
    /// keeps the copied bytes untouched (probe-first workflows).
    pub reencode_recovered_video: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            convert_webm_to_mp4: true,
            gif_to_mp4: false,
            concatenate_videos: false,
            organize_by_type: false,
            generate_thumbnails: true,
            reencode_recovered_video: true,
        }
    }
}

/// Scan tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Bytes read from each file for signature detection.
    #[serde(default = "default_prefix_read")]
    pub prefix_read_bytes: usize,
    /// Directory for the thumbnail result cache. `None` disables caching.
    pub thumbnail_cache_dir: Option<PathBuf>,
}

fn default_prefix_read() -> usize {
    256
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            prefix_read_bytes: default_prefix_read(),
            thumbnail_cache_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.recovery.convert_webm_to_mp4);
        assert!(cfg.recovery.reencode_recovered_video);
        assert!(!cfg.recovery.concatenate_videos);
        assert_eq!(cfg.scan.prefix_read_bytes, 256);
        assert!(cfg.tools.ffmpeg_path.is_none());
    }

    #[test]
    fn default_config_no_warnings() {
        let warnings = Config::default().validate();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.scan.prefix_read_bytes, 256);
        assert!(cfg.recovery.generate_thumbnails);
    }

    #[test]
    fn parse_partial_json() {
        let cfg =
            Config::from_json(r#"{"recovery": {"convert_webm_to_mp4": false}}"#).unwrap();
        assert!(!cfg.recovery.convert_webm_to_mp4);
        // Untouched fields keep defaults.
        assert!(cfg.recovery.reencode_recovered_video);
    }

    #[test]
    fn tiny_prefix_read_warns() {
        let cfg = Config::from_json(r#"{"scan": {"prefix_read_bytes": 4}}"#).unwrap();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("prefix_read_bytes")));
    }

    #[test]
    fn missing_ffmpeg_path_warns() {
        let cfg =
            Config::from_json(r#"{"tools": {"ffmpeg_path": "/nonexistent/ffmpeg"}}"#).unwrap();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("ffmpeg_path")));
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.scan.prefix_read_bytes, 256);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.scan.prefix_read_bytes, 256);
    }
}
