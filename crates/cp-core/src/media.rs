//! The media-kind lattice: every byte shape the scanner can name.
//!
//! [`MediaKind`] is a closed enum; each variant carries a fixed
//! ([`MediaCategory`], default extension) pair resolved through const match
//! tables. Kinds serialize in snake_case and `Display` matches the serde
//! form.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// MediaCategory
// ---------------------------------------------------------------------------

/// Coarse grouping of media kinds, used for output directory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaCategory {
    /// Directory name used when recovery organizes output by type.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Every media kind the signature detector and grouper can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    // Images
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Tiff,
    Ico,
    Avif,
    Heic,

    // Video
    /// MP4 with both `moov` and `mdat` present in one file.
    Mp4Complete,
    /// MP4 split across multiple cache chunks; index 0 is the header file.
    Mp4Chunked,
    /// MP4 header whose `mdat` extends past the file with no chunks found.
    Mp4HeaderOnly,
    /// Mid-stream fragment (bare `styp`/`moof`/`sidx`/`mdat` prefix).
    Mp4Fragment,
    WebmMkv,
    /// WebM Cluster continuation chunk (no EBML header).
    WebmContinuation,
    Avi,
    Flv,
    MpegTs,
    Wmv,
    Mov,

    // Audio
    Mp3,
    Aac,
    Ogg,
    Flac,
    Wav,
    Opus,
    Wma,
    M4a,

    // Fallback
    UnknownData,
    RiffUnknown,
    MediaDataChunk,
}

impl MediaKind {
    /// The category this kind belongs to.
    pub fn category(&self) -> MediaCategory {
        use MediaKind::*;
        match self {
            Png | Jpeg | Gif | Webp | Bmp | Tiff | Ico | Avif | Heic => MediaCategory::Image,
            Mp4Complete | Mp4Chunked | Mp4HeaderOnly | Mp4Fragment | WebmMkv
            | WebmContinuation | Avi | Flv | MpegTs | Wmv | Mov => MediaCategory::Video,
            Mp3 | Aac | Ogg | Flac | Wav | Opus | Wma | M4a => MediaCategory::Audio,
            UnknownData | RiffUnknown | MediaDataChunk => MediaCategory::Other,
        }
    }

    /// Default file extension (including the leading dot) for recovered output.
    pub fn extension(&self) -> &'static str {
        use MediaKind::*;
        match self {
            Png => ".png",
            Jpeg => ".jpg",
            Gif => ".gif",
            Webp => ".webp",
            Bmp => ".bmp",
            Tiff => ".tiff",
            Ico => ".ico",
            Avif => ".avif",
            Heic => ".heic",
            Mp4Complete | Mp4Chunked | Mp4HeaderOnly | Mp4Fragment => ".mp4",
            WebmMkv | WebmContinuation => ".webm",
            Avi => ".avi",
            Flv => ".flv",
            MpegTs => ".ts",
            Wmv => ".wmv",
            Mov => ".mov",
            Mp3 => ".mp3",
            Aac => ".aac",
            Ogg => ".ogg",
            Flac => ".flac",
            Wav => ".wav",
            Opus => ".opus",
            Wma => ".wma",
            M4a => ".m4a",
            UnknownData | RiffUnknown | MediaDataChunk => ".bin",
        }
    }

    /// Map an HTTP `Content-Type` (parameters already stripped) to a kind.
    ///
    /// Used as a fallback when magic-byte detection fails on Simple Cache
    /// entries; it never overrides a confirmed signature.
    pub fn from_mime(mime: &str) -> Option<Self> {
        use MediaKind::*;
        let kind = match mime.trim().to_ascii_lowercase().as_str() {
            "video/mp4" => Mp4Complete,
            "video/webm" | "video/x-matroska" => WebmMkv,
            "video/x-flv" => Flv,
            "video/x-msvideo" => Avi,
            "video/quicktime" => Mov,
            "video/mp2t" => MpegTs,
            "audio/mpeg" | "audio/mp3" => Mp3,
            "audio/aac" => Aac,
            "audio/ogg" => Ogg,
            "audio/flac" => Flac,
            "audio/wav" | "audio/x-wav" => Wav,
            "audio/mp4" | "audio/x-m4a" => M4a,
            "audio/x-ms-wma" => Wma,
            "image/png" => Png,
            "image/jpeg" => Jpeg,
            "image/gif" => Gif,
            "image/webp" => Webp,
            "image/bmp" => Bmp,
            "image/tiff" => Tiff,
            "image/x-icon" | "image/vnd.microsoft.icon" => Ico,
            "image/avif" => Avif,
            "image/heic" | "image/heif" => Heic,
            _ => return None,
        };
        Some(kind)
    }

    /// True for any of the MP4 family kinds.
    pub fn is_mp4_variant(&self) -> bool {
        matches!(
            self,
            Self::Mp4Complete | Self::Mp4Chunked | Self::Mp4HeaderOnly | Self::Mp4Fragment
        )
    }

    /// Audio kinds whose first chunk can head a Blockfile group.
    pub fn is_audio_header(&self) -> bool {
        matches!(
            self,
            Self::Mp3
                | Self::Ogg
                | Self::Aac
                | Self::Flac
                | Self::Wav
                | Self::Opus
                | Self::Wma
                | Self::M4a
        )
    }

    /// Video kinds (other than MP4) whose first chunk can head a Blockfile group.
    pub fn is_video_header(&self) -> bool {
        matches!(
            self,
            Self::WebmMkv | Self::Avi | Self::Flv | Self::MpegTs | Self::Mov
        )
    }

    /// True when a detected kind can start a group in the Blockfile walk.
    pub fn is_media_header(&self) -> bool {
        *self == Self::Mp4HeaderOnly || self.is_audio_header() || self.is_video_header()
    }

    /// Continuation-class kinds: these can only extend an existing group.
    /// (An undetected file — `None` at the call site — is also continuation-class.)
    pub fn is_continuation(&self) -> bool {
        matches!(
            self,
            Self::Mp4Fragment | Self::WebmContinuation | Self::MediaDataChunk
        )
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MediaKind::*;
        let s = match self {
            Png => "png",
            Jpeg => "jpeg",
            Gif => "gif",
            Webp => "webp",
            Bmp => "bmp",
            Tiff => "tiff",
            Ico => "ico",
            Avif => "avif",
            Heic => "heic",
            Mp4Complete => "mp4_complete",
            Mp4Chunked => "mp4_chunked",
            Mp4HeaderOnly => "mp4_header_only",
            Mp4Fragment => "mp4_fragment",
            WebmMkv => "webm_mkv",
            WebmContinuation => "webm_continuation",
            Avi => "avi",
            Flv => "flv",
            MpegTs => "mpeg_ts",
            Wmv => "wmv",
            Mov => "mov",
            Mp3 => "mp3",
            Aac => "aac",
            Ogg => "ogg",
            Flac => "flac",
            Wav => "wav",
            Opus => "opus",
            Wma => "wma",
            M4a => "m4a",
            UnknownData => "unknown_data",
            RiffUnknown => "riff_unknown",
            MediaDataChunk => "media_data_chunk",
        };
        write!(f, "{s}")
    }
}
