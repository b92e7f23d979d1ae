//! Signature-based media type detection.
//!
//! Detection depends only on the prefix of a buffer (16 bytes minimum, 256
//! recommended so the MPEG-TS second-sync check has room). The table is
//! evaluated top-down with first match winning; order is load-bearing:
//!
//! - `GIF8` sits above the bare `0x47` MPEG-TS candidate (both start 'G').
//! - The MP3 `FF Fx` rows catch MPEG Layer III syncs before the ADTS AAC
//!   check runs, so the AAC step only ever sees layer-00 syncwords.

use cp_core::MediaKind;

/// Follow-up action for a matched table prefix.
#[derive(Debug, Clone, Copy)]
enum Sig {
    /// The prefix alone decides the kind.
    Exact(MediaKind),
    /// RIFF container: bytes [8..12] name the subtype.
    Riff,
    /// MPEG-TS candidate: a second sync byte at offset 188 must confirm.
    TsSync,
}

/// Fixed-prefix table, offset 0, first match wins.
const TABLE: &[(&[u8], Sig)] = &[
    (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], Sig::Exact(MediaKind::Png)),
    (&[0xFF, 0xD8, 0xFF], Sig::Exact(MediaKind::Jpeg)),
    (b"GIF87a", Sig::Exact(MediaKind::Gif)),
    (b"GIF89a", Sig::Exact(MediaKind::Gif)),
    (b"BM", Sig::Exact(MediaKind::Bmp)),
    (&[0x49, 0x49, 0x2A, 0x00], Sig::Exact(MediaKind::Tiff)),
    (&[0x4D, 0x4D, 0x00, 0x2A], Sig::Exact(MediaKind::Tiff)),
    (&[0x00, 0x00, 0x01, 0x00], Sig::Exact(MediaKind::Ico)),
    (b"RIFF", Sig::Riff),
    (&[0x1A, 0x45, 0xDF, 0xA3], Sig::Exact(MediaKind::WebmMkv)),
    (&[b'F', b'L', b'V', 0x01], Sig::Exact(MediaKind::Flv)),
    (&[0x47], Sig::TsSync),
    (b"ID3", Sig::Exact(MediaKind::Mp3)),
    (&[0xFF, 0xFB], Sig::Exact(MediaKind::Mp3)),
    (&[0xFF, 0xF3], Sig::Exact(MediaKind::Mp3)),
    (&[0xFF, 0xF2], Sig::Exact(MediaKind::Mp3)),
    (&[0xFF, 0xFE], Sig::Exact(MediaKind::Mp3)),
    (b"OggS", Sig::Exact(MediaKind::Ogg)),
    (b"fLaC", Sig::Exact(MediaKind::Flac)),
    // ASF header GUID (WMA/WMV family; audio is what caches carry).
    (
        &[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C],
        Sig::Exact(MediaKind::Wma),
    ),
];

/// MP4 fragment box types that mark a mid-stream chunk.
const FRAGMENT_TYPES: &[&[u8; 4]] = &[b"styp", b"moof", b"sidx", b"mdat"];

/// Map a prefix buffer to a media kind, or `None` when nothing matches.
pub fn detect(buf: &[u8]) -> Option<MediaKind> {
    // 1-3. Fixed-prefix table, with RIFF and TS refinement.
    for (prefix, sig) in TABLE {
        if !buf.starts_with(prefix) {
            continue;
        }
        match sig {
            Sig::Exact(kind) => return Some(*kind),
            Sig::Riff => return Some(riff_subtype(buf)),
            Sig::TsSync => {
                // A lone 0x47 is far too common; demand a packet boundary.
                if buf.get(188) == Some(&0x47) {
                    return Some(MediaKind::MpegTs);
                }
                // Not TS; fall through to the remaining steps.
            }
        }
    }

    // 4. ADTS AAC: 12-bit syncword with layer 00. MPEG Layer III syncs
    // (nonzero layer bits) were already consumed by the MP3 table rows.
    if buf.len() >= 2 && buf[0] == 0xFF && buf[1] & 0xF0 == 0xF0 && buf[1] & 0x06 == 0 {
        return Some(MediaKind::Aac);
    }

    // 5. ISO Base Media File Format.
    if let Some(kind) = bmff_brand(buf) {
        return Some(kind);
    }

    // 6. MP4 fragment markers (no ftyp).
    if buf.len() >= 8 {
        let size = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if (8..=50_000_000).contains(&size) && FRAGMENT_TYPES.iter().any(|t| &buf[4..8] == *t) {
            return Some(MediaKind::Mp4Fragment);
        }
    }

    // 7. WebM Cluster continuation.
    if buf.starts_with(&[0x1F, 0x43, 0xB6, 0x75]) {
        return Some(MediaKind::WebmContinuation);
    }

    None
}

/// RIFF subtype at bytes [8..12].
fn riff_subtype(buf: &[u8]) -> MediaKind {
    match buf.get(8..12) {
        Some(b"WAVE") => MediaKind::Wav,
        Some(b"AVI ") => MediaKind::Avi,
        Some(b"WEBP") => MediaKind::Webp,
        _ => MediaKind::RiffUnknown,
    }
}

/// `ftyp` major-brand refinement. The box size is sanity-bounded so random
/// data containing "ftyp" at [4..8] does not qualify.
fn bmff_brand(buf: &[u8]) -> Option<MediaKind> {
    if buf.len() < 12 || &buf[4..8] != b"ftyp" {
        return None;
    }
    let box_size = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if !(8..=512).contains(&box_size) {
        return None;
    }
    let brand = std::str::from_utf8(&buf[8..12]).unwrap_or("").trim();
    let kind = match brand {
        "avif" | "avis" => MediaKind::Avif,
        "heic" | "hevc" | "mif1" | "msf1" => MediaKind::Heic,
        "M4A" | "m4a" | "M4B" | "M4P" => MediaKind::M4a,
        "qt" => MediaKind::Mov,
        // Refined to chunked/header-only later by the box walker.
        _ => MediaKind::Mp4Complete,
    };
    Some(kind)
}
