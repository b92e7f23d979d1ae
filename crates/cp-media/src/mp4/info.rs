//! Higher-level MP4 inspection: displaced-`moov` salvage, track metadata,
//! and duplicate-`moov` repair.

use cp_core::VideoInfo;

use super::boxes::{find_all, find_first, parse_boxes, parse_top_level, Mp4Box};

/// Plausible size window for a real `moov` box.
const MOOV_MIN_SIZE: usize = 500;
const MOOV_MAX_SIZE: usize = 2_000_000;

fn read_u16_be(buf: &[u8], offset: usize) -> Option<u16> {
    let b = buf.get(offset..offset + 2)?;
    Some(u16::from_be_bytes(b.try_into().ok()?))
}

fn read_u32_be(buf: &[u8], offset: usize) -> Option<u32> {
    let b = buf.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(b.try_into().ok()?))
}

fn read_u64_be(buf: &[u8], offset: usize) -> Option<u64> {
    let b = buf.get(offset..offset + 8)?;
    Some(u64::from_be_bytes(b.try_into().ok()?))
}

/// Locate `moov` candidates in a buffer whose outer box chain may be broken.
///
/// Chromium writes streamable MP4s with the `moov` at the tail; a truncated
/// header chunk can hold only half of the outer box, so the normal walk
/// never reaches it. This scans for the ASCII type, treats the preceding 4
/// bytes as the box size, and accepts a hit when the size is plausible and
/// the spanned range contains both `mvhd` and `trak`.
pub fn scan_for_moov(buf: &[u8]) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    let mut search_from = 0usize;

    while search_from + 4 <= buf.len() {
        let idx = match buf[search_from..].windows(4).position(|w| w == b"moov") {
            Some(i) => search_from + i,
            None => break,
        };

        if idx >= 4 {
            let size = read_u32_be(buf, idx - 4).unwrap_or(0) as usize;
            if (MOOV_MIN_SIZE..=MOOV_MAX_SIZE).contains(&size) {
                let start = idx - 4;
                let end = start + size;
                if end <= buf.len() {
                    let inner = &buf[start..end];
                    let has_mvhd = inner.windows(4).any(|w| w == b"mvhd");
                    let has_trak = inner.windows(4).any(|w| w == b"trak");
                    if has_mvhd && has_trak {
                        hits.push((start, size));
                    }
                }
            }
        }
        search_from = idx + 1;
    }
    hits
}

/// Extract track metadata from a `moov` subtree at `[moov_offset,
/// moov_offset + moov_size)`.
///
/// All reads are bounds-checked; anything unreadable leaves the
/// corresponding field at its default.
pub fn extract_video_info(buf: &[u8], moov_offset: usize, moov_size: usize) -> VideoInfo {
    let end = moov_offset.saturating_add(moov_size).min(buf.len());
    let boxes = parse_boxes(buf, moov_offset, end);
    let mut info = VideoInfo::default();

    if let Some(mvhd) = find_first(&boxes, b"mvhd") {
        let (timescale, duration) = match buf.get(mvhd.offset + 8) {
            // Version 1: 64-bit times.
            Some(1) => (
                read_u32_be(buf, mvhd.offset + 28),
                read_u64_be(buf, mvhd.offset + 32),
            ),
            // Version 0: 32-bit times.
            Some(_) => (
                read_u32_be(buf, mvhd.offset + 20),
                read_u32_be(buf, mvhd.offset + 24).map(u64::from),
            ),
            None => (None, None),
        };
        if let (Some(ts), Some(dur)) = (timescale, duration) {
            if ts > 0 {
                info.duration_seconds = dur as f64 / ts as f64;
            }
        }
    }

    for trak in find_all(&boxes, b"trak") {
        let handler = find_first(&trak.children, b"hdlr")
            .and_then(|hdlr| buf.get(hdlr.offset + 16..hdlr.offset + 20));
        let stsd = find_first(&trak.children, b"stsd");
        let entry_type = stsd
            .and_then(|s| buf.get(s.offset + 20..s.offset + 24))
            .map(|b| String::from_utf8_lossy(b).trim().to_string())
            .unwrap_or_default();

        match handler {
            Some([b'v', b'i', b'd', b'e']) => {
                info.has_video = true;
                if info.video_codec.is_empty() {
                    info.video_codec = entry_type;
                    if let Some(s) = stsd {
                        info.width = read_u16_be(buf, s.offset + 16 + 24).unwrap_or(0);
                        info.height = read_u16_be(buf, s.offset + 16 + 26).unwrap_or(0);
                    }
                }
            }
            Some([b's', b'o', b'u', b'n']) => {
                info.has_audio = true;
                if info.audio_codec.is_empty() {
                    info.audio_codec = entry_type;
                }
            }
            _ => {}
        }
    }

    info
}

/// Count top-level `moov` boxes.
pub fn count_moov(buf: &[u8]) -> usize {
    parse_top_level(buf)
        .iter()
        .filter(|b| &b.box_type == b"moov")
        .count()
}

/// Remove all but the first top-level `moov` box.
///
/// An interrupted `+faststart` pass can leave a file with the relocated
/// `moov` at the front and the stale one still at the tail; players choke on
/// the duplicate. Returns the rewritten buffer, or `None` when there was
/// nothing to fix (making a second application a no-op).
pub fn strip_duplicate_moov(buf: &[u8]) -> Option<Vec<u8>> {
    let boxes = parse_top_level(buf);
    let moov_count = boxes.iter().filter(|b| &b.box_type == b"moov").count();
    if moov_count <= 1 {
        return None;
    }

    tracing::info!("stripping {} duplicate moov box(es)", moov_count - 1);
    let mut seen_moov = false;
    let mut fixed = Vec::with_capacity(buf.len());
    for b in &boxes {
        if &b.box_type == b"moov" {
            if seen_moov {
                continue;
            }
            seen_moov = true;
        }
        let end = (b.offset as u64 + b.size).min(buf.len() as u64) as usize;
        fixed.extend_from_slice(&buf[b.offset..end]);
    }
    Some(fixed)
}
