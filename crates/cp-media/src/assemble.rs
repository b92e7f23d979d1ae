//! Chunked-MP4 regrouping and byte assembly.
//!
//! Chromium splits large response bodies into ~1 MiB cache files written
//! out of order: head first, then the tail (so players can read metadata
//! and seek), then the middle backfilled. A recovered MP4 therefore starts
//! with a header file whose declared `mdat` size extends past the file,
//! followed by continuation chunks at nearby hex numbers, possibly with the
//! `moov` displaced into the last chunk.
//!
//! [`plan_chunked_mp4`] selects which cache files belong to one MP4;
//! [`assemble_chunked_mp4`] materializes the contiguous byte stream, zero
//! filling any missing middle chunks so stream-copy remuxing can salvage
//! every sample that survived.

use std::io::Write;
use std::path::Path;

use cp_core::{CacheFileEntry, Error, MediaKind, Result};
use tracing::{debug, info};

use crate::mp4::{parse_top_level, scan_for_moov, Mp4Box};

/// Chromium's cache chunk size.
pub const CHUNK_SIZE: u64 = 1_048_576;

/// Planned membership of one chunked MP4.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    /// [`MediaKind::Mp4Chunked`] when continuation chunks were found,
    /// [`MediaKind::Mp4HeaderOnly`] otherwise.
    pub kind: MediaKind,
    /// Header file first, then chunks in ascending hex order.
    pub files: Vec<CacheFileEntry>,
}

fn top_level_mdat(boxes: &[Mp4Box]) -> Option<&Mp4Box> {
    boxes.iter().find(|b| &b.box_type == b"mdat")
}

/// Select the cache files forming one chunked MP4.
///
/// Returns `None` when the header buffer carries no `mdat` (nothing to
/// extend). With an `mdat` but no matching chunks, returns a single-file
/// [`MediaKind::Mp4HeaderOnly`] plan.
pub fn plan_chunked_mp4(
    header: &CacheFileEntry,
    header_buf: &[u8],
    candidates: &[CacheFileEntry],
) -> Option<ChunkPlan> {
    let boxes = parse_top_level(header_buf);
    let mdat = top_level_mdat(&boxes)?;

    let header_len = header_buf.len() as u64;
    let mdat_end = mdat.offset as u64 + mdat.size;
    let mdat_reached_end = mdat_end >= header_len;

    let (max_chunks, hex_range) = if mdat_reached_end {
        // The declared mdat spills past the header file.
        let remaining = mdat.size - (header_len - mdat.offset as u64);
        let max_chunks = remaining.div_ceil(CHUNK_SIZE) + 5;
        (max_chunks, max_chunks + 10)
    } else {
        // The header holds the whole mdat; the moov was likely displaced
        // into a far-tail chunk, so the search window widens.
        let max_chunks = (mdat.size + header_len).div_ceil(CHUNK_SIZE) + 5;
        (max_chunks, max_chunks * 2)
    };

    let header_hex = cp_cache::blockfile_hex(&header.name)? as u64;
    let mut selected: Vec<(u64, CacheFileEntry)> = candidates
        .iter()
        .filter_map(|c| {
            let hex = cp_cache::blockfile_hex(&c.name)? as u64;
            (hex > header_hex && hex <= header_hex + hex_range).then(|| (hex, c.clone()))
        })
        .collect();
    selected.sort_by_key(|(hex, _)| *hex);
    selected.truncate(max_chunks as usize);

    debug!(
        "chunk plan for {}: mdat_reached_end={}, max_chunks={}, hex_range={}, collected={}",
        header.name,
        mdat_reached_end,
        max_chunks,
        hex_range,
        selected.len()
    );

    let mut files = vec![header.clone()];
    if selected.is_empty() {
        return Some(ChunkPlan {
            kind: MediaKind::Mp4HeaderOnly,
            files,
        });
    }
    files.extend(selected.into_iter().map(|(_, c)| c));
    Some(ChunkPlan {
        kind: MediaKind::Mp4Chunked,
        files,
    })
}

/// Write the contiguous byte stream of a chunked MP4 to `output`.
///
/// The header's bytes are written verbatim up through the end of its share
/// of the `mdat`; each hex gap between consecutive chunks inserts
/// `(gap - 1) x 1 MiB` of zeros (soft repair — a stream-copy remux keeps
/// every sample on either side of the hole). A displaced `moov` in the last
/// chunk stays in place; the remux `+faststart` pass relocates it.
///
/// Returns the number of bytes written.
pub fn assemble_chunked_mp4(files: &[CacheFileEntry], output: &Path) -> Result<u64> {
    let header = files
        .first()
        .ok_or_else(|| Error::recovery("assemble", "no files to assemble"))?;
    let header_body = cp_cache::read_all(&header.path)?;

    let boxes = parse_top_level(&header_body);
    let header_share = match top_level_mdat(&boxes) {
        Some(mdat) => {
            let after_mdat = header_body.len() as u64 - mdat.offset as u64;
            (mdat.offset as u64 + mdat.size.min(after_mdat)) as usize
        }
        None => header_body.len(),
    };

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(output)?;
    let mut out = std::io::BufWriter::new(file);
    let mut written: u64 = 0;

    out.write_all(&header_body[..header_share])?;
    written += header_share as u64;

    let mut prev_hex = cp_cache::blockfile_hex(&header.name).map(u64::from);
    let mut last_chunk: Vec<u8> = Vec::new();
    for chunk in &files[1..] {
        let cur_hex = cp_cache::blockfile_hex(&chunk.name).map(u64::from);
        if let (Some(prev), Some(cur)) = (prev_hex, cur_hex) {
            let gap = cur.saturating_sub(prev);
            if gap > 1 {
                let pad = (gap - 1) * CHUNK_SIZE;
                debug!(
                    "gap of {} missing chunk(s) before {}; zero-filling {} bytes",
                    gap - 1,
                    chunk.name,
                    pad
                );
                written += write_zeros(&mut out, pad)?;
            }
        }
        if cur_hex.is_some() {
            prev_hex = cur_hex;
        }

        let body = cp_cache::read_all(&chunk.path)?;
        out.write_all(&body)?;
        written += body.len() as u64;
        last_chunk = body;
    }
    out.flush()?;

    // The moov normally rides in the last chunk of a streamable MP4; note
    // where it landed so remux failures are explainable from the log.
    let header_moov = boxes.iter().any(|b| &b.box_type == b"moov");
    let tail_moov = !scan_for_moov(&last_chunk).is_empty();
    info!(
        "assembled {} bytes from {} file(s) (moov: header={}, tail={})",
        written,
        files.len(),
        header_moov,
        tail_moov
    );

    Ok(written)
}

fn write_zeros<W: Write>(out: &mut W, mut n: u64) -> Result<u64> {
    const BLOCK: usize = 64 * 1024;
    let zeros = [0u8; BLOCK];
    let total = n;
    while n > 0 {
        let take = (n as usize).min(BLOCK);
        out.write_all(&zeros[..take])?;
        n -= take as u64;
    }
    Ok(total)
}
