//! Sparse (`_s`) stream reassembly.
//!
//! Chromium writes HTTP 206 Partial Content responses into `_s` files as a
//! sequence of range records, each a 32-byte header followed by that range's
//! body bytes:
//!
//! ```text
//! [SimpleFileHeader: 24 bytes] [URL key]
//! repeated:
//!   [SparseRangeHeader: 32 bytes]  magic + offset(u64) + length(u64) + crc32 + pad
//!   [range data: length bytes]
//! ```
//!
//! Records may arrive in any offset order (the browser fetches head and tail
//! first, then backfills). Reassembly sorts by offset and writes into a
//! contiguous buffer; byte ranges no record covers stay zero.

use crate::record::{self, HEADER_SIZE};

/// Sparse range header magic (little-endian).
pub const SPARSE_RANGE_MAGIC: u64 = 0xeb97_bf01_6553_676b;
/// SparseRangeHeader size: magic(8) + offset(8) + length(8) + crc32(4) + pad(4).
pub const RANGE_HEADER_SIZE: usize = 32;

/// One decoded range record borrowing its data from the file buffer.
#[derive(Debug, Clone, Copy)]
pub struct Range<'a> {
    /// Offset of this range within the reassembled stream.
    pub offset: u64,
    pub data: &'a [u8],
}

fn read_u64_le(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

/// Walk all range records in an `_s` file buffer.
///
/// Returns `None` when the Simple Cache preamble is absent. A truncated
/// final record contributes whatever bytes are available. Records are
/// returned in file order, not offset order.
pub fn ranges(data: &[u8]) -> Option<Vec<Range<'_>>> {
    let key_len = record::key_length(data)?;
    let mut pos = HEADER_SIZE + key_len;
    if pos > data.len() {
        return None;
    }

    let mut out = Vec::new();
    while pos + RANGE_HEADER_SIZE <= data.len() {
        if read_u64_le(data, pos) != Some(SPARSE_RANGE_MAGIC) {
            break;
        }
        let offset = read_u64_le(data, pos + 8)?;
        let length = read_u64_le(data, pos + 16)? as usize;
        let data_start = pos + RANGE_HEADER_SIZE;
        let data_end = data_start.saturating_add(length);
        if data_end > data.len() {
            let available = &data[data_start..];
            if !available.is_empty() {
                out.push(Range {
                    offset,
                    data: available,
                });
            }
            break;
        }
        out.push(Range {
            offset,
            data: &data[data_start..data_end],
        });
        pos = data_end;
    }
    Some(out)
}

/// Total reassembled stream size: `max(offset + length)` over all records.
pub fn stream_size(data: &[u8]) -> Option<u64> {
    let ranges = ranges(data)?;
    Some(
        ranges
            .iter()
            .map(|r| r.offset + r.data.len() as u64)
            .max()
            .unwrap_or(0),
    )
}

/// Reassemble the full sparse stream into a contiguous buffer.
///
/// Gaps between records stay zero-filled. An `_s` file with a valid header
/// but no range records falls back to extracting the raw body between the
/// key and the optional trailing EOF (a non-sparse variant seen in the
/// wild).
pub fn reassemble(data: &[u8]) -> Option<Vec<u8>> {
    let mut chunks = ranges(data)?;
    if chunks.is_empty() {
        return Some(raw_body_fallback(data).unwrap_or_default());
    }

    chunks.sort_by_key(|r| r.offset);
    let total = chunks
        .iter()
        .map(|r| r.offset as usize + r.data.len())
        .max()
        .unwrap_or(0);
    let mut buf = vec![0u8; total];
    for r in &chunks {
        let start = r.offset as usize;
        let end = start + r.data.len();
        if end <= buf.len() {
            buf[start..end].copy_from_slice(r.data);
        }
    }
    Some(buf)
}

/// Reassemble just the first `n` bytes of the sparse stream.
///
/// Avoids materializing multi-megabyte streams for signature detection.
/// The result is truncated to the highest covered offset below `n`.
pub fn reassemble_prefix(data: &[u8], n: usize) -> Option<Vec<u8>> {
    let mut chunks = ranges(data)?;
    if chunks.is_empty() {
        let mut body = raw_body_fallback(data).unwrap_or_default();
        body.truncate(n);
        return Some(body);
    }

    chunks.sort_by_key(|r| r.offset);
    let mut buf = vec![0u8; n];
    let mut covered = 0usize;
    for r in &chunks {
        let start = r.offset as usize;
        if start >= n {
            break;
        }
        let copy_len = r.data.len().min(n - start);
        buf[start..start + copy_len].copy_from_slice(&r.data[..copy_len]);
        covered = covered.max(start + copy_len);
    }
    buf.truncate(covered);
    Some(buf)
}

/// No range headers: the body may sit directly after header + key, with an
/// optional trailing EOF record (and key SHA-256) to strip.
fn raw_body_fallback(data: &[u8]) -> Option<Vec<u8>> {
    use crate::record::{EOF_MAGIC, EOF_SIZE};

    let body_start = record::body_offset(data)?;
    let mut body_end = data.len();
    if body_end >= body_start + EOF_SIZE {
        let eof_start = body_end - EOF_SIZE;
        if read_u64_le(data, eof_start) == Some(EOF_MAGIC) {
            let flags = data
                .get(eof_start + 8..eof_start + 12)
                .map(|b| u32::from_le_bytes(b.try_into().unwrap_or([0; 4])))
                .unwrap_or(0);
            body_end = if flags & 2 != 0 && eof_start >= 32 {
                eof_start - 32
            } else {
                eof_start
            };
        }
    }
    (body_start < body_end).then(|| data[body_start..body_end].to_vec())
}
