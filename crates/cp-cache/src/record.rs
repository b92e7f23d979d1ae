//! Simple Cache entry framing.
//!
//! On-disk layout of a `{hash}_0` file:
//!
//! ```text
//! [SimpleFileHeader: 24 bytes]   magic + version + key_length + key_hash + pad
//! [URL key: key_length bytes]
//! [Stream 1: HTTP response BODY]
//! [SimpleFileEOF for stream 1: 24 bytes]
//! [Stream 0: HTTP response HEADERS, NUL-separated]
//! [key SHA-256: 32 bytes, only if FLAG_HAS_KEY_SHA256 set in EOF0]
//! [SimpleFileEOF for stream 0: 24 bytes]
//! ```
//!
//! `{hash}_1` files carry a single body stream and a single trailing EOF.
//! Stream boundaries are computed deterministically from the EOF0 record at
//! the fixed end-of-file position; a corrupt EOF0 degrades to scanning for
//! the first EOF magic after the key.

use std::ops::Range;

use crate::names::Stream;

/// Simple Cache file header magic (little-endian).
pub const SIMPLE_CACHE_MAGIC: u64 = 0xfcfb_6d1b_a772_5c30;
/// SimpleFileHeader size: magic(8) + version(4) + key_length(4) + key_hash(4) + pad(4).
pub const HEADER_SIZE: usize = 24;
/// Simple Cache end-of-stream magic (little-endian).
pub const EOF_MAGIC: u64 = 0xf4fa_6f45_970d_41d8;
/// SimpleFileEOF size: magic(8) + flags(4) + data_crc32(4) + stream_size(4) + pad(4).
pub const EOF_SIZE: usize = 24;
/// EOF flag: a 32-byte key SHA-256 precedes this record.
const FLAG_HAS_KEY_SHA256: u32 = 2;

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u64_le(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

/// True when the buffer starts with a Simple Cache file header.
pub fn has_simple_magic(data: &[u8]) -> bool {
    read_u64_le(data, 0) == Some(SIMPLE_CACHE_MAGIC)
}

/// The key length recorded in the file header, if the magic checks out.
pub fn key_length(data: &[u8]) -> Option<usize> {
    if !has_simple_magic(data) {
        return None;
    }
    read_u32_le(data, 12).map(|n| n as usize)
}

/// Byte offset where stream data begins (header + key).
pub fn body_offset(data: &[u8]) -> Option<usize> {
    let start = HEADER_SIZE + key_length(data)?;
    (start <= data.len()).then_some(start)
}

/// Computed stream boundaries of a Simple Cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLayout {
    /// HTTP body bytes (stream 1 for `_0`, stream 2 for `_1`).
    pub body: Range<usize>,
    /// HTTP response header bytes (stream 0), when determinable.
    pub headers: Option<Range<usize>>,
}

/// Parse the layout of a `_0` file from its EOF records.
pub fn parse_entry_layout(data: &[u8]) -> Option<EntryLayout> {
    if data.len() < HEADER_SIZE + EOF_SIZE {
        return None;
    }
    let body_start = body_offset(data)?;
    if body_start >= data.len() {
        return None;
    }

    // EOF0 sits in the last 24 bytes of the file.
    let eof0_start = data.len() - EOF_SIZE;
    if read_u64_le(data, eof0_start) != Some(EOF_MAGIC) {
        return scan_fallback(data, body_start);
    }
    let eof0_flags = read_u32_le(data, eof0_start + 8)?;
    let stream0_size = read_u32_le(data, eof0_start + 16)? as usize;

    let sha_len = if eof0_flags & FLAG_HAS_KEY_SHA256 != 0 {
        32
    } else {
        0
    };
    let stream0_end = data.len().checked_sub(EOF_SIZE + sha_len)?;
    if stream0_size > stream0_end {
        return scan_fallback(data, body_start);
    }
    let stream0_start = stream0_end - stream0_size;

    // EOF1 sits immediately before stream 0.
    let eof1_start = stream0_start.checked_sub(EOF_SIZE)?;
    if read_u64_le(data, eof1_start) != Some(EOF_MAGIC) {
        return scan_fallback(data, body_start);
    }
    if body_start > eof1_start {
        return None;
    }

    Some(EntryLayout {
        body: body_start..eof1_start,
        headers: Some(stream0_start..stream0_end),
    })
}

/// Fallback: scan forward from the key for the first EOF magic (EOF1).
/// Stream 0 boundaries cannot be recovered in this mode.
fn scan_fallback(data: &[u8], body_start: usize) -> Option<EntryLayout> {
    let magic_bytes = EOF_MAGIC.to_le_bytes();
    let pos = data[body_start..]
        .windows(8)
        .position(|w| w == magic_bytes)?;
    Some(EntryLayout {
        body: body_start..body_start + pos,
        headers: None,
    })
}

/// Parse the layout of a `_1` file: single body stream, single trailing EOF.
pub fn parse_stream2_layout(data: &[u8]) -> Option<EntryLayout> {
    if data.len() < HEADER_SIZE + EOF_SIZE {
        return None;
    }
    let body_start = body_offset(data)?;
    let eof_start = data.len() - EOF_SIZE;
    if body_start > eof_start {
        return None;
    }
    // A missing trailing EOF magic is tolerated; the body then runs to EOF.
    let body_end = if read_u64_le(data, eof_start) == Some(EOF_MAGIC) {
        eof_start
    } else {
        data.len()
    };
    Some(EntryLayout {
        body: body_start..body_end,
        headers: None,
    })
}

/// Extract the HTTP body from an already-read entry, by stream kind.
///
/// Returns `None` when the buffer does not carry a parseable Simple Cache
/// preamble (callers fall back to raw-file semantics).
pub fn body_of(data: &[u8], stream: Stream) -> Option<&[u8]> {
    let layout = match stream {
        Stream::One => parse_stream2_layout(data)?,
        _ => parse_entry_layout(data)?,
    };
    data.get(layout.body)
}

/// Extract the stream-0 HTTP response headers from a `_0` entry.
pub fn headers_of(data: &[u8]) -> Option<&[u8]> {
    let layout = parse_entry_layout(data)?;
    data.get(layout.headers?)
}

/// Pull the `Content-Type` value out of stream-0 header bytes.
///
/// Chromium stores response headers as NUL-separated strings
/// (`"HTTP/1.1 200\0content-type: video/mp4\0..."`). Parameters after `;`
/// are stripped and the value is lowercased.
pub fn content_type(headers: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(headers);
    for part in text.split('\0') {
        let lower = part.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("content-type:") {
            let mime = rest.split(';').next().unwrap_or(rest).trim();
            if !mime.is_empty() {
                return Some(mime.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-test builders for synthetic Simple Cache files.

    use super::*;

    /// Build a `_0` file: header, key, body, EOF1, stream-0 headers, EOF0.
    pub fn build_entry(key: &[u8], body: &[u8], http_headers: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&SIMPLE_CACHE_MAGIC.to_le_bytes());
        data.extend_from_slice(&5u32.to_le_bytes()); // version
        data.extend_from_slice(&(key.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // key hash
        data.extend_from_slice(&0u32.to_le_bytes()); // padding
        data.extend_from_slice(key);
        data.extend_from_slice(body);
        push_eof(&mut data, 0, body.len() as u32);
        data.extend_from_slice(http_headers);
        push_eof(&mut data, 0, http_headers.len() as u32);
        data
    }

    /// Build a `_1` file: header, key, body, single EOF.
    pub fn build_stream2(key: &[u8], body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&SIMPLE_CACHE_MAGIC.to_le_bytes());
        data.extend_from_slice(&5u32.to_le_bytes());
        data.extend_from_slice(&(key.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(key);
        data.extend_from_slice(body);
        push_eof(&mut data, 0, body.len() as u32);
        data
    }

    fn push_eof(data: &mut Vec<u8>, flags: u32, stream_size: u32) {
        data.extend_from_slice(&EOF_MAGIC.to_le_bytes());
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // crc32
        data.extend_from_slice(&stream_size.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // padding
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{build_entry, build_stream2};
    use super::*;

    #[test]
    fn parses_dual_eof_layout() {
        let data = build_entry(
            b"https://example.com/v.mp4",
            b"BODYBYTES",
            b"HTTP/1.1 200\0content-type: video/mp4\0",
        );
        let layout = parse_entry_layout(&data).unwrap();
        assert_eq!(&data[layout.body.clone()], b"BODYBYTES");
        let headers = &data[layout.headers.unwrap()];
        assert!(headers.starts_with(b"HTTP/1.1 200"));
    }

    #[test]
    fn body_of_dispatches_by_stream() {
        let entry = build_entry(b"k", b"one", b"h\0");
        assert_eq!(body_of(&entry, Stream::Zero).unwrap(), b"one");

        let aux = build_stream2(b"k", b"two");
        assert_eq!(body_of(&aux, Stream::One).unwrap(), b"two");
    }

    #[test]
    fn corrupt_eof0_falls_back_to_scan() {
        let mut data = build_entry(b"key", b"BODY", b"hdr\0");
        // Clobber the trailing EOF0 magic.
        let n = data.len();
        data[n - EOF_SIZE] ^= 0xFF;
        let layout = parse_entry_layout(&data).unwrap();
        assert_eq!(&data[layout.body.clone()], b"BODY");
        assert!(layout.headers.is_none());
    }

    #[test]
    fn bad_magic_is_not_simple_cache() {
        let data = vec![0u8; 128];
        assert!(parse_entry_layout(&data).is_none());
        assert!(body_of(&data, Stream::Zero).is_none());
        assert!(key_length(&data).is_none());
    }

    #[test]
    fn truncated_file_rejected() {
        let data = build_entry(b"key", b"BODY", b"hdr\0");
        assert!(parse_entry_layout(&data[..16]).is_none());
    }

    #[test]
    fn stream2_tolerates_missing_eof() {
        let mut data = build_stream2(b"key", b"PAYLOAD");
        let n = data.len();
        data[n - EOF_SIZE] ^= 0xFF;
        let layout = parse_stream2_layout(&data).unwrap();
        // Without the EOF marker the body runs to end of file.
        assert!(data[layout.body.clone()].starts_with(b"PAYLOAD"));
    }

    #[test]
    fn content_type_extraction() {
        assert_eq!(
            content_type(b"HTTP/1.1 200\0Content-Type: Video/MP4; codecs=\"avc1\"\0"),
            Some("video/mp4".to_string())
        );
        assert_eq!(
            content_type(b"HTTP/1.1 200\0content-type: image/png\0"),
            Some("image/png".to_string())
        );
        assert_eq!(content_type(b"HTTP/1.1 204\0date: x\0"), None);
    }

    #[test]
    fn headers_of_round_trip() {
        let data = build_entry(b"k", b"b", b"HTTP/1.1 200\0content-type: audio/ogg\0");
        let headers = headers_of(&data).unwrap();
        assert_eq!(content_type(headers), Some("audio/ogg".to_string()));
    }
}
