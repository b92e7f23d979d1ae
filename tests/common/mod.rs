//! Shared fixture builders for integration tests.
//!
//! Everything is synthesized in-memory; no binary blobs are checked in.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Chromium Simple Cache header magic (little-endian).
pub const SIMPLE_CACHE_MAGIC: u64 = 0xfcfb_6d1b_a772_5c30;
/// Chromium Simple Cache end-of-stream magic (little-endian).
pub const EOF_MAGIC: u64 = 0xf4fa_6f45_970d_41d8;
/// Chromium sparse range header magic (little-endian).
pub const SPARSE_RANGE_MAGIC: u64 = 0xeb97_bf01_6553_676b;

fn simple_file_header(key: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&SIMPLE_CACHE_MAGIC.to_le_bytes());
    data.extend_from_slice(&5u32.to_le_bytes()); // version
    data.extend_from_slice(&(key.len() as u32).to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes()); // key hash
    data.extend_from_slice(&0u32.to_le_bytes()); // padding
    data.extend_from_slice(key);
    data
}

fn eof_record(stream_size: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&EOF_MAGIC.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes()); // flags
    data.extend_from_slice(&0u32.to_le_bytes()); // crc32
    data.extend_from_slice(&stream_size.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes()); // padding
    data
}

/// Build a Simple Cache `_0` file: header, key, body (stream 1), EOF1,
/// HTTP headers (stream 0), EOF0.
pub fn simple_entry(key: &[u8], body: &[u8], http_headers: &[u8]) -> Vec<u8> {
    let mut data = simple_file_header(key);
    data.extend_from_slice(body);
    data.extend_from_slice(&eof_record(body.len() as u32));
    data.extend_from_slice(http_headers);
    data.extend_from_slice(&eof_record(http_headers.len() as u32));
    data
}

/// Build a Simple Cache `_s` file from `(offset, bytes)` range records.
pub fn sparse_entry(key: &[u8], records: &[(u64, &[u8])]) -> Vec<u8> {
    let mut data = simple_file_header(key);
    for (offset, bytes) in records {
        data.extend_from_slice(&SPARSE_RANGE_MAGIC.to_le_bytes());
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // crc32
        data.extend_from_slice(&0u32.to_le_bytes()); // padding
        data.extend_from_slice(bytes);
    }
    data
}

// ---------------------------------------------------------------------------
// ISO BMFF builders
// ---------------------------------------------------------------------------

/// A plain box with the given payload.
pub fn mp4_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&((payload.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(box_type);
    out.extend_from_slice(payload);
    out
}

/// A minimal `ftyp` (major brand mp42).
pub fn ftyp() -> Vec<u8> {
    mp4_box(b"ftyp", b"mp42\x00\x00\x00\x00mp42isom")
}

/// `mvhd` v0 with the given timescale and duration.
pub fn mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&[0u8; 4]); // version 0 + flags
    payload.extend_from_slice(&[0u8; 8]); // creation + modification time
    payload.extend_from_slice(&timescale.to_be_bytes());
    payload.extend_from_slice(&duration.to_be_bytes());
    payload.extend_from_slice(&[0u8; 80]);
    mp4_box(b"mvhd", &payload)
}

/// `trak` with a handler and a first `stsd` sample entry.
pub fn trak(handler: &[u8; 4], format: &[u8; 4], width: u16, height: u16) -> Vec<u8> {
    let mut hdlr_payload = Vec::new();
    hdlr_payload.extend_from_slice(&[0u8; 8]);
    hdlr_payload.extend_from_slice(handler);
    hdlr_payload.extend_from_slice(&[0u8; 12]);
    let hdlr = mp4_box(b"hdlr", &hdlr_payload);

    let mut entry = Vec::new();
    entry.extend_from_slice(&80u32.to_be_bytes());
    entry.extend_from_slice(format);
    entry.extend_from_slice(&[0u8; 16]);
    entry.extend_from_slice(&width.to_be_bytes());
    entry.extend_from_slice(&height.to_be_bytes());
    entry.resize(80, 0);
    let mut stsd_payload = Vec::new();
    stsd_payload.extend_from_slice(&[0u8; 4]);
    stsd_payload.extend_from_slice(&1u32.to_be_bytes());
    stsd_payload.extend_from_slice(&entry);
    let stsd = mp4_box(b"stsd", &stsd_payload);

    let stbl = mp4_box(b"stbl", &stsd);
    let minf = mp4_box(b"minf", &stbl);
    let mut mdia_payload = hdlr;
    mdia_payload.extend_from_slice(&minf);
    let mdia = mp4_box(b"mdia", &mdia_payload);
    mp4_box(b"trak", &mdia)
}

/// A `moov` with one video and one audio track, padded past the 500-byte
/// plausibility floor used by the displaced-moov scan.
pub fn moov(timescale: u32, duration: u32) -> Vec<u8> {
    let mut payload = mvhd(timescale, duration);
    payload.extend_from_slice(&trak(b"vide", b"avc1", 1280, 720));
    payload.extend_from_slice(&trak(b"soun", b"mp4a", 0, 0));
    let pad_len = 600usize.saturating_sub(payload.len() + 8);
    payload.extend_from_slice(&mp4_box(b"free", &vec![0u8; pad_len]));
    mp4_box(b"moov", &payload)
}

/// A complete playable-shaped MP4 of roughly `total_len` bytes:
/// ftyp + mdat + moov.
pub fn complete_mp4(total_len: usize) -> Vec<u8> {
    let header = ftyp();
    let tail = moov(1000, 42_000);
    let mdat_payload = total_len
        .saturating_sub(header.len() + tail.len() + 8)
        .max(8);
    let mut data = header;
    data.extend_from_slice(&mp4_box(b"mdat", &vec![0xA5u8; mdat_payload]));
    data.extend_from_slice(&tail);
    data
}

/// An MP4 header file whose declared `mdat` extends far past the file:
/// ftyp + mdat declaring `declared_mdat` content bytes, truncated after
/// `present` bytes of payload.
pub fn chunked_mp4_header(declared_mdat: u32, present: usize) -> Vec<u8> {
    let mut data = ftyp();
    data.extend_from_slice(&(declared_mdat + 8).to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&vec![0x5Au8; present]);
    data
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// Write `data` as `name` inside `dir` and return the full path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Tiny valid-prefix JPEG bytes.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(b"JFIF-ish test payload");
    data
}

/// EBML header prefix (WebM/MKV).
pub fn webm_bytes() -> Vec<u8> {
    let mut data = vec![0x1A, 0x45, 0xDF, 0xA3];
    data.extend_from_slice(&[0x01; 64]);
    data
}

/// WebM Cluster continuation prefix.
pub fn webm_cluster_bytes() -> Vec<u8> {
    let mut data = vec![0x1F, 0x43, 0xB6, 0x75];
    data.extend_from_slice(&[0x02; 64]);
    data
}
