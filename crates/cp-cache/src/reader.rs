//! Path-based read primitives over cache files.
//!
//! Every primitive returns HTTP body bytes, never raw framing: Simple Cache
//! preambles are skipped, sparse streams are reassembled, and anything else
//! (Blockfile `f_XXXXXX`, unrelated files) reads raw from offset 0. A
//! malformed preamble on a Simple-Cache-shaped filename degrades to raw-file
//! semantics rather than erroring.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use cp_core::{Error, Result};
use tracing::{debug, warn};

use crate::names::{simple_cache_stream, Stream};
use crate::record::{self, HEADER_SIZE};
use crate::sparse;

/// Cap on single prefix reads; signature detection needs far less.
const MAX_PREFIX_READ: usize = 4096;
/// EACCES read retries before giving up.
const LOCK_RETRIES: u64 = 5;

fn file_stream(path: &Path) -> Option<Stream> {
    let name = path.file_name()?.to_str()?;
    simple_cache_stream(name).map(|(_, s)| s)
}

/// Read an entire file, retrying on EACCES (errno 13).
///
/// On macOS, EACCES on `_s` files is a mandatory byte-range lock conflict
/// with the running browser; backing off and retrying succeeds once the lock
/// is released. EPERM is never retried.
pub(crate) fn read_with_lock_retry(path: &Path) -> Result<Vec<u8>> {
    let mut attempt: u64 = 0;
    loop {
        match std::fs::read(path) {
            Ok(data) => return Ok(data),
            Err(e) if e.raw_os_error() == Some(cp_core::error::EACCES) && attempt < LOCK_RETRIES => {
                attempt += 1;
                warn!(
                    "EACCES on {} (attempt {attempt}): lock conflict, retrying in {}ms",
                    path.display(),
                    100 * attempt
                );
                std::thread::sleep(std::time::Duration::from_millis(100 * attempt));
            }
            Err(e) => return Err(Error::from_read(path, e)),
        }
    }
}

/// Read the first `n` bytes of a file's HTTP body.
///
/// Simple Cache `_0`/`_1` files are seeked past their preamble without
/// loading the whole file; `_s` files delegate to [`read_sparse_header`].
/// `n` larger than the body returns the available bytes without error.
pub fn read_header(path: &Path, n: usize) -> Result<Vec<u8>> {
    if file_stream(path) == Some(Stream::Sparse) {
        return read_sparse_header(path, n);
    }

    let mut file = std::fs::File::open(path).map_err(|e| Error::from_read(path, e))?;

    // 24 bytes are enough to decide Simple Cache vs raw and find the body.
    let mut preamble = [0u8; HEADER_SIZE];
    let got = file.read(&mut preamble)?;

    let body_offset = if got == HEADER_SIZE && record::has_simple_magic(&preamble) {
        record::key_length(&preamble)
            .map(|k| (HEADER_SIZE + k) as u64)
            .unwrap_or(0)
    } else {
        0
    };

    file.seek(SeekFrom::Start(body_offset))?;
    let mut buf = vec![0u8; n.min(MAX_PREFIX_READ)];
    let mut filled = 0usize;
    while filled < buf.len() {
        let read = file.read(&mut buf[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Read a file's entire HTTP body.
///
/// Dispatches on filename shape: `_s` reassembles the sparse stream,
/// `_0`/`_1` strip the Simple Cache wrapper, everything else returns raw
/// bytes. Unparseable preambles fall back to the raw bytes.
pub fn read_all(path: &Path) -> Result<Vec<u8>> {
    let data = read_with_lock_retry(path)?;
    match file_stream(path) {
        Some(Stream::Sparse) => Ok(sparse::reassemble(&data).unwrap_or(data)),
        Some(stream) => match record::body_of(&data, stream) {
            Some(body) => Ok(body.to_vec()),
            None => {
                debug!(
                    "{}: Simple Cache preamble did not parse, using raw bytes",
                    path.display()
                );
                Ok(data)
            }
        },
        None => Ok(data),
    }
}

/// Extract the `Content-Type` stored in a Simple Cache `_0` file's stream 0.
///
/// Returns `Ok(None)` when the file is not a parseable `_0` entry or carries
/// no such header. The value is lowercased with any `;` parameters stripped.
pub fn read_content_type(path: &Path) -> Result<Option<String>> {
    if file_stream(path) != Some(Stream::Zero) {
        return Ok(None);
    }
    let data = read_with_lock_retry(path)?;
    Ok(record::headers_of(&data).and_then(record::content_type))
}

/// Read the first `n` bytes of a reassembled sparse stream.
pub fn read_sparse_header(path: &Path, n: usize) -> Result<Vec<u8>> {
    let data = read_with_lock_retry(path)?;
    match sparse::reassemble_prefix(&data, n.min(MAX_PREFIX_READ)) {
        Some(buf) => Ok(buf),
        None => {
            debug!(
                "{}: sparse preamble did not parse, using raw prefix",
                path.display()
            );
            let mut data = data;
            data.truncate(n.min(MAX_PREFIX_READ));
            Ok(data)
        }
    }
}

/// Reassemble an entire sparse stream; gaps are zero-filled.
pub fn read_sparse_all(path: &Path) -> Result<Vec<u8>> {
    let data = read_with_lock_retry(path)?;
    Ok(sparse::reassemble(&data).unwrap_or(data))
}

/// Total reassembled size of a sparse stream, without materializing it.
///
/// A computed size smaller than the on-disk file is treated as a malformed
/// preamble symptom; the stream is materialized and the buffer length used
/// instead.
pub fn sparse_total_size(path: &Path) -> Result<u64> {
    let data = read_with_lock_retry(path)?;
    let computed = sparse::stream_size(&data).unwrap_or(0);
    if computed < data.len() as u64 {
        let buf = sparse::reassemble(&data).unwrap_or(data);
        return Ok(buf.len() as u64);
    }
    Ok(computed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::build_entry;
    use crate::sparse::fixtures::build_sparse;

    fn write_tmp(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn raw_file_reads_from_offset_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tmp(&dir, "f_000001", b"\xFF\xD8\xFFrest-of-jpeg");
        assert_eq!(read_header(&path, 3).unwrap(), b"\xFF\xD8\xFF");
        assert_eq!(read_all(&path).unwrap(), b"\xFF\xD8\xFFrest-of-jpeg");
    }

    #[test]
    fn zero_length_header_read_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tmp(&dir, "f_000001", b"data");
        assert_eq!(read_header(&path, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn oversized_header_read_returns_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tmp(&dir, "f_000001", b"tiny");
        assert_eq!(read_header(&path, 999).unwrap(), b"tiny");
    }

    #[test]
    fn simple_cache_header_skips_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let entry = build_entry(b"https://e/v", b"\x89PNG\r\n\x1a\nimagebody", b"h\0");
        let path = write_tmp(&dir, "1234567890abcdef_0", &entry);
        let head = read_header(&path, 8).unwrap();
        assert_eq!(&head, b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn simple_cache_read_all_strips_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let entry = build_entry(b"key", b"BODY", b"HTTP/1.1 200\0content-type: image/gif\0");
        let path = write_tmp(&dir, "1234567890abcdef_0", &entry);
        assert_eq!(read_all(&path).unwrap(), b"BODY");
        assert_eq!(
            read_content_type(&path).unwrap(),
            Some("image/gif".to_string())
        );
    }

    #[test]
    fn content_type_on_blockfile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tmp(&dir, "f_000001", b"whatever");
        assert_eq!(read_content_type(&path).unwrap(), None);
    }

    #[test]
    fn malformed_preamble_falls_back_to_raw() {
        let dir = tempfile::tempdir().unwrap();
        // Simple-Cache-shaped name, but plain content.
        let path = write_tmp(&dir, "1234567890abcdef_0", b"not a cache record");
        assert_eq!(read_all(&path).unwrap(), b"not a cache record");
        assert_eq!(read_header(&path, 5).unwrap(), b"not a");
    }

    #[test]
    fn sparse_read_paths() {
        let dir = tempfile::tempdir().unwrap();
        let data = build_sparse(b"key", &[(4, b"TAIL"), (0, b"HEAD")]);
        let path = write_tmp(&dir, "1234567890abcdef_s", &data);
        assert_eq!(read_sparse_all(&path).unwrap(), b"HEADTAIL");
        assert_eq!(read_sparse_header(&path, 4).unwrap(), b"HEAD");
        // read_header on an _s name goes through sparse reassembly.
        assert_eq!(read_header(&path, 4).unwrap(), b"HEAD");
        assert_eq!(read_all(&path).unwrap(), b"HEADTAIL");
    }

    #[test]
    fn sparse_total_size_uses_buffer_fallback() {
        let dir = tempfile::tempdir().unwrap();
        // Range records cover 8 bytes; the file itself is larger, which
        // triggers the materializing fallback. Both agree on 8.
        let data = build_sparse(b"key", &[(0, b"AAAA"), (4, b"BBBB")]);
        let path = write_tmp(&dir, "1234567890abcdef_s", &data);
        assert_eq!(sparse_total_size(&path).unwrap(), 8);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_all(Path::new("/nonexistent/f_000001")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
