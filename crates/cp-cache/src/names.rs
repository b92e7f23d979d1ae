//! Cache filename classification.
//!
//! Two shapes are recognized:
//! - Blockfile: `f_XXXXXX` (8 chars, "f_" + 6 hex digits)
//! - Simple Cache: `{16 hex chars}_{0|1|s}`
//!
//! Anything else in a cache directory is ignored.

/// Which Simple Cache stream file a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// `_0`: HTTP headers (stream 0) + body (stream 1).
    Zero,
    /// `_1`: large-body auxiliary stream (stream 2).
    One,
    /// `_s`: sparse range-response stream.
    Sparse,
}

/// Parse a Blockfile name (`f_00630b`) into its hex sequence number.
pub fn blockfile_hex(name: &str) -> Option<u32> {
    if name.len() == 8 && name.starts_with("f_") {
        u32::from_str_radix(&name[2..], 16).ok()
    } else {
        None
    }
}

/// Parse a Simple Cache name into its hash and stream suffix.
pub fn simple_cache_stream(name: &str) -> Option<(&str, Stream)> {
    if name.len() != 18 {
        return None;
    }
    let (hash, suffix) = name.split_at(16);
    if !hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
        return None;
    }
    let stream = match suffix {
        "_0" => Stream::Zero,
        "_1" => Stream::One,
        "_s" => Stream::Sparse,
        _ => return None,
    };
    Some((hash, stream))
}

/// True when a filename matches either cache file shape.
pub fn is_cache_file(name: &str) -> bool {
    blockfile_hex(name).is_some() || simple_cache_stream(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blockfile_names() {
        assert_eq!(blockfile_hex("f_00630b"), Some(0x00630b));
        assert_eq!(blockfile_hex("f_0000a0"), Some(0xa0));
        assert_eq!(blockfile_hex("f_zzzzzz"), None);
        assert_eq!(blockfile_hex("f_00630"), None); // too short
        assert_eq!(blockfile_hex("g_00630b"), None);
        assert_eq!(blockfile_hex("f_00630bb"), None); // too long
    }

    #[test]
    fn simple_cache_names() {
        assert_eq!(
            simple_cache_stream("170e8695a0c85bd4_0"),
            Some(("170e8695a0c85bd4", Stream::Zero))
        );
        assert_eq!(
            simple_cache_stream("170e8695a0c85bd4_s"),
            Some(("170e8695a0c85bd4", Stream::Sparse))
        );
        assert_eq!(
            simple_cache_stream("170e8695a0c85bd4_1"),
            Some(("170e8695a0c85bd4", Stream::One))
        );
        // Uppercase hashes are not written by Chromium.
        assert_eq!(simple_cache_stream("170E8695A0C85BD4_0"), None);
        assert_eq!(simple_cache_stream("170e8695a0c85bd4_2"), None);
        assert_eq!(simple_cache_stream("170e8695a0c85bd_0"), None);
    }

    #[test]
    fn unrelated_names_rejected() {
        assert!(!is_cache_file("index"));
        assert!(!is_cache_file("the-real-index"));
        assert!(!is_cache_file(".DS_Store"));
        assert!(is_cache_file("f_000001"));
        assert!(is_cache_file("1234567890abcdef_s"));
    }
}
