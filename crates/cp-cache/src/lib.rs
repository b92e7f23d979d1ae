//! cp-cache: reading Chromium disk-cache files.
//!
//! Chromium has written two cache layouts over the years. The Blockfile
//! backend stores each response body as a bare hex-numbered file
//! (`f_XXXXXX`); the Simple Cache backend stores each URL entry as up to
//! three files keyed by a 16-hex-char hash (`{hash}_0`, `{hash}_1`,
//! `{hash}_s`). This crate classifies filenames, strips the Simple Cache
//! framing to expose the HTTP body, reassembles sparse (`_s`) range
//! streams, and enumerates candidate cache directories per platform.

pub mod listing;
pub mod names;
pub mod paths;
pub mod reader;
pub mod record;
pub mod sparse;

pub use listing::{list_cache_files, validate_cache_path};
pub use paths::{client_name, default_cache_paths};
pub use names::{blockfile_hex, is_cache_file, simple_cache_stream, Stream};
pub use reader::{
    read_all, read_content_type, read_header, read_sparse_all, read_sparse_header,
    sparse_total_size,
};
