//! cp-media: byte-level media identification and reconstruction.
//!
//! Three concerns live here:
//! - [`sniff`]: mapping a prefix buffer to a [`cp_core::MediaKind`] via an
//!   ordered signature table.
//! - [`mp4`]: ISO BMFF box walking, displaced-`moov` salvage, and track
//!   metadata extraction.
//! - [`assemble`]: regrouping a chunked MP4 from its header file and cache
//!   tail chunks, and materializing the contiguous byte stream.

pub mod assemble;
pub mod mp4;
pub mod sniff;

pub use assemble::{assemble_chunked_mp4, plan_chunked_mp4, ChunkPlan};
pub use sniff::detect;
