//! cp-core: shared types, errors, configuration, and progress events.
//!
//! This crate is the foundational dependency for all other cp-* crates,
//! providing the unified error type, the media-kind lattice, cache resource
//! records, application configuration, and scan/recovery progress payloads.

pub mod config;
pub mod error;
pub mod media;
pub mod progress;
pub mod types;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use media::{MediaCategory, MediaKind};
pub use types::{CacheFileEntry, CachePathInfo, Resource, VideoInfo};
