//! CachePhoenix - recover media from Chromium-family browser disk caches.
//!
//! This library crate exposes the scanner and recovery driver for
//! integration testing; the binary in `main.rs` wraps them in a CLI.

pub mod recovery;
pub mod scanner;
pub mod thumbs;
