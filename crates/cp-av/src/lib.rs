//! cp-av: external media tool discovery and invocation.
//!
//! Recovered cache bytes are made playable by an FFmpeg-family tool run as a
//! child process. [`ToolRegistry`] locates the binaries, [`ToolCommand`]
//! executes them with a timeout, and [`actions`] holds the specific
//! invocations (remux, re-encode, thumbnail, concat) with their
//! error-tolerant flag sets.

pub mod actions;
pub mod command;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
