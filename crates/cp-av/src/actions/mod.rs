//! FFmpeg invocations used by the recovery driver.

mod concat;
mod encode;
mod remux;
mod thumbnail;

pub use concat::concat_videos;
pub use encode::{gif_to_mp4, reencode, reencode_webm};
pub use remux::remux;
pub use thumbnail::thumbnail;

use crate::command::ToolCommand;
use std::path::Path;

/// Error-tolerant decode flags shared by every recovery invocation.
///
/// Recovered cache bytes routinely contain zero-filled holes and truncated
/// tail packets; without these flags ffmpeg refuses files it could largely
/// salvage.
pub(crate) fn tolerant_input(cmd: &mut ToolCommand, input: &Path) {
    cmd.args([
        "-y",
        "-fflags",
        "+genpts+discardcorrupt+igndts",
        "-analyzeduration",
        "100M",
        "-probesize",
        "100M",
        "-err_detect",
        "ignore_err",
        "-i",
    ]);
    cmd.arg_path(input);
}
