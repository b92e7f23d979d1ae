//! Preview frame extraction.

use std::path::Path;

use crate::actions::tolerant_input;
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Render a single 320-px-wide JPEG preview frame from a video.
///
/// Seeks one second in to skip black lead-in frames; falls back to the
/// first frame for clips shorter than that.
pub async fn thumbnail(tools: &ToolRegistry, input: &Path, output: &Path) -> cp_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-ss", "1"]);
    tolerant_input(&mut cmd, input);
    cmd.args(["-frames:v", "1"]);
    cmd.args(["-vf", "scale=320:-2"]);
    cmd.args(["-q:v", "4"]);
    cmd.arg_path(output);

    if cmd.execute().await.is_err() {
        // Very short clip: take the first frame instead.
        let mut retry = ToolCommand::new(ffmpeg.path.clone());
        tolerant_input(&mut retry, input);
        retry.args(["-frames:v", "1"]);
        retry.args(["-vf", "scale=320:-2"]);
        retry.args(["-q:v", "4"]);
        retry.arg_path(output);
        retry.execute().await?;
    }

    Ok(())
}
