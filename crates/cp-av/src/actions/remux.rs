//! Stream-copy remuxing.

use std::path::Path;

use crate::actions::tolerant_input;
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Remux `input` to `output` with stream copy (`-c copy`).
///
/// This is the mandatory path for assembled chunked MP4s: re-encoding stops
/// at the first zero-filled gap, while stream copy carries every sample
/// across it. `+faststart` relocates a tail `moov` to the front as a side
/// effect.
pub async fn remux(tools: &ToolRegistry, input: &Path, output: &Path) -> cp_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("remux {} -> {}", input.display(), output.display());

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    tolerant_input(&mut cmd, input);
    cmd.args(["-c", "copy"]);
    cmd.args(["-movflags", "+faststart"]);
    cmd.args(["-max_muxing_queue_size", "1024"]);
    cmd.arg_path(output);
    cmd.execute().await?;

    Ok(())
}
