//! Re-encoding recovered video for playability.

use std::path::Path;

use crate::actions::tolerant_input;
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Output encode settings shared by [`reencode`] and [`gif_to_mp4`]:
/// H.264 fast/CRF 18, 4:2:0, even dimensions (libx264 rejects odd sizes).
fn h264_output(cmd: &mut ToolCommand) {
    cmd.args(["-c:v", "libx264"]);
    cmd.args(["-preset", "fast"]);
    cmd.args(["-crf", "18"]);
    cmd.args(["-pix_fmt", "yuv420p"]);
    cmd.args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2"]);
}

/// Re-encode `input` to `output` (H.264 + AAC 192k, `+faststart`).
///
/// Used for single-file recovered videos, where lossy-but-tolerant decoding
/// beats keeping a file most players reject.
pub async fn reencode(tools: &ToolRegistry, input: &Path, output: &Path) -> cp_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("re-encode {} -> {}", input.display(), output.display());

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    tolerant_input(&mut cmd, input);
    h264_output(&mut cmd);
    cmd.args(["-c:a", "aac"]);
    cmd.args(["-b:a", "192k"]);
    cmd.args(["-movflags", "+faststart"]);
    cmd.args(["-max_muxing_queue_size", "1024"]);
    cmd.arg_path(output);
    cmd.execute().await?;

    Ok(())
}

/// Re-encode `input` to a WebM `output` (VP9 + Opus).
///
/// Used when the caller wants recovered WebM/MKV groups kept in their
/// native container instead of converted to MP4.
pub async fn reencode_webm(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
) -> cp_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("re-encode {} -> {}", input.display(), output.display());

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    tolerant_input(&mut cmd, input);
    cmd.args(["-c:v", "libvpx-vp9"]);
    cmd.args(["-crf", "32"]);
    cmd.args(["-b:v", "0"]);
    cmd.args(["-c:a", "libopus"]);
    cmd.args(["-b:a", "128k"]);
    cmd.arg_path(output);
    cmd.execute().await?;

    Ok(())
}

/// Convert a recovered GIF into a silent looping-friendly MP4.
pub async fn gif_to_mp4(tools: &ToolRegistry, input: &Path, output: &Path) -> cp_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("gif->mp4 {} -> {}", input.display(), output.display());

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.arg("-y");
    cmd.arg("-i");
    cmd.arg_path(input);
    h264_output(&mut cmd);
    cmd.args(["-movflags", "+faststart"]);
    cmd.arg("-an"); // GIFs have no audio track
    cmd.arg_path(output);
    cmd.execute().await?;

    Ok(())
}
