//! Joining recovered videos into a single output.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Join `inputs` in order into one MP4 via the concat demuxer.
///
/// The inputs are re-encoded rather than stream-copied: recovered videos
/// rarely share codec parameters, and the joined file must play as one
/// stream. The concat list is a scratch file in the system temp directory,
/// removed on both success and failure.
pub async fn concat_videos(
    tools: &ToolRegistry,
    inputs: &[PathBuf],
    output: &Path,
) -> cp_core::Result<()> {
    if inputs.len() < 2 {
        return Err(cp_core::Error::tool(
            "ffmpeg",
            "concat needs at least two inputs",
        ));
    }
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("concat {} videos -> {}", inputs.len(), output.display());

    let list_path = scratch_list_path();
    let result = write_concat_list(&list_path, inputs);
    let result = match result {
        Ok(()) => {
            let mut cmd = ToolCommand::new(ffmpeg.path.clone());
            cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"]);
            cmd.arg_path(&list_path);
            cmd.args(["-c:v", "libx264"]);
            cmd.args(["-preset", "fast"]);
            cmd.args(["-crf", "18"]);
            cmd.args(["-pix_fmt", "yuv420p"]);
            cmd.args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2"]);
            cmd.args(["-c:a", "aac"]);
            cmd.args(["-b:a", "192k"]);
            cmd.args(["-movflags", "+faststart"]);
            cmd.arg_path(output);
            cmd.execute().await.map(|_| ())
        }
        Err(e) => Err(e),
    };

    let _ = std::fs::remove_file(&list_path);
    result
}

/// Scratch path salted with pid + monotonic nanos to avoid collisions.
fn scratch_list_path() -> PathBuf {
    let salt = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "cachephoenix_concat_{}_{salt}.txt",
        std::process::id()
    ))
}

fn write_concat_list(list_path: &Path, inputs: &[PathBuf]) -> cp_core::Result<()> {
    let mut file = std::fs::File::create(list_path)?;
    for input in inputs {
        // concat demuxer quoting: wrap in single quotes, escape embedded ones.
        let escaped = input.to_string_lossy().replace('\'', r"'\''");
        writeln!(file, "file '{escaped}'")?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_list_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.txt");
        write_concat_list(
            &list,
            &[
                PathBuf::from("/out/a.mp4"),
                PathBuf::from("/out/it's here.mp4"),
            ],
        )
        .unwrap();
        let text = std::fs::read_to_string(&list).unwrap();
        assert!(text.contains("file '/out/a.mp4'"));
        assert!(text.contains(r"file '/out/it'\''s here.mp4'"));
    }

    #[tokio::test]
    async fn concat_rejects_single_input() {
        let registry = ToolRegistry::discover(&cp_core::config::ToolsConfig::default());
        let result = concat_videos(
            &registry,
            &[PathBuf::from("/out/a.mp4")],
            Path::new("/out/joined.mp4"),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn scratch_paths_differ() {
        assert_ne!(scratch_list_path(), scratch_list_path());
    }
}
