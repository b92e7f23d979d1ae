//! Per-resource recovery pipelines.
//!
//! Every resource follows one of three shapes:
//! - copy (images, audio, unidentified data), with an optional re-encode
//!   pass for single-file video;
//! - assemble-then-remux for chunked MP4s (stream copy is mandatory there:
//!   re-encoding silently truncates at the first zero-filled gap);
//! - concat-then-re-encode for WebM/MKV groups.
//!
//! Failures are values: an error aborts only its resource, never the batch.

use std::io::Write;
use std::path::{Path, PathBuf};

use cp_av::{actions, ToolRegistry};
use cp_core::config::RecoveryConfig;
use cp_core::progress::{CancelFlag, RecoveryPhase, RecoveryProgressFn};
use cp_core::{MediaCategory, MediaKind, Resource, Result};
use cp_media::mp4::{count_moov, strip_duplicate_moov};
use tracing::{debug, warn};

use super::progress::Tracker;
use super::OUTPUT_MARKER;
use crate::thumbs::ThumbCache;

/// Where and how to write recovered files.
pub struct RecoveryOptions {
    pub output_dir: PathBuf,
    pub recovery: RecoveryConfig,
    pub thumb_cache: Option<ThumbCache>,
}

/// Outcome of one recovery batch.
#[derive(Debug, Default)]
pub struct RecoverySummary {
    /// `(resource id, output path)` for every resource that recovered.
    pub recovered: Vec<(u32, PathBuf)>,
    pub errors: Vec<String>,
}

/// Drives recovery of a batch of resources through the external tool.
pub struct RecoveryDriver {
    tools: ToolRegistry,
    options: RecoveryOptions,
    progress: Option<RecoveryProgressFn>,
    cancel: CancelFlag,
}

impl RecoveryDriver {
    pub fn new(tools: ToolRegistry, options: RecoveryOptions) -> Self {
        Self {
            tools,
            options,
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: RecoveryProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attach an external cancellation flag, polled between resources.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Recover every resource in `resources`, in the order given.
    ///
    /// The batch always runs to completion (or cancellation); per-resource
    /// failures land in [`RecoverySummary::errors`].
    pub async fn recover(&self, resources: &[Resource]) -> Result<RecoverySummary> {
        std::fs::create_dir_all(&self.options.output_dir)?;
        // Sentinel goes in first so partial outputs are still recognizable.
        std::fs::write(self.options.output_dir.join(OUTPUT_MARKER), b"")?;

        let mut tracker = Tracker::new(self.progress.as_ref(), resources.len());
        let mut summary = RecoverySummary::default();
        let mut videos: Vec<(Option<f64>, PathBuf)> = Vec::new();

        for (idx, res) in resources.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracker.log("Recovery cancelled");
                break;
            }

            match self.recover_one(res, idx, &mut tracker).await {
                Ok(out) => {
                    tracker.log(format!("Recovered {} -> {}", res.display_name, out.display()));
                    if res.category == MediaCategory::Video {
                        videos.push((res.modified_at, out.clone()));
                    }
                    self.post_steps(res, &out, &mut tracker).await;
                    summary.recovered.push((res.id, out));
                }
                Err(e) => {
                    tracker.error(format!("{}: {e}", res.display_name));
                }
            }
        }

        if self.options.recovery.concatenate_videos && videos.len() >= 2 {
            if let Err(e) = self.concatenate(&mut videos, &mut tracker).await {
                tracker.error(format!("Concatenation failed: {e}"));
            }
        }

        summary.errors = tracker.errors().to_vec();
        tracker.emit(RecoveryPhase::Complete, resources.len(), None);
        Ok(summary)
    }

    async fn recover_one(
        &self,
        res: &Resource,
        idx: usize,
        tracker: &mut Tracker<'_>,
    ) -> Result<PathBuf> {
        let base = self.output_base(res)?;
        match res.kind {
            MediaKind::Mp4Chunked => self.recover_chunked(res, idx, &base, tracker).await,
            MediaKind::WebmMkv => self.recover_webm(res, idx, &base, tracker).await,
            k if k.category() == MediaCategory::Video => {
                self.recover_video(res, idx, &base, tracker).await
            }
            _ => self.recover_copy(res, idx, &base, tracker),
        }
    }

    /// Copy pipeline: concatenate member bodies verbatim (a single file is
    /// the trivial case; sparse sources reassemble through the reader).
    fn recover_copy(
        &self,
        res: &Resource,
        idx: usize,
        base: &Path,
        tracker: &mut Tracker<'_>,
    ) -> Result<PathBuf> {
        tracker.emit(RecoveryPhase::Copying, idx, Some(res.display_name.as_str()));
        let out = with_suffix(base, res.kind.extension());
        concat_bodies(res, &out)?;
        Ok(out)
    }

    /// Single-file (or grouped non-WebM) video: copy, then re-encode for
    /// playability and atomically replace.
    async fn recover_video(
        &self,
        res: &Resource,
        idx: usize,
        base: &Path,
        tracker: &mut Tracker<'_>,
    ) -> Result<PathBuf> {
        tracker.emit(RecoveryPhase::Copying, idx, Some(res.display_name.as_str()));
        let raw = with_suffix(base, res.kind.extension());
        concat_bodies(res, &raw)?;

        if !self.options.recovery.reencode_recovered_video {
            return Ok(raw);
        }

        tracker.emit(RecoveryPhase::Encoding, idx, Some(res.display_name.as_str()));
        let tmp = with_suffix(base, ".reenc.mp4");
        let out = with_suffix(base, ".mp4");
        match actions::reencode(&self.tools, &raw, &tmp).await {
            Ok(()) => {
                if raw != out {
                    let _ = std::fs::remove_file(&raw);
                }
                std::fs::rename(&tmp, &out)?;
                tracker.emit(RecoveryPhase::Validating, idx, Some(res.display_name.as_str()));
                fix_duplicate_moov(&out)?;
                Ok(out)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&tmp);
                tracker.log(format!(
                    "Re-encode failed for {}; keeping raw copy at {}",
                    res.display_name,
                    raw.display()
                ));
                Err(e)
            }
        }
    }

    /// Chunked MP4: assemble the contiguous stream, then remux with stream
    /// copy. The raw assembly survives a failed remux as best-effort output.
    async fn recover_chunked(
        &self,
        res: &Resource,
        idx: usize,
        base: &Path,
        tracker: &mut Tracker<'_>,
    ) -> Result<PathBuf> {
        tracker.emit(RecoveryPhase::Reconstructing, idx, Some(res.display_name.as_str()));
        let raw = with_suffix(base, "_raw.mp4");
        let bytes = cp_media::assemble_chunked_mp4(&res.files, &raw)?;
        debug!("{}: assembled {bytes} bytes", res.display_name);

        tracker.emit(RecoveryPhase::Encoding, idx, Some(res.display_name.as_str()));
        let out = with_suffix(base, ".mp4");
        match actions::remux(&self.tools, &raw, &out).await {
            Ok(()) => {
                let _ = std::fs::remove_file(&raw);
                tracker.emit(RecoveryPhase::Validating, idx, Some(res.display_name.as_str()));
                fix_duplicate_moov(&out)?;
                Ok(out)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&out);
                tracker.log(format!(
                    "Remux failed for {}; raw assembly kept at {}",
                    res.display_name,
                    raw.display()
                ));
                Err(e)
            }
        }
    }

    /// WebM/MKV group: verbatim concat into a scratch `.webm`, then
    /// re-encode to MP4 (default) or WebM. The scratch file is deleted on
    /// both success and failure.
    async fn recover_webm(
        &self,
        res: &Resource,
        idx: usize,
        base: &Path,
        tracker: &mut Tracker<'_>,
    ) -> Result<PathBuf> {
        tracker.emit(RecoveryPhase::Copying, idx, Some(res.display_name.as_str()));
        let scratch = scratch_path("webm");
        concat_bodies(res, &scratch)?;

        tracker.emit(RecoveryPhase::Encoding, idx, Some(res.display_name.as_str()));
        let convert = self.options.recovery.convert_webm_to_mp4;
        let out = with_suffix(base, if convert { ".mp4" } else { ".webm" });
        let result = if convert {
            actions::reencode(&self.tools, &scratch, &out).await
        } else {
            actions::reencode_webm(&self.tools, &scratch, &out).await
        };
        let _ = std::fs::remove_file(&scratch);
        result?;

        if convert {
            tracker.emit(RecoveryPhase::Validating, idx, Some(res.display_name.as_str()));
            fix_duplicate_moov(&out)?;
        }
        Ok(out)
    }

    /// Optional post-steps; their failures are logged but never fail the
    /// already-recovered resource.
    async fn post_steps(&self, res: &Resource, out: &Path, tracker: &mut Tracker<'_>) {
        let Ok(base) = self.output_base(res) else {
            return;
        };

        if self.options.recovery.gif_to_mp4 && res.kind == MediaKind::Gif {
            let converted = with_suffix(&base, "_converted.mp4");
            if let Err(e) = actions::gif_to_mp4(&self.tools, out, &converted).await {
                tracker.log(format!("GIF conversion failed for {}: {e}", res.display_name));
            }
        }

        if self.options.recovery.generate_thumbnails && res.category == MediaCategory::Video {
            let thumb = with_suffix(&base, "_thumb.jpg");
            if let Err(e) = self.render_thumbnail(res, out, &thumb).await {
                tracker.log(format!("Thumbnail failed for {}: {e}", res.display_name));
            }
        }
    }

    /// Render (or reuse) the preview frame for a recovered video.
    async fn render_thumbnail(&self, res: &Resource, out: &Path, thumb: &Path) -> Result<()> {
        let source = res
            .files
            .first()
            .map(|f| f.path.as_path())
            .unwrap_or(out);

        if let Some(ref cache) = self.options.thumb_cache {
            if let Some(cached) = cache.get(source, res.modified_at, res.total_size) {
                std::fs::copy(&cached, thumb)?;
                return Ok(());
            }
        }

        actions::thumbnail(&self.tools, out, thumb).await?;

        if let Some(ref cache) = self.options.thumb_cache {
            let jpeg = std::fs::read(thumb)?;
            cache.put(source, res.modified_at, res.total_size, &jpeg)?;
        }
        Ok(())
    }

    /// Join recovered videos, oldest first, into one output.
    async fn concatenate(
        &self,
        videos: &mut [(Option<f64>, PathBuf)],
        tracker: &mut Tracker<'_>,
    ) -> Result<()> {
        videos.sort_by(|a, b| {
            a.0.unwrap_or(0.0)
                .partial_cmp(&b.0.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let inputs: Vec<PathBuf> = videos.iter().map(|(_, p)| p.clone()).collect();

        let dir = if self.options.recovery.organize_by_type {
            self.options.output_dir.join(MediaCategory::Video.dir_name())
        } else {
            self.options.output_dir.clone()
        };
        let out = dir.join("Concatenated_Video.mp4");
        tracker.log(format!("Joining {} videos -> {}", inputs.len(), out.display()));
        actions::concat_videos(&self.tools, &inputs, &out).await
    }

    /// `out_dir[/category]/safe_name`, extension added by the caller.
    fn output_base(&self, res: &Resource) -> Result<PathBuf> {
        let mut dir = self.options.output_dir.clone();
        if self.options.recovery.organize_by_type {
            dir = dir.join(res.category.dir_name());
        }
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(sanitize(&res.display_name)))
    }
}

/// Replace any character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Write all member bodies of a resource, in file order, to `out`.
fn concat_bodies(res: &Resource, out: &Path) -> Result<u64> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(out)?;
    let mut writer = std::io::BufWriter::new(file);
    let mut total = 0u64;
    for f in &res.files {
        let body = cp_cache::read_all(&f.path)?;
        total += body.len() as u64;
        writer.write_all(&body)?;
    }
    writer.flush()?;
    Ok(total)
}

/// Scratch path in the system temp dir, salted with pid + monotonic nanos.
fn scratch_path(ext: &str) -> PathBuf {
    let salt = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("cachephoenix_{}_{salt}.{ext}", std::process::id()))
}

/// Structural defense against an interrupted `+faststart`: keep only the
/// first `moov` in the written file. Running it twice is a no-op.
fn fix_duplicate_moov(path: &Path) -> Result<()> {
    let data = std::fs::read(path)?;
    let count = count_moov(&data);
    if count > 1 {
        warn!("{}: {count} moov boxes, keeping the first", path.display());
        if let Some(fixed) = strip_duplicate_moov(&data) {
            std::fs::write(path, fixed)?;
        }
    }
    Ok(())
}
