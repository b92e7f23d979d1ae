//! Recovery driver integration tests
//!
//! Exercises the copy pipelines, output layout, error accumulation, and
//! cancellation against synthetic cache directories. Paths that need a
//! working ffmpeg are covered only for their failure semantics (a missing
//! tool must never abort the batch).

mod common;

use std::path::Path;
use std::sync::Arc;

use cachephoenix::recovery::{RecoveryDriver, RecoveryOptions, OUTPUT_MARKER};
use cachephoenix::scanner::Scanner;
use cp_core::config::{Config, RecoveryConfig};
use cp_core::progress::CancelFlag;
use cp_core::Resource;
use cp_av::ToolRegistry;
use tempfile::tempdir;

fn scan(dir: &Path) -> Vec<Resource> {
    Scanner::new(Arc::new(Config::default()))
        .scan_directory(dir)
        .unwrap()
}

fn copy_only_config() -> RecoveryConfig {
    RecoveryConfig {
        reencode_recovered_video: false,
        generate_thumbnails: false,
        ..RecoveryConfig::default()
    }
}

fn driver(out: &Path, recovery: RecoveryConfig) -> RecoveryDriver {
    RecoveryDriver::new(
        // No resolved tools: copy pipelines run, tool pipelines fail softly.
        ToolRegistry::empty(),
        RecoveryOptions {
            output_dir: out.to_path_buf(),
            recovery,
            thumb_cache: None,
        },
    )
}

#[tokio::test]
async fn marker_is_written_first() {
    let cache = tempdir().unwrap();
    let out = tempdir().unwrap();
    let summary = driver(out.path(), copy_only_config())
        .recover(&[])
        .await
        .unwrap();
    assert!(summary.recovered.is_empty());
    assert!(out.path().join(OUTPUT_MARKER).exists());
    drop(cache);
}

#[tokio::test]
async fn image_copy_round_trips() {
    let cache = tempdir().unwrap();
    let jpeg = common::jpeg_bytes();
    common::write_file(cache.path(), "f_000001", &jpeg);
    let resources = scan(cache.path());

    let out = tempdir().unwrap();
    let summary = driver(out.path(), copy_only_config())
        .recover(&resources)
        .await
        .unwrap();

    assert_eq!(summary.recovered.len(), 1);
    assert!(summary.errors.is_empty());
    let (_, path) = &summary.recovered[0];
    assert_eq!(path.extension().unwrap(), "jpg");
    assert_eq!(std::fs::read(path).unwrap(), jpeg);
}

#[tokio::test]
async fn sparse_image_copy_reassembles() {
    let cache = tempdir().unwrap();
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.extend_from_slice(&[0x7Au8; 4096]);
    let sparse = common::sparse_entry(
        b"https://example.com/i.png",
        &[(2048, &png[2048..]), (0, &png[..2048])],
    );
    common::write_file(cache.path(), "1234567890abcdef_s", &sparse);
    let resources = scan(cache.path());
    assert_eq!(resources.len(), 1);

    let out = tempdir().unwrap();
    let summary = driver(out.path(), copy_only_config())
        .recover(&resources)
        .await
        .unwrap();

    assert_eq!(summary.recovered.len(), 1);
    let (_, path) = &summary.recovered[0];
    // The recovered bytes are the reassembled stream, not the on-disk framing.
    assert_eq!(std::fs::read(path).unwrap(), png);
}

#[tokio::test]
async fn video_without_reencode_keeps_raw_copy() {
    let cache = tempdir().unwrap();
    let video = common::complete_mp4(64 * 1024);
    common::write_file(cache.path(), "f_000040", &video);
    let resources = scan(cache.path());

    let out = tempdir().unwrap();
    let summary = driver(out.path(), copy_only_config())
        .recover(&resources)
        .await
        .unwrap();

    assert_eq!(summary.recovered.len(), 1);
    assert!(summary.errors.is_empty());
    let (_, path) = &summary.recovered[0];
    assert_eq!(path.extension().unwrap(), "mp4");
    assert_eq!(std::fs::read(path).unwrap(), video);
}

#[tokio::test]
async fn missing_tool_records_error_without_aborting_batch() {
    let cache = tempdir().unwrap();
    // One video that wants re-encoding (tool missing -> error), one image
    // that needs no tool (must still recover).
    common::write_file(cache.path(), "f_000040", &common::complete_mp4(32 * 1024));
    common::write_file(cache.path(), "f_000001", &common::jpeg_bytes());
    let resources = scan(cache.path());
    assert_eq!(resources.len(), 2);

    let out = tempdir().unwrap();
    let config = RecoveryConfig {
        generate_thumbnails: false,
        ..RecoveryConfig::default()
    };
    let summary = driver(out.path(), config).recover(&resources).await.unwrap();

    assert_eq!(summary.recovered.len(), 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("ffmpeg"), "{:?}", summary.errors);
    // The raw copy survives the failed re-encode as best-effort output.
    let raw_kept = std::fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().ends_with(".mp4"));
    assert!(raw_kept);
}

#[tokio::test]
async fn chunked_assembly_survives_failed_remux() {
    let cache = tempdir().unwrap();
    common::write_file(
        cache.path(),
        "f_0000a0",
        &common::chunked_mp4_header(2 * 1024 * 1024, 1024),
    );
    common::write_file(cache.path(), "f_0000a1", &vec![0x77u8; 2048]);
    let resources = scan(cache.path());
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].kind, cp_core::MediaKind::Mp4Chunked);

    let out = tempdir().unwrap();
    let config = RecoveryConfig {
        generate_thumbnails: false,
        ..RecoveryConfig::default()
    };
    let summary = driver(out.path(), config).recover(&resources).await.unwrap();

    // Remux fails (no ffmpeg) but the raw assembly is kept on disk.
    assert!(summary.recovered.is_empty());
    assert_eq!(summary.errors.len(), 1);
    let raw = out.path().join("Video_1_raw.mp4");
    assert!(raw.exists());
    let data = std::fs::read(&raw).unwrap();
    assert!(data.len() > 2048);
}

#[tokio::test]
async fn organize_by_type_uses_category_dirs() {
    let cache = tempdir().unwrap();
    common::write_file(cache.path(), "f_000001", &common::jpeg_bytes());
    common::write_file(cache.path(), "f_000030", b"ID3\x04\x00mp3 body bytes");
    let resources = scan(cache.path());

    let out = tempdir().unwrap();
    let config = RecoveryConfig {
        organize_by_type: true,
        ..copy_only_config()
    };
    let summary = driver(out.path(), config).recover(&resources).await.unwrap();

    assert_eq!(summary.recovered.len(), 2);
    assert!(out.path().join("images").join("Image_1.jpg").exists());
    assert!(out.path().join("audio").join("Audio_2.mp3").exists());
}

#[tokio::test]
async fn multi_file_group_concatenates_bodies() {
    let cache = tempdir().unwrap();
    common::write_file(cache.path(), "f_000030", b"ID3\x04\x00first-part");
    common::write_file(cache.path(), "f_000031", b"second-part");
    let resources = scan(cache.path());
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].files.len(), 2);

    let out = tempdir().unwrap();
    let summary = driver(out.path(), copy_only_config())
        .recover(&resources)
        .await
        .unwrap();

    let (_, path) = &summary.recovered[0];
    let data = std::fs::read(path).unwrap();
    assert!(data.starts_with(b"ID3\x04\x00first-part"));
    assert!(data.ends_with(b"second-part"));
}

#[tokio::test]
async fn cancellation_stops_between_resources() {
    let cache = tempdir().unwrap();
    common::write_file(cache.path(), "f_000001", &common::jpeg_bytes());
    common::write_file(cache.path(), "f_000002", &common::jpeg_bytes());
    let resources = scan(cache.path());
    assert_eq!(resources.len(), 2);

    let cancel = CancelFlag::new();
    cancel.cancel();
    let out = tempdir().unwrap();
    let summary = driver(out.path(), copy_only_config())
        .with_cancel(cancel)
        .recover(&resources)
        .await
        .unwrap();

    assert!(summary.recovered.is_empty());
    assert!(summary.errors.is_empty());
    // The sentinel is still written: outputs remain recognizable.
    assert!(out.path().join(OUTPUT_MARKER).exists());
}

#[tokio::test]
async fn display_names_sanitize_into_portable_filenames() {
    let cache = tempdir().unwrap();
    common::write_file(cache.path(), "f_000001", &common::jpeg_bytes());
    let mut resources = scan(cache.path());
    resources[0].display_name = "weird name/with:chars".to_string();

    let out = tempdir().unwrap();
    let summary = driver(out.path(), copy_only_config())
        .recover(&resources)
        .await
        .unwrap();

    let (_, path) = &summary.recovered[0];
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "weird_name_with_chars.jpg"
    );
}
