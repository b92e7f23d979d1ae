//! Resource grouping: Simple Cache hash groups, Blockfile chunk walk.
//!
//! The Blockfile backend writes a large body as a header file followed by
//! ~1 MiB continuation chunks at nearby hex numbers. Grouping pairs each
//! detected media header with its continuation chunks by hex locality;
//! whatever is left over lands in a single trailing `unknown_data`
//! resource so every Blockfile entry is accounted for exactly once.

use std::collections::{BTreeMap, HashSet};

use cp_core::progress::ScanPhase;
use cp_core::{CacheFileEntry, MediaKind, Resource, Result, VideoInfo};
use cp_media::mp4::{extract_video_info, find_first, parse_top_level, scan_for_moov};
use cp_media::{detect, plan_chunked_mp4};
use tracing::{debug, warn};

use super::Scanner;

/// Hex-distance budget for non-MP4 continuation groups. Spans the expected
/// ~1 MiB x ~500 tail-chunk worst case while rejecting unrelated media.
const HEX_LOCALITY_BUDGET: u32 = 500;

#[derive(Default)]
struct HashGroup {
    file0: Option<CacheFileEntry>,
    file1: Option<CacheFileEntry>,
    file_s: Option<CacheFileEntry>,
}

/// One Blockfile entry in the unified walk.
struct WalkEntry {
    entry: CacheFileEntry,
    hex: u32,
    kind: Option<MediaKind>,
    /// Full body buffer, kept only for MP4 header files (the assembler
    /// needs the parsed `mdat` geometry).
    mp4_data: Option<Vec<u8>>,
}

fn is_continuation_class(kind: Option<MediaKind>) -> bool {
    match kind {
        None => true,
        Some(k) => k.is_continuation(),
    }
}

/// What full-buffer MP4 inspection concluded.
struct Mp4Inspection {
    complete: bool,
    video_info: Option<VideoInfo>,
}

fn inspect_mp4(buf: &[u8]) -> Mp4Inspection {
    let boxes = parse_top_level(buf);
    let moov = find_first(&boxes, b"moov");
    let has_mdat = boxes.iter().any(|b| &b.box_type == b"mdat");

    let video_info = match moov {
        Some(m) => Some(extract_video_info(buf, m.offset, m.size as usize)),
        // The box chain may be broken even though a moov exists further in.
        None => scan_for_moov(buf)
            .first()
            .map(|&(off, size)| extract_video_info(buf, off, size)),
    };

    Mp4Inspection {
        complete: moov.is_some() && has_mdat,
        video_info,
    }
}

fn display_name(kind: MediaKind, id: u32) -> String {
    use cp_core::MediaCategory::*;
    match kind.category() {
        Image => format!("Image_{id}"),
        Video => format!("Video_{id}"),
        Audio => format!("Audio_{id}"),
        Other => format!("Data_{id}"),
    }
}

/// Allocates resource ids in emission order.
struct ResourceSink {
    resources: Vec<Resource>,
}

impl ResourceSink {
    fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    fn emit(&mut self, kind: MediaKind, files: Vec<CacheFileEntry>, video_info: Option<VideoInfo>) {
        let id = self.resources.len() as u32 + 1;
        debug!(
            "resource #{id}: {kind} from {} file(s) starting {}",
            files.len(),
            files.first().map(|f| f.name.as_str()).unwrap_or("?")
        );
        self.resources.push(Resource::from_files(
            id,
            kind,
            display_name(kind, id),
            files,
            video_info,
        ));
    }
}

/// Run phases 1-5 over a listed directory.
pub(super) fn group(scanner: &Scanner, entries: Vec<CacheFileEntry>) -> Result<Vec<Resource>> {
    let total = entries.len();
    let prefix_len = scanner.prefix_read_bytes();

    // Phase 1: partition by backend.
    let mut hash_groups: BTreeMap<String, HashGroup> = BTreeMap::new();
    let mut blockfile_files: Vec<CacheFileEntry> = Vec::new();
    for entry in entries {
        match cp_cache::simple_cache_stream(&entry.name) {
            Some((hash, stream)) => {
                let group = hash_groups.entry(hash.to_string()).or_default();
                match stream {
                    cp_cache::Stream::Zero => group.file0 = Some(entry),
                    cp_cache::Stream::One => group.file1 = Some(entry),
                    cp_cache::Stream::Sparse => group.file_s = Some(entry),
                }
            }
            None => blockfile_files.push(entry),
        }
    }

    let mut sink = ResourceSink::new();
    let mut processed = 0usize;

    // Phase 2a: Simple Cache detection, one resource per hash at most.
    for (hash, group) in &hash_groups {
        if scanner.is_cancelled() {
            return Ok(sink.resources);
        }
        processed += [&group.file0, &group.file1, &group.file_s]
            .iter()
            .filter(|f| f.is_some())
            .count();
        scanner.emit(ScanPhase::Detecting, processed, total, Some(hash.as_str()));
        detect_simple_entry(group, prefix_len, &mut sink);
    }

    // Phase 2b: Blockfile detection.
    let mut mp4_headers: Vec<(CacheFileEntry, Vec<u8>)> = Vec::new();
    let mut standalone: Vec<(CacheFileEntry, MediaKind, Option<VideoInfo>)> = Vec::new();
    let mut data_chunks: Vec<CacheFileEntry> = Vec::new();

    for entry in blockfile_files {
        if scanner.is_cancelled() {
            return Ok(sink.resources);
        }
        processed += 1;
        scanner.emit(ScanPhase::Detecting, processed, total, Some(entry.name.as_str()));

        let prefix = match cp_cache::read_header(&entry.path, prefix_len) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to read {}: {e}", entry.name);
                data_chunks.push(entry);
                continue;
            }
        };

        match detect(&prefix) {
            // A real ftyp: decide complete vs header-only from the box tree.
            Some(MediaKind::Mp4Complete) => match cp_cache::read_all(&entry.path) {
                Ok(full) => {
                    let inspection = inspect_mp4(&full);
                    if inspection.complete {
                        standalone.push((entry, MediaKind::Mp4Complete, inspection.video_info));
                    } else {
                        mp4_headers.push((entry, full));
                    }
                }
                Err(e) => {
                    warn!("Failed to read {}: {e}", entry.name);
                    data_chunks.push(entry);
                }
            },
            Some(kind) => standalone.push((entry, kind, None)),
            None => data_chunks.push(entry),
        }
    }

    // Phase 3: group split. Fragments and continuations can never stand
    // alone; non-MP4 media headers join the walk so nearby chunks can
    // attach to them. Everything else emits as a single-file resource.
    scanner.emit(ScanPhase::Grouping, processed, total, None);
    let mut pool: Vec<(CacheFileEntry, MediaKind)> = Vec::new();
    let mut header_entries: Vec<(CacheFileEntry, MediaKind)> = Vec::new();
    for (entry, kind, video_info) in standalone {
        if kind == MediaKind::Mp4Fragment || kind == MediaKind::WebmContinuation {
            pool.push((entry, kind));
        } else if kind.is_media_header() {
            header_entries.push((entry, kind));
        } else {
            sink.emit(kind, vec![entry], video_info);
        }
    }

    // Phase 4: unified hex-sorted walk.
    let mut walk: Vec<WalkEntry> = Vec::new();
    for (entry, data) in mp4_headers {
        if let Some(hex) = cp_cache::blockfile_hex(&entry.name) {
            walk.push(WalkEntry {
                entry,
                hex,
                kind: Some(MediaKind::Mp4HeaderOnly),
                mp4_data: Some(data),
            });
        }
    }
    for (entry, kind) in header_entries.into_iter().chain(pool) {
        if let Some(hex) = cp_cache::blockfile_hex(&entry.name) {
            walk.push(WalkEntry {
                entry,
                hex,
                kind: Some(kind),
                mp4_data: None,
            });
        }
    }
    for entry in data_chunks {
        if let Some(hex) = cp_cache::blockfile_hex(&entry.name) {
            walk.push(WalkEntry {
                entry,
                hex,
                kind: None,
                mp4_data: None,
            });
        }
    }
    walk.sort_by_key(|w| w.hex);

    let mut claimed: HashSet<String> = HashSet::new();
    for i in 0..walk.len() {
        let head = &walk[i];
        if claimed.contains(&head.entry.name) {
            continue;
        }
        let Some(kind) = head.kind else { continue };
        if !kind.is_media_header() {
            continue;
        }

        if kind == MediaKind::Mp4HeaderOnly {
            let candidates: Vec<CacheFileEntry> = walk
                .iter()
                .filter(|w| {
                    !claimed.contains(&w.entry.name)
                        && w.entry.name != head.entry.name
                        && is_continuation_class(w.kind)
                })
                .map(|w| w.entry.clone())
                .collect();

            let header_buf = head.mp4_data.as_deref().unwrap_or_default();
            let video_info = scan_for_moov(header_buf)
                .first()
                .map(|&(off, size)| extract_video_info(header_buf, off, size));

            match plan_chunked_mp4(&head.entry, header_buf, &candidates) {
                Some(plan) if plan.kind == MediaKind::Mp4Chunked => {
                    for f in &plan.files {
                        claimed.insert(f.name.clone());
                    }
                    sink.emit(MediaKind::Mp4Chunked, plan.files, video_info);
                }
                _ => {
                    claimed.insert(head.entry.name.clone());
                    sink.emit(MediaKind::Mp4HeaderOnly, vec![head.entry.clone()], video_info);
                }
            }
        } else {
            // Non-MP4 media header: accumulate continuation-class entries
            // within the hex locality budget.
            let mut files = vec![head.entry.clone()];
            let head_hex = head.hex;
            for w in &walk[i + 1..] {
                if claimed.contains(&w.entry.name) {
                    continue;
                }
                if !is_continuation_class(w.kind) {
                    break; // next media header starts its own group
                }
                if w.hex - head_hex > HEX_LOCALITY_BUDGET {
                    break;
                }
                files.push(w.entry.clone());
            }
            for f in &files {
                claimed.insert(f.name.clone());
            }
            sink.emit(kind, files, None);
        }
    }

    // Phase 5: everything unclaimed coalesces into one unknown_data tail.
    let leftovers: Vec<CacheFileEntry> = walk
        .into_iter()
        .filter(|w| !claimed.contains(&w.entry.name))
        .map(|w| w.entry)
        .collect();
    if !leftovers.is_empty() {
        sink.emit(MediaKind::UnknownData, leftovers, None);
    }

    Ok(sink.resources)
}

/// Phase 2a for one Simple Cache hash group.
///
/// The sparse stream wins whenever present and nonempty (most video arrives
/// as HTTP 206 ranges); Content-Type is consulted only after magic bytes
/// fail, and never overrides a confirmed signature. Entries nothing can
/// identify are dropped.
fn detect_simple_entry(group: &HashGroup, prefix_len: usize, sink: &mut ResourceSink) {
    if let Some(sparse) = group.file_s.as_ref().filter(|s| s.size > 0) {
        let kind = match cp_cache::read_sparse_header(&sparse.path, prefix_len) {
            Ok(prefix) => detect(&prefix),
            Err(e) => {
                warn!("Failed to read sparse {}: {e}", sparse.name);
                None
            }
        };
        let kind = kind.or_else(|| mime_fallback(group.file0.as_ref()));

        match kind {
            Some(k) if k.is_mp4_variant() => {
                match cp_cache::read_sparse_all(&sparse.path) {
                    Ok(full) => {
                        let inspection = inspect_mp4(&full);
                        let kind = if inspection.complete {
                            MediaKind::Mp4Complete
                        } else {
                            MediaKind::Mp4HeaderOnly
                        };
                        let mut entry = sparse.clone();
                        entry.size = full.len() as u64;
                        sink.emit(kind, vec![entry], inspection.video_info);
                        return;
                    }
                    Err(e) => warn!("Failed to reassemble {}: {e}", sparse.name),
                }
            }
            Some(k) => {
                let mut entry = sparse.clone();
                // Report the logical stream size, not the on-disk framing.
                entry.size = cp_cache::sparse_total_size(&sparse.path).unwrap_or(sparse.size);
                sink.emit(k, vec![entry], None);
                return;
            }
            None => {}
        }
    }

    let Some(file0) = group.file0.as_ref() else {
        return;
    };
    let kind = match cp_cache::read_header(&file0.path, prefix_len) {
        Ok(prefix) => detect(&prefix),
        Err(e) => {
            warn!("Failed to read {}: {e}", file0.name);
            return;
        }
    };
    let kind = kind.or_else(|| mime_fallback(Some(file0)));

    match kind {
        Some(k) if k.is_mp4_variant() => match cp_cache::read_all(&file0.path) {
            Ok(full) => {
                let inspection = inspect_mp4(&full);
                let kind = if inspection.complete {
                    MediaKind::Mp4Complete
                } else {
                    MediaKind::Mp4HeaderOnly
                };
                sink.emit(kind, vec![file0.clone()], inspection.video_info);
            }
            Err(e) => warn!("Failed to read {}: {e}", file0.name),
        },
        Some(k) => sink.emit(k, vec![file0.clone()], None),
        // Not detectable as media; Simple Cache entries are never data chunks.
        None => {}
    }
}

fn mime_fallback(file0: Option<&CacheFileEntry>) -> Option<MediaKind> {
    let file0 = file0?;
    match cp_cache::read_content_type(&file0.path) {
        Ok(Some(mime)) => {
            let kind = MediaKind::from_mime(&mime);
            debug!("{}: content-type {mime} -> {kind:?}", file0.name);
            kind
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read content-type from {}: {e}", file0.name);
            None
        }
    }
}
