//! Cache directory listing and validation.

use std::path::Path;
use std::time::UNIX_EPOCH;

use cp_core::{CacheFileEntry, CachePathInfo, Error, Result};

use crate::names::is_cache_file;
use crate::paths::client_name;

/// List all cache files in a directory (non-recursive), sorted by name.
///
/// Files whose names match neither cache shape are ignored.
pub fn list_cache_files(dir: &Path) -> Result<Vec<CacheFileEntry>> {
    if !dir.is_dir() {
        return Err(Error::Internal(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::from_read(dir, e))? {
        let entry = entry?;
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_cache_file(&name) {
            continue;
        }
        let modified_at = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64());
        files.push(CacheFileEntry {
            name,
            path: entry.path(),
            size: meta.len(),
            modified_at,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Describe a candidate cache directory: existence, matching-file count and
/// total size, and the client it appears to belong to.
pub fn validate_cache_path(path: &str) -> Result<CachePathInfo> {
    let dir = Path::new(path);
    let client_name = client_name(path);

    if !dir.exists() {
        return Ok(CachePathInfo {
            path: path.to_string(),
            exists: false,
            file_count: 0,
            total_size: 0,
            client_name,
        });
    }

    let mut file_count = 0usize;
    let mut total_size = 0u64;
    for entry in std::fs::read_dir(dir).map_err(|e| Error::from_read(dir, e))? {
        let Ok(entry) = entry else { continue };
        let Ok(meta) = entry.metadata() else { continue };
        if meta.is_file() && is_cache_file(&entry.file_name().to_string_lossy()) {
            file_count += 1;
            total_size += meta.len();
        }
    }

    Ok(CachePathInfo {
        path: path.to_string(),
        exists: true,
        file_count,
        total_size,
        client_name,
    })
}
