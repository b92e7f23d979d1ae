//! Content-addressed thumbnail result cache.
//!
//! Rendering a preview frame costs an ffmpeg invocation; scans revisit the
//! same cache entries constantly. Pre-rendered previews are stored keyed by
//! SHA-256 of `(source path, modified time, total size)`, so any change to
//! the underlying entry invalidates the cached image.

use std::path::{Path, PathBuf};

use cp_core::Result;
use sha2::{Digest, Sha256};

/// Filesystem-backed key/value store of rendered preview JPEGs.
#[derive(Debug, Clone)]
pub struct ThumbCache {
    base_dir: PathBuf,
}

impl ThumbCache {
    /// Open (and create) a cache rooted at `base_dir`.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn key(source: &Path, modified_at: Option<f64>, total_size: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.to_string_lossy().as_bytes());
        hasher.update(modified_at.unwrap_or(0.0).to_bits().to_le_bytes());
        hasher.update(total_size.to_le_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..8]) // 8 bytes = 16 hex chars
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.jpg"))
    }

    /// Path to the cached preview for this source, if present.
    pub fn get(&self, source: &Path, modified_at: Option<f64>, total_size: u64) -> Option<PathBuf> {
        let path = self.entry_path(&Self::key(source, modified_at, total_size));
        path.is_file().then_some(path)
    }

    /// Store a rendered preview and return its cache path.
    pub fn put(
        &self,
        source: &Path,
        modified_at: Option<f64>,
        total_size: u64,
        jpeg: &[u8],
    ) -> Result<PathBuf> {
        let path = self.entry_path(&Self::key(source, modified_at, total_size));
        std::fs::write(&path, jpeg)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbCache::new(dir.path().join("thumbs")).unwrap();
        let source = Path::new("/cache/f_0000a0");

        assert!(cache.get(source, Some(10.0), 500).is_none());
        let stored = cache.put(source, Some(10.0), 500, b"jpeg-bytes").unwrap();
        let found = cache.get(source, Some(10.0), 500).unwrap();
        assert_eq!(stored, found);
        assert_eq!(std::fs::read(&found).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn key_components_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbCache::new(dir.path().join("thumbs")).unwrap();
        let source = Path::new("/cache/f_0000a0");
        cache.put(source, Some(10.0), 500, b"x").unwrap();

        // Any component changing misses the cache.
        assert!(cache.get(source, Some(11.0), 500).is_none());
        assert!(cache.get(source, Some(10.0), 501).is_none());
        assert!(cache.get(Path::new("/cache/f_0000a1"), Some(10.0), 500).is_none());
        assert!(cache.get(source, Some(10.0), 500).is_some());
    }
}
