//! Photo sinks
//!
//! The worker photo feed decodes image bytes and hands them to a sink, which
//! stores them and returns a locator for the record. Where photos end up
//! (object storage, a local directory, nowhere) is the caller's choice.

use anyhow::Context;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Destination for decoded worker photos
pub trait PhotoSink: Send + Sync {
    /// Store a photo, returning a locator for the record (or `None` if the
    /// sink keeps nothing)
    fn store(
        &self,
        worker_id: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<Option<String>>;
}

/// Drops every photo
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardPhotoSink;

impl PhotoSink for DiscardPhotoSink {
    fn store(&self, _: Option<&str>, _: &str, _: &[u8]) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Keeps photos in memory, keyed by locator
#[derive(Debug, Default)]
pub struct MemoryPhotoSink {
    photos: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryPhotoSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under a locator
    pub fn get(&self, locator: &str) -> Option<Vec<u8>> {
        self.photos
            .lock()
            .ok()
            .and_then(|photos| photos.get(locator).cloned())
    }

    /// Number of stored photos
    pub fn len(&self) -> usize {
        self.photos.lock().map(|p| p.len()).unwrap_or_default()
    }

    /// Whether nothing has been stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PhotoSink for MemoryPhotoSink {
    fn store(
        &self,
        worker_id: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<Option<String>> {
        let locator = format!("memory://{}/{}", worker_id.unwrap_or("unknown"), filename);
        self.photos
            .lock()
            .map_err(|_| anyhow::anyhow!("photo store lock poisoned"))?
            .insert(locator.clone(), bytes.to_vec());
        Ok(Some(locator))
    }
}

/// Writes photos under `{root}/{worker_id}/{filename}`
#[derive(Debug, Clone)]
pub struct LocalDirPhotoSink {
    root: PathBuf,
}

impl LocalDirPhotoSink {
    /// Create a sink rooted at `root` (created on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PhotoSink for LocalDirPhotoSink {
    fn store(
        &self,
        worker_id: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<Option<String>> {
        let dir = self.root.join(sanitize(worker_id.unwrap_or("unknown")));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating photo directory {}", dir.display()))?;

        let path = dir.join(sanitize(filename));
        std::fs::write(&path, bytes)
            .with_context(|| format!("writing photo {}", path.display()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Stored worker photo");
        Ok(Some(path.display().to_string()))
    }
}

/// Keep a path component inside its directory
fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_sink() {
        let locator = DiscardPhotoSink.store(Some("21001"), "a.png", b"png").unwrap();
        assert!(locator.is_none());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemoryPhotoSink::new();
        let locator = sink.store(Some("21001"), "a.png", b"png").unwrap().unwrap();
        assert_eq!(locator, "memory://21001/a.png");
        assert_eq!(sink.get(&locator).unwrap(), b"png");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_local_dir_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirPhotoSink::new(dir.path());
        let locator = sink.store(Some("21001"), "../a.png", b"png").unwrap().unwrap();

        let path = PathBuf::from(&locator);
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(path).unwrap(), b"png");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a/b"), "a_b");
        assert_eq!(sanitize(".."), "_");
        assert_eq!(sanitize("photo.jpg"), "photo.jpg");
    }
}
