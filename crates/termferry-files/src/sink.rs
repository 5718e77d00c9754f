//! Download sinks.
//!
//! A sink receives verified download content and makes it available to the
//! user. [`DirectorySink`] writes into a local directory without overwriting
//! existing files; [`MemorySink`] keeps everything in memory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Download sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// File name is empty or refers to a directory
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// Writing the file failed
    #[error("failed to save {name}: {source}")]
    Io {
        /// Name being saved
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Destination for verified downloads
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save content under `name`, returning where it ended up
    async fn save(&self, name: &str, content: &[u8], content_type: &str) -> Result<String, SinkError>;
}

/// Saves downloads into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create a sink rooted at `root` (created on first save)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory downloads are written to
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Pick a path that does not exist yet: `name`, `name (1)`, `name (2)`, ...
    async fn free_path(&self, name: &str) -> PathBuf {
        let candidate = self.root.join(name);
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };

        let mut n = 1u32;
        loop {
            let file = match ext {
                Some(ext) => format!("{stem} ({n}).{ext}"),
                None => format!("{stem} ({n})"),
            };
            let candidate = self.root.join(file);
            if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Strip any directory components from a server-supplied file name
pub fn sanitize_name(name: &str) -> Result<&str, SinkError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(SinkError::InvalidName(name.to_string()));
    }
    Ok(base)
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, name: &str, content: &[u8], content_type: &str) -> Result<String, SinkError> {
        let base = sanitize_name(name)?;
        let io_err = |source| SinkError::Io {
            name: base.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(io_err)?;
        let path = self.free_path(base).await;
        tokio::fs::write(&path, content).await.map_err(io_err)?;

        tracing::info!(
            "saved {} ({} bytes, {}) to {}",
            base,
            content.len(),
            content_type,
            path.display()
        );
        Ok(path.display().to_string())
    }
}

/// A download kept in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    /// File name
    pub name: String,
    /// Content bytes
    pub content: Vec<u8>,
    /// Content type
    pub content_type: String,
}

/// Keeps downloads in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<SavedDownload>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far
    #[must_use]
    pub fn saved(&self) -> Vec<SavedDownload> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn save(&self, name: &str, content: &[u8], content_type: &str) -> Result<String, SinkError> {
        let base = sanitize_name(name)?.to_string();
        if let Ok(mut saved) = self.saved.lock() {
            saved.push(SavedDownload {
                name: base.clone(),
                content: content.to_vec(),
                content_type: content_type.to_string(),
            });
        }
        Ok(format!("memory:{base}"))
    }
}
