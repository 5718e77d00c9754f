//! # termferry files
//!
//! File side of termferry transfers.
//!
//! This crate provides:
//! - SHA-256 content checksums (lowercase hex) and verification
//! - File selection metadata with a declared content type
//! - Whole-file text reads that report byte progress
//! - Download sinks that materialize verified content

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hasher;
pub mod reader;
pub mod sink;

use std::path::{Path, PathBuf};

pub use hasher::{checksum_hex, verify_checksum};
pub use reader::read_text_with_progress;
pub use sink::{DirectorySink, DownloadSink, MemorySink, SavedDownload, SinkError};

/// Read buffer size for local file reads (64 KiB)
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Content type reported for files whose extension is not recognised
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// A local file chosen for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    /// File name sent to the server
    pub name: String,
    /// Declared size in bytes
    pub size: u64,
    /// Declared content type
    pub content_type: String,
    /// Where the content is read from
    pub path: PathBuf,
}

impl FileSelection {
    /// Build a selection from file metadata, guessing the content type
    /// from the extension.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file metadata cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            name,
            size: metadata.len(),
            path: path.to_path_buf(),
        })
    }

    /// Override the declared content type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Guess a content type from a file extension
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("txt" | "log" | "cfg" | "conf" | "text") => "text/plain",
        Some("json") => "application/json",
        Some("py") => "text/x-python",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => UNKNOWN_CONTENT_TYPE,
    }
}
