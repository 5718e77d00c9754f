//! Whole-file text reads with byte progress.

use crate::READ_CHUNK_SIZE;
use std::path::Path;
use tokio::io::AsyncReadExt;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Read a file as UTF-8 text, reporting `(loaded, total)` after every read.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD and a leading byte
/// order mark is dropped, so the result is always valid text.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub async fn read_text_with_progress<F>(path: impl AsRef<Path>, mut on_progress: F) -> std::io::Result<String>
where
    F: FnMut(u64, u64),
{
    let path = path.as_ref();
    let mut file = tokio::fs::File::open(path).await?;
    let total = file.metadata().await?.len();

    let mut data = Vec::with_capacity(total as usize);
    let mut buffer = vec![0u8; READ_CHUNK_SIZE];
    on_progress(0, total);

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
        on_progress(data.len() as u64, total.max(data.len() as u64));
    }

    tracing::debug!("read {} bytes from {}", data.len(), path.display());

    let body = data.strip_prefix(UTF8_BOM).unwrap_or(&data);
    Ok(String::from_utf8_lossy(body).into_owned())
}
