//! Atomic file replacement
//!
//! Content is written to a temporary file in the target's directory, fsynced,
//! and renamed over the target. Readers observe either the old bytes or the
//! new bytes, never a partially written file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Result of an atomic replace operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Number of bytes written to the target
    pub bytes_written: usize,
    /// Number of rename retries that occurred (Windows only)
    pub rename_retry_count: u32,
    /// Whether the permissions of a previous file were carried over
    pub preserved_permissions: bool,
}

/// Atomically replace `path` with `content`.
///
/// The bytes are written verbatim. When `path` already exists its permissions
/// are copied onto the replacement before the rename.
pub fn replace_file_atomic(path: &Path, content: &[u8]) -> io::Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(content)?;
    temp_file.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        temp_file.as_file().set_permissions(metadata.permissions())?;
        result.preserved_permissions = true;
    }

    result.rename_retry_count = atomic_rename(temp_file, path)?;
    result.bytes_written = content.len();
    Ok(result)
}

/// Rename with bounded exponential backoff (≤ 250ms total).
///
/// Virus scanners and indexers briefly hold files open on Windows.
#[cfg(target_os = "windows")]
fn atomic_rename(mut temp_file: NamedTempFile, target: &Path) -> io::Result<u32> {
    use std::io::ErrorKind;

    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;
    const MAX_TOTAL_DELAY_MS: u64 = 250;

    let mut retry_count = 0;
    let mut total_delay_ms = 0;

    loop {
        match temp_file.persist(target) {
            Ok(_) => return Ok(retry_count),
            Err(persist_error) => {
                let retryable = matches!(
                    persist_error.error.kind(),
                    ErrorKind::PermissionDenied | ErrorKind::Other
                );
                if retry_count >= MAX_RETRIES || !retryable {
                    return Err(persist_error.error);
                }

                let delay_ms = INITIAL_DELAY_MS * 2_u64.pow(retry_count);
                if total_delay_ms + delay_ms > MAX_TOTAL_DELAY_MS {
                    let remaining = MAX_TOTAL_DELAY_MS.saturating_sub(total_delay_ms);
                    if remaining > 0 {
                        thread::sleep(Duration::from_millis(remaining));
                    }
                    return persist_error
                        .file
                        .persist(target)
                        .map(|_| retry_count + 1)
                        .map_err(|e| e.error);
                }

                thread::sleep(Duration::from_millis(delay_ms));
                total_delay_ms += delay_ms;
                retry_count += 1;
                temp_file = persist_error.file;
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn atomic_rename(temp_file: NamedTempFile, target: &Path) -> io::Result<u32> {
    temp_file.persist(target).map(|_| 0).map_err(|e| e.error)
}
