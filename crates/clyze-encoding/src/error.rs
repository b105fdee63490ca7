use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from [`EncodingNormalizer`](crate::EncodingNormalizer).
///
/// The file on disk is never partially written: on any error it still has
/// its original content.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot convert encoding {encoding} to UTF-8: {}", .path.display())]
    Transcode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NormalizeError {
    /// Path of the file being normalized.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Transcode { path, .. } | Self::Write { path, .. } => path,
        }
    }
}
