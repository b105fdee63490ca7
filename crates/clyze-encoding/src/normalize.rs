use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clyze_utils::{Echo, replace_file_atomic};
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, error, info};

use crate::detect::{Detector, trim_incomplete_utf8};
use crate::error::NormalizeError;

/// Default size of each read while detecting.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Why a file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnchangedReason {
    /// The detector could not settle on an encoding
    Undetermined,
    /// The file is already UTF-8
    AlreadyCanonical,
    /// The file has no content
    Empty,
}

/// Outcome of [`EncodingNormalizer::ensure_canonical`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalization {
    Unchanged(UnchangedReason),
    Converted {
        /// Name of the encoding the file was in
        from: &'static str,
        original_len: usize,
        converted_len: usize,
    },
}

impl Normalization {
    #[must_use]
    pub const fn was_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// Rewrites text files to UTF-8 in place.
///
/// Detection reads the file in `chunk_size` pieces and stops at end of file,
/// at a byte-order mark, or after `sample_limit` bytes if one is set.
/// Conversion is strict: a file that does not decode cleanly in the detected
/// encoding is left as it was. The replacement is atomic, so a crash never
/// leaves a half-written file.
///
/// Each conversion, and each file left alone because it would not convert,
/// is reported on the diagnostic echo (stderr unless changed) as well as
/// through `tracing`.
///
/// Not safe to run concurrently on the same path.
#[derive(Debug, Clone)]
pub struct EncodingNormalizer {
    chunk_size: usize,
    sample_limit: Option<u64>,
    diagnostics: Echo,
}

impl Default for EncodingNormalizer {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            sample_limit: None,
            diagnostics: Echo::stderr(),
        }
    }
}

impl EncodingNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read size while detecting. Zero is treated as 1.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Stop detecting after this many bytes.
    #[must_use]
    pub const fn with_sample_limit(mut self, limit: Option<u64>) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Where conversion messages go.
    #[must_use]
    pub fn with_diagnostics(mut self, echo: Echo) -> Self {
        self.diagnostics = echo;
        self
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub const fn sample_limit(&self) -> Option<u64> {
        self.sample_limit
    }

    /// Detect the encoding of the file at `path`. `None` means undetermined.
    ///
    /// # Errors
    ///
    /// [`NormalizeError::Read`] if the file cannot be opened or read.
    pub fn detect_encoding(&self, path: &Path) -> Result<Option<&'static Encoding>, NormalizeError> {
        let read_failed = |source: io::Error| NormalizeError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(read_failed)?;
        let mut buf = vec![0u8; self.chunk_size];
        let mut detector = Detector::new();
        let mut read_total: u64 = 0;

        loop {
            let want = match self.sample_limit {
                Some(limit) if read_total >= limit => break,
                Some(limit) => usize::try_from(limit - read_total).map_or(buf.len(), |left| left.min(buf.len())),
                None => buf.len(),
            };
            let n = match file.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_failed(e)),
            };
            read_total += n as u64;

            // A sample cut inside a multi-byte sequence would read as invalid UTF-8.
            let sampled_out = self.sample_limit.is_some_and(|limit| read_total >= limit);
            let chunk = if sampled_out {
                trim_incomplete_utf8(&buf[..n])
            } else {
                &buf[..n]
            };
            if detector.feed(chunk) || sampled_out {
                break;
            }
        }

        let scanned = detector.scanned();
        let detected = detector.finish();
        debug!(
            path = %path.display(),
            scanned,
            encoding = detected.map(Encoding::name),
            "Encoding detection finished"
        );
        Ok(detected)
    }

    /// Make sure the file at `path` is UTF-8, converting it if needed.
    ///
    /// A file whose encoding cannot be determined is assumed to be fine.
    /// Running this twice is the same as running it once.
    ///
    /// # Errors
    ///
    /// - [`NormalizeError::Read`] if the file cannot be read
    /// - [`NormalizeError::Transcode`] if its bytes are invalid in the
    ///   detected encoding (the file is untouched)
    /// - [`NormalizeError::Write`] if the converted file cannot be committed
    pub fn ensure_canonical(&self, path: &Path) -> Result<Normalization, NormalizeError> {
        let Some(encoding) = self.detect_encoding(path)? else {
            let reason = if is_empty(path)? {
                UnchangedReason::Empty
            } else {
                UnchangedReason::Undetermined
            };
            return Ok(Normalization::Unchanged(reason));
        };
        if encoding == UTF_8 {
            return Ok(Normalization::Unchanged(UnchangedReason::AlreadyCanonical));
        }

        let original = std::fs::read(path).map_err(|source| NormalizeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // A partial sample can mislead the detector; the whole file cannot.
        if !original.is_ascii() && std::str::from_utf8(&original).is_ok() {
            debug!(
                path = %path.display(),
                guess = encoding.name(),
                "Guess overruled, file is valid UTF-8"
            );
            return Ok(Normalization::Unchanged(UnchangedReason::AlreadyCanonical));
        }
        let converted = transcode(&original, encoding).ok_or_else(|| {
            let err = NormalizeError::Transcode {
                path: path.to_path_buf(),
                encoding: encoding.name(),
            };
            error!(error = %err, "Conversion aborted, file left unchanged");
            self.diagnostics.message(&err.to_string());
            err
        })?;

        replace_file_atomic(path, converted.as_bytes()).map_err(|source| {
            let err = NormalizeError::Write {
                path: path.to_path_buf(),
                source,
            };
            error!(error = %err, "Could not commit converted file");
            self.diagnostics.message(&err.to_string());
            err
        })?;

        let message = format!(
            "Converted {} to UTF-8: {}, {} vs. {} bytes",
            encoding.name(),
            path.display(),
            original.len(),
            converted.len()
        );
        info!("{message}");
        self.diagnostics.message(&message);

        Ok(Normalization::Converted {
            from: encoding.name(),
            original_len: original.len(),
            converted_len: converted.len(),
        })
    }

    /// [`ensure_canonical`](Self::ensure_canonical) over several files,
    /// stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first [`NormalizeError`] encountered.
    pub fn ensure_all_canonical<I, P>(&self, paths: I) -> Result<Vec<(PathBuf, Normalization)>, NormalizeError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                self.ensure_canonical(p).map(|n| (p.to_path_buf(), n))
            })
            .collect()
    }
}

/// Strict decode (BOM stripped) of `bytes` as `encoding`.
fn transcode(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(std::borrow::Cow::into_owned)
}

fn is_empty(path: &Path) -> Result<bool, NormalizeError> {
    std::fs::metadata(path)
        .map(|m| m.len() == 0)
        .map_err(|source| NormalizeError::Read {
            path: path.to_path_buf(),
            source,
        })
}
