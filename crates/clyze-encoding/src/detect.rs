//! Incremental encoding detection
//!
//! A byte-order mark decides the encoding outright. Without one, bytes go
//! through `chardetng`. Plain ASCII input is undetermined (every candidate
//! decodes it the same), and so is a guess `chardetng` is not confident in,
//! unless the input is valid UTF-8.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, ISO_2022_JP, UTF_8};
use tracing::debug;

/// Longest byte-order mark (UTF-8).
const MAX_BOM_LEN: usize = 3;

const MAX_UTF8_LEN: usize = 4;

/// Streaming detector fed chunk by chunk.
pub struct Detector {
    inner: EncodingDetector,
    head: Vec<u8>,
    bom: Option<&'static Encoding>,
    bom_checked: bool,
    non_ascii: bool,
    scanned: u64,
}

impl Detector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: EncodingDetector::new(),
            head: Vec::with_capacity(MAX_BOM_LEN),
            bom: None,
            bom_checked: false,
            non_ascii: false,
            scanned: 0,
        }
    }

    /// Feed the next chunk. Returns `true` once the encoding is settled and
    /// further input would not change the answer.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        if self.bom.is_some() {
            return true;
        }
        self.scanned += chunk.len() as u64;

        if !self.bom_checked {
            let take = (MAX_BOM_LEN - self.head.len()).min(chunk.len());
            self.head.extend_from_slice(&chunk[..take]);
            if let Some((encoding, _)) = Encoding::for_bom(&self.head) {
                debug!(encoding = encoding.name(), "Byte-order mark found");
                self.bom = Some(encoding);
                return true;
            }
            self.bom_checked = self.head.len() >= MAX_BOM_LEN;
        }

        if self.inner.feed(chunk, false) {
            self.non_ascii = true;
        }
        false
    }

    /// Bytes fed so far.
    #[must_use]
    pub const fn scanned(&self) -> u64 {
        self.scanned
    }

    /// Finalize detection. `None` means undetermined.
    #[must_use]
    pub fn finish(mut self) -> Option<&'static Encoding> {
        if let Some(encoding) = self.bom {
            return Some(encoding);
        }
        if self.scanned == 0 {
            return None;
        }

        self.inner.feed(&[], true);
        let (guess, confident) = self.inner.guess_assess(None, true);

        // ISO-2022-JP is 7-bit; everything else agrees with ASCII on ASCII input.
        if !self.non_ascii && guess != ISO_2022_JP {
            return None;
        }
        // Input that validates as UTF-8 needs no confidence score.
        if !confident && guess != UTF_8 {
            debug!(guess = guess.name(), scanned = self.scanned, "Low-confidence guess ignored");
            return None;
        }
        Some(guess)
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("bom", &self.bom.map(Encoding::name))
            .field("non_ascii", &self.non_ascii)
            .field("scanned", &self.scanned)
            .finish_non_exhaustive()
    }
}

/// Detect the encoding of an in-memory buffer. `None` means undetermined.
#[must_use]
pub fn detect_bytes(bytes: &[u8]) -> Option<&'static Encoding> {
    let mut detector = Detector::new();
    detector.feed(bytes);
    detector.finish()
}

/// Drop a multi-byte UTF-8 sequence left incomplete at the end of `bytes`.
///
/// Bytes that are not a UTF-8 lead byte are kept as they are.
pub(crate) fn trim_incomplete_utf8(bytes: &[u8]) -> &[u8] {
    let tail_start = bytes.len().saturating_sub(MAX_UTF8_LEN - 1);
    for i in (tail_start..bytes.len()).rev() {
        let needed = match bytes[i] {
            0x80..=0xBF => continue,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => 1,
        };
        return if bytes.len() - i < needed {
            &bytes[..i]
        } else {
            bytes
        };
    }
    bytes
}
