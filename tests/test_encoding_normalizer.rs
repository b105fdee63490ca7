//! Integration tests for in-place UTF-8 normalization
//!
//! Covers:
//! - BOM-marked UTF-16 files converted and the BOM dropped
//! - Heuristically detected legacy encodings converted
//! - UTF-8, ASCII and empty files left byte-identical
//! - Strict decoding: invalid input leaves the file untouched
//! - The conversion event emitted through `tracing`
//! - File permissions kept across the atomic replacement

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clyze::{EncodingNormalizer, Normalization, NormalizeError, UnchangedReason};
use tempfile::TempDir;

const JAPANESE: &str = "吾輩は猫である。名前はまだ無い。どこで生れたかとんと見当がつかぬ。\
    何でも薄暗いじめじめした所でニャーニャー泣いていた事だけは記憶している。\n";

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn utf16be_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// Shared buffer usable as a `tracing_subscriber` writer.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}

#[test]
fn test_utf16be_converted_and_logged() {
    let dir = TempDir::new().unwrap();
    let text = "Ελληνικά και English\n";
    let original = utf16be_with_bom(text);
    let path = write_file(&dir, "Greek.java", &original);

    let (outcome, logs) =
        with_captured_logs(|| EncodingNormalizer::new().ensure_canonical(&path));

    assert_eq!(
        outcome.unwrap(),
        Normalization::Converted {
            from: "UTF-16BE",
            original_len: original.len(),
            converted_len: text.len(),
        }
    );
    assert_eq!(std::fs::read(&path).unwrap(), text.as_bytes());
    let expected = format!(
        "Converted UTF-16BE to UTF-8: {}, {} vs. {} bytes",
        path.display(),
        original.len(),
        text.len()
    );
    assert!(logs.contains(&expected), "missing log line in:\n{logs}");
}

#[test]
fn test_shift_jis_converted_once() {
    let dir = TempDir::new().unwrap();
    let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(JAPANESE);
    let path = write_file(&dir, "neko.txt", &encoded);
    let normalizer = EncodingNormalizer::new();

    assert!(normalizer.ensure_canonical(&path).unwrap().was_converted());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), JAPANESE);

    let again = normalizer.ensure_canonical(&path).unwrap();
    assert_eq!(again, Normalization::Unchanged(UnchangedReason::AlreadyCanonical));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), JAPANESE);
}

#[test]
fn test_already_fine_files_are_not_rewritten() {
    let dir = TempDir::new().unwrap();
    let cases: [(&str, &[u8], UnchangedReason); 3] = [
        ("utf8.txt", JAPANESE.as_bytes(), UnchangedReason::AlreadyCanonical),
        ("ascii.txt", b"int x = 1;\n", UnchangedReason::Undetermined),
        ("empty.txt", b"", UnchangedReason::Empty),
    ];

    for (name, bytes, reason) in cases {
        let path = write_file(&dir, name, bytes);
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        let outcome = EncodingNormalizer::new().ensure_canonical(&path).unwrap();

        assert_eq!(outcome, Normalization::Unchanged(reason), "{name}");
        assert_eq!(std::fs::read(&path).unwrap(), bytes, "{name}");
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }
}

#[test]
fn test_invalid_input_left_byte_identical() {
    let dir = TempDir::new().unwrap();
    // UTF-16BE BOM followed by a lone low surrogate.
    let original = [0xFE, 0xFF, 0x00, 0x41, 0xDC, 0x00];
    let path = write_file(&dir, "broken.txt", &original);

    let err = EncodingNormalizer::new().ensure_canonical(&path).unwrap_err();

    assert!(matches!(err, NormalizeError::Transcode { .. }));
    assert_eq!(err.path(), path.as_path());
    assert!(err.to_string().starts_with("Cannot convert encoding UTF-16BE to UTF-8"));
    assert_eq!(std::fs::read(&path).unwrap(), original);
    // No temp file left behind.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_chunk_size_does_not_change_result() {
    let dir = TempDir::new().unwrap();
    let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(JAPANESE);

    for chunk_size in [1, 7, 64, 4096] {
        let path = write_file(&dir, &format!("sjis-{chunk_size}.txt"), &encoded);
        let detected = EncodingNormalizer::new()
            .with_chunk_size(chunk_size)
            .detect_encoding(&path)
            .unwrap();
        assert_eq!(detected, Some(encoding_rs::SHIFT_JIS), "chunk size {chunk_size}");
    }
}

#[cfg(unix)]
#[test]
fn test_permissions_preserved() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "script.txt", &utf16be_with_bom("#!/bin/sh\n"));
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o750)).unwrap();

    EncodingNormalizer::new().ensure_canonical(&path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o750);
}

#[test]
fn test_missing_file() {
    let err = EncodingNormalizer::new()
        .ensure_canonical(Path::new("/nonexistent/clyze/file.txt"))
        .unwrap_err();
    assert!(matches!(err, NormalizeError::Read { .. }));
}

#[test]
fn test_sampled_detection_never_rewrites_utf8() {
    let dir = TempDir::new().unwrap();
    let text = "Élève à l'école. Ça déjà été noté, n'est-ce pas ? ".repeat(640);
    let path = write_file(&dir, "lecon.txt", text.as_bytes());

    // Every limit in a window of a few bytes, so some cut inside a character.
    for limit in 10_000..10_004u64 {
        let outcome = EncodingNormalizer::new()
            .with_sample_limit(Some(limit))
            .with_diagnostics(clyze::Echo::silent())
            .ensure_canonical(&path)
            .unwrap();

        assert_eq!(
            outcome,
            Normalization::Unchanged(UnchangedReason::AlreadyCanonical),
            "sample limit {limit}"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }
}
