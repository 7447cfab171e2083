//! Content fingerprinting for local video files.
//!
//! A fingerprint is the MD5 of at most the first 16 MiB of the file,
//! hex-encoded upper-case, plus the container duration and basic file
//! facts. Hashing only a prefix trades collision resistance for speed on
//! large media files and reproduces the metadata service's own hashing
//! convention, so it must not be changed.

use std::io::Read;
use std::path::Path;
use std::process::Command;

use md5::{Digest, Md5};
use serde::Deserialize;

/// Number of leading bytes that participate in the content hash.
pub const HASH_PREFIX_BYTES: u64 = 16 * 1024 * 1024;

/// Duration value used when the file could not be probed.
pub const UNKNOWN_DURATION: i64 = -1;

/// Identity facts for one local video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// MD5 of the first [`HASH_PREFIX_BYTES`] bytes, hex upper-case.
    /// Empty when the file vanished mid-read.
    pub hash: String,
    /// File name without extension, as sent to the match endpoint.
    pub file_name: String,
    pub file_size: i64,
    /// Container duration truncated to whole seconds;
    /// [`UNKNOWN_DURATION`] when unavailable.
    pub duration_secs: i64,
}

impl Fingerprint {
    /// True when any part of the fingerprint is a sentinel value.
    /// Callers must skip such results and not persist them.
    pub fn is_unknown(&self) -> bool {
        self.hash.is_empty() || self.duration_secs == UNKNOWN_DURATION || self.file_size < 0
    }

    fn unknown(path: &Path) -> Self {
        Self {
            hash: String::new(),
            file_name: file_stem(path),
            file_size: -1,
            duration_secs: UNKNOWN_DURATION,
        }
    }
}

/// Fingerprint a file that is expected to exist.
///
/// A file vanishing mid-read (or any other I/O failure) yields the
/// sentinel fingerprint rather than an error; the same bytes always
/// yield the same hash.
pub fn fingerprint(path: &Path) -> Fingerprint {
    let hash = match hash_file(path) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Failed to hash file");
            return Fingerprint::unknown(path);
        }
    };

    let file_size = match std::fs::metadata(path) {
        Ok(m) => m.len() as i64,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "File vanished after hashing");
            return Fingerprint::unknown(path);
        }
    };

    let duration_secs = probe_duration_secs(path).unwrap_or(UNKNOWN_DURATION);

    Fingerprint {
        hash,
        file_name: file_stem(path),
        file_size,
        duration_secs,
    }
}

/// MD5 over at most the first 16 MiB of the file, hex upper-case.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    let mut reader = file.take(HASH_PREFIX_BYTES);
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()).to_uppercase())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Read the container duration with ffprobe, truncated to whole seconds.
pub fn probe_duration_secs(path: &Path) -> Option<i64> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| {
            tracing::warn!(file = %path.display(), error = %e, "Failed to run ffprobe");
        })
        .ok()?;

    if !output.status.success() {
        tracing::warn!(
            file = %path.display(),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "ffprobe returned an error"
        );
        return None;
    }

    parse_duration_secs(&output.stdout)
}

fn parse_duration_secs(json: &[u8]) -> Option<i64> {
    let parsed: FfprobeOutput = serde_json::from_slice(json).ok()?;
    let duration: f64 = parsed.format.duration?.parse().ok()?;
    Some(duration.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn hash_is_deterministic_and_uppercase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ep01.mkv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"fake video bytes")
            .unwrap();

        let first = hash_file(&path).unwrap();
        let second = hash_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert_eq!(first, first.to_uppercase());
    }

    #[test]
    fn hash_matches_md5_of_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ep01.mkv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello")
            .unwrap();

        // Files smaller than the prefix hash their full content.
        let mut hasher = Md5::new();
        hasher.update(b"hello");
        let expected = hex::encode(hasher.finalize()).to_uppercase();
        assert_eq!(hash_file(&path).unwrap(), expected);
    }

    #[test]
    fn vanished_file_yields_sentinel() {
        let fp = fingerprint(Path::new("/nonexistent/gone.mkv"));
        assert!(fp.is_unknown());
        assert!(fp.hash.is_empty());
        assert_eq!(fp.duration_secs, UNKNOWN_DURATION);
        assert_eq!(fp.file_name, "gone");
    }

    #[test]
    fn duration_parse_truncates() {
        let json = br#"{"format": {"duration": "1423.966000"}}"#;
        assert_eq!(parse_duration_secs(json), Some(1423));

        let json = br#"{"format": {}}"#;
        assert_eq!(parse_duration_secs(json), None);

        assert_eq!(parse_duration_secs(b"not json"), None);
    }
}
