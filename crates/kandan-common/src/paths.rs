//! Path utilities for detecting video files by extension.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv", "rmvb",
];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use kandan_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("episode.mkv")));
/// assert!(is_video_file(Path::new("/anime/op.MP4")));
/// assert!(!is_video_file(Path::new("subtitle.ass")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_video_extensions() {
        assert!(is_video_file(Path::new("a.mkv")));
        assert!(is_video_file(Path::new("b.MKV")));
        assert!(is_video_file(Path::new("/dir/c.mp4")));
        assert!(!is_video_file(Path::new("d.srt")));
        assert!(!is_video_file(Path::new("noext")));
    }
}
