//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use serde::{Deserialize, Serialize};

/// An indexed local video file.
///
/// The `hash` is content-derived (MD5 of the first 16 MiB, hex
/// upper-case) and therefore stable across renames. Rows are immutable
/// except `last_watched`, and are deleted when the underlying file is
/// confirmed missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub hash: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub duration_secs: i64,
    /// RFC 3339 timestamp of the most recent playback, if any.
    pub last_watched: Option<String>,
}

impl VideoRecord {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            hash: row.get(0)?,
            file_name: row.get(1)?,
            file_path: row.get(2)?,
            file_size: row.get(3)?,
            duration_secs: row.get(4)?,
            last_watched: row.get(5)?,
        })
    }
}

/// The episode binding for one video.
///
/// At most one binding exists per video (`hash` is the primary key and
/// an FK into `videos`). Bindings are only created as the output of a
/// successful match, automatic or manual, and are never updated in
/// place; re-binding requires explicit deletion first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub hash: String,
    pub anime_id: i64,
    pub episode_id: i64,
    pub anime_title: String,
    pub episode_title: String,
    pub source_type: String,
    pub source_type_desc: String,
    /// Playback time shift in seconds applied to the danmu overlay.
    pub shift_secs: i64,
}

impl BindingRecord {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            hash: row.get(0)?,
            anime_id: row.get(1)?,
            episode_id: row.get(2)?,
            anime_title: row.get(3)?,
            episode_title: row.get(4)?,
            source_type: row.get(5)?,
            source_type_desc: row.get(6)?,
            shift_secs: row.get(7)?,
        })
    }

    /// A human-readable label, used for progress reporting.
    pub fn label(&self) -> String {
        format!("{} - {}", self.anime_title, self.episode_title)
    }
}
