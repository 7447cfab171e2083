//! Binding-record query operations.

use kandan_common::{Error, Result};
use rusqlite::Connection;

use crate::models::{BindingRecord, VideoRecord};

const COLS: &str = "hash, anime_id, episode_id, anime_title, episode_title,
    source_type, source_type_desc, shift_secs";

/// Insert a batch of bindings in one transaction.
///
/// Duplicate hashes are silently ignored and never overwritten
/// (`INSERT OR IGNORE`), so re-running an interrupted match batch is
/// always safe. Returns the number of rows actually inserted.
///
/// Every binding must reference an existing video row; the foreign key
/// rejects orphans.
pub fn insert_bindings_if_absent(conn: &mut Connection, bindings: &[BindingRecord]) -> Result<usize> {
    let tx = conn
        .transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    let mut inserted = 0;
    {
        let mut stmt = tx
            .prepare(
                "INSERT OR IGNORE INTO bindings
                     (hash, anime_id, episode_id, anime_title, episode_title,
                      source_type, source_type_desc, shift_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(|e| Error::database(e.to_string()))?;
        for binding in bindings {
            inserted += stmt
                .execute(rusqlite::params![
                    binding.hash,
                    binding.anime_id,
                    binding.episode_id,
                    binding.anime_title,
                    binding.episode_title,
                    binding.source_type,
                    binding.source_type_desc,
                    binding.shift_secs,
                ])
                .map_err(|e| Error::database(e.to_string()))?;
        }
    }
    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(inserted)
}

/// Get the binding for a video by its content hash.
pub fn get_binding(conn: &Connection, hash: &str) -> Result<Option<BindingRecord>> {
    let q = format!("SELECT {COLS} FROM bindings WHERE hash = ?1");
    let result = conn.query_row(&q, [hash], BindingRecord::from_row);
    match result {
        Ok(b) => Ok(Some(b)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all bindings.
pub fn list_bindings(conn: &Connection) -> Result<Vec<BindingRecord>> {
    let q = format!("SELECT {COLS} FROM bindings ORDER BY anime_id, episode_id ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], BindingRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List bindings belonging to one anime, episode order.
pub fn list_bindings_for_anime(conn: &Connection, anime_id: i64) -> Result<Vec<BindingRecord>> {
    let q = format!("SELECT {COLS} FROM bindings WHERE anime_id = ?1 ORDER BY episode_id ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([anime_id], BindingRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Delete a binding by video hash.
///
/// Re-binding a video to a different episode requires this explicit
/// delete first; inserts never overwrite.
pub fn delete_binding(conn: &Connection, hash: &str) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM bindings WHERE hash = ?1", [hash])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// List every bound video joined with its binding, for the library view.
pub fn list_bound_videos(conn: &Connection) -> Result<Vec<(VideoRecord, BindingRecord)>> {
    let mut stmt = conn
        .prepare(
            "SELECT v.hash, v.file_name, v.file_path, v.file_size, v.duration_secs, v.last_watched,
                    b.hash, b.anime_id, b.episode_id, b.anime_title, b.episode_title,
                    b.source_type, b.source_type_desc, b.shift_secs
             FROM videos v JOIN bindings b ON v.hash = b.hash
             ORDER BY b.anime_title, b.episode_id ASC",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            let video = VideoRecord {
                hash: row.get(0)?,
                file_name: row.get(1)?,
                file_path: row.get(2)?,
                file_size: row.get(3)?,
                duration_secs: row.get(4)?,
                last_watched: row.get(5)?,
            };
            let binding = BindingRecord {
                hash: row.get(6)?,
                anime_id: row.get(7)?,
                episode_id: row.get(8)?,
                anime_title: row.get(9)?,
                episode_title: row.get(10)?,
                source_type: row.get(11)?,
                source_type_desc: row.get(12)?,
                shift_secs: row.get(13)?,
            };
            Ok((video, binding))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
