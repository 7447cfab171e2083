//! Video-record query operations.

use chrono::Utc;
use kandan_common::{Error, Result};
use rusqlite::Connection;

use crate::models::VideoRecord;

const COLS: &str = "hash, file_name, file_path, file_size, duration_secs, last_watched";

/// Insert a batch of videos in one transaction.
///
/// Duplicate hashes are silently ignored (`INSERT OR IGNORE`), so
/// re-indexing the same files is always safe. Returns the number of rows
/// actually inserted.
pub fn insert_videos_if_absent(conn: &mut Connection, videos: &[VideoRecord]) -> Result<usize> {
    let tx = conn
        .transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    let mut inserted = 0;
    {
        let mut stmt = tx
            .prepare(
                "INSERT OR IGNORE INTO videos
                     (hash, file_name, file_path, file_size, duration_secs, last_watched)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(|e| Error::database(e.to_string()))?;
        for video in videos {
            inserted += stmt
                .execute(rusqlite::params![
                    video.hash,
                    video.file_name,
                    video.file_path,
                    video.file_size,
                    video.duration_secs,
                    video.last_watched,
                ])
                .map_err(|e| Error::database(e.to_string()))?;
        }
    }
    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(inserted)
}

/// Get a video by its content hash.
pub fn get_video(conn: &Connection, hash: &str) -> Result<Option<VideoRecord>> {
    let q = format!("SELECT {COLS} FROM videos WHERE hash = ?1");
    let result = conn.query_row(&q, [hash], VideoRecord::from_row);
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all indexed videos.
pub fn list_videos(conn: &Connection) -> Result<Vec<VideoRecord>> {
    let q = format!("SELECT {COLS} FROM videos ORDER BY file_name ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], VideoRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List videos that do not yet have a binding.
pub fn list_unbound_videos(conn: &Connection) -> Result<Vec<VideoRecord>> {
    let q = format!(
        "SELECT {COLS} FROM videos
         WHERE hash NOT IN (SELECT hash FROM bindings)
         ORDER BY file_name ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], VideoRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List all indexed file paths (used for batch existence checks during a
/// scan).
pub fn list_video_paths(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT file_path FROM videos")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Delete a video by hash. The binding row, if any, cascades.
pub fn delete_video(conn: &Connection, hash: &str) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM videos WHERE hash = ?1", [hash])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Record the current time as the video's last watch timestamp.
pub fn set_last_watched(conn: &Connection, hash: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE videos SET last_watched = ?1 WHERE hash = ?2",
        rusqlite::params![now, hash],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    fn video(hash: &str, path: &str) -> VideoRecord {
        VideoRecord {
            hash: hash.to_string(),
            file_name: path.rsplit('/').next().unwrap().to_string(),
            file_path: path.to_string(),
            file_size: 1024,
            duration_secs: 1440,
            last_watched: None,
        }
    }

    #[test]
    fn insert_is_idempotent() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();

        let v = video("AAAA", "/anime/ep01.mkv");
        assert_eq!(insert_videos_if_absent(&mut conn, &[v.clone()]).unwrap(), 1);
        assert_eq!(insert_videos_if_absent(&mut conn, &[v]).unwrap(), 0);
        assert_eq!(list_videos(&conn).unwrap().len(), 1);
    }

    #[test]
    fn unbound_excludes_bound() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();

        insert_videos_if_absent(
            &mut conn,
            &[video("AAAA", "/anime/ep01.mkv"), video("BBBB", "/anime/ep02.mkv")],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO bindings VALUES ('AAAA', 1, 10, 'Show', 'Ep 1', 'tvseries', 'TV', 0)",
            [],
        )
        .unwrap();

        let unbound = list_unbound_videos(&conn).unwrap();
        assert_eq!(unbound.len(), 1);
        assert_eq!(unbound[0].hash, "BBBB");
    }

    #[test]
    fn delete_cascades_to_binding() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();

        insert_videos_if_absent(&mut conn, &[video("AAAA", "/anime/ep01.mkv")]).unwrap();
        conn.execute(
            "INSERT INTO bindings VALUES ('AAAA', 1, 10, 'Show', 'Ep 1', 'tvseries', 'TV', 0)",
            [],
        )
        .unwrap();

        assert!(delete_video(&conn, "AAAA").unwrap());
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM bindings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn last_watched_roundtrip() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();

        insert_videos_if_absent(&mut conn, &[video("AAAA", "/anime/ep01.mkv")]).unwrap();
        set_last_watched(&conn, "AAAA").unwrap();

        let v = get_video(&conn, "AAAA").unwrap().unwrap();
        assert!(v.last_watched.is_some());
    }

    #[test]
    fn paths_listed_for_scan() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();

        insert_videos_if_absent(&mut conn, &[video("AAAA", "/anime/ep01.mkv")]).unwrap();
        let paths = list_video_paths(&conn).unwrap();
        assert_eq!(paths, vec!["/anime/ep01.mkv".to_string()]);
    }
}
