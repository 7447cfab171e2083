//! Library scanning: discover video files, fingerprint new ones, and
//! prune rows whose files vanished.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use kandan_common::paths::is_video_file;
use kandan_common::{Error, Result};
use kandan_db::models::VideoRecord;
use kandan_db::pool::DbPool;
use kandan_db::queries;
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::workers::{run_bounded, ProgressHook};

/// Summary of one library scan.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanReport {
    /// Video files seen under the configured paths.
    pub discovered: usize,
    /// New rows inserted this scan.
    pub added: usize,
    /// Files that could not be fingerprinted; retried on the next scan.
    pub skipped: usize,
    /// Rows removed because their file no longer exists.
    pub pruned: usize,
}

/// Walk the configured library paths and bring the database in line
/// with what is on disk.
///
/// Already-indexed paths are not re-hashed. Fingerprinting is CPU and
/// disk bound, so it fans out over blocking tasks gated by
/// `scan_concurrency`.
pub async fn scan_library(
    pool: &DbPool,
    config: &LibraryConfig,
    progress: Option<ProgressHook>,
) -> Result<ScanReport> {
    let discovered = discover_videos(&config.paths);
    let known: HashSet<String> = {
        let conn = pool.get().map_err(|e| Error::database(e.to_string()))?;
        queries::videos::list_video_paths(&conn)?.into_iter().collect()
    };

    let new_paths: Vec<PathBuf> = discovered
        .iter()
        .filter(|p| !known.contains(&p.to_string_lossy().to_string()))
        .cloned()
        .collect();

    let mut report = ScanReport {
        discovered: discovered.len(),
        ..Default::default()
    };
    tracing::info!(
        discovered = report.discovered,
        new = new_paths.len(),
        "Library scan started"
    );

    let fingerprints = run_bounded(
        new_paths,
        config.scan_concurrency,
        progress,
        |p| p.display().to_string(),
        |path| async move {
            let fp = tokio::task::spawn_blocking({
                let path = path.clone();
                move || fingerprint(&path)
            })
            .await
            .expect("fingerprint task panicked");
            (path, fp)
        },
    )
    .await;

    let mut rows = Vec::new();
    for (path, fp) in fingerprints {
        if fp.is_unknown() {
            report.skipped += 1;
            continue;
        }
        rows.push(video_row(&path, fp));
    }

    if !rows.is_empty() {
        let mut conn = pool.get().map_err(|e| Error::database(e.to_string()))?;
        report.added = queries::videos::insert_videos_if_absent(&mut conn, &rows)?;
    }

    report.pruned = prune_vanished(pool)?;

    tracing::info!(
        added = report.added,
        skipped = report.skipped,
        pruned = report.pruned,
        "Library scan finished"
    );
    Ok(report)
}

/// Collect every video file under the given roots. Unreadable entries
/// are logged and skipped.
fn discover_videos(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).follow_links(true) {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_video_file(entry.path()) => {
                    found.push(entry.path().to_path_buf());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                }
            }
        }
    }
    found.sort();
    found
}

fn video_row(path: &Path, fp: Fingerprint) -> VideoRecord {
    VideoRecord {
        hash: fp.hash,
        file_name: fp.file_name,
        file_path: path.to_string_lossy().to_string(),
        file_size: fp.file_size,
        duration_secs: fp.duration_secs,
        last_watched: None,
    }
}

/// Delete rows whose file path no longer exists. Bindings cascade.
fn prune_vanished(pool: &DbPool) -> Result<usize> {
    let conn = pool.get().map_err(|e| Error::database(e.to_string()))?;
    let mut pruned = 0;
    for video in queries::videos::list_videos(&conn)? {
        if !Path::new(&video.file_path).exists() {
            tracing::info!(path = %video.file_path, hash = %video.hash, "Pruning vanished video");
            if queries::videos::delete_video(&conn, &video.hash)? {
                pruned += 1;
            }
        }
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kandan_db::pool::init_memory_pool;
    use std::io::Write;

    fn write_file(path: &Path, content: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::File::create(path).unwrap().write_all(content).unwrap();
    }

    #[test]
    fn discovery_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("show/ep01.mkv"), b"a");
        write_file(&dir.path().join("show/ep02.mp4"), b"b");
        write_file(&dir.path().join("show/cover.jpg"), b"c");
        write_file(&dir.path().join("notes.txt"), b"d");

        let found = discover_videos(&[dir.path().to_path_buf()]);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| is_video_file(p)));
    }

    #[test]
    fn discovery_of_missing_root_is_empty() {
        let found = discover_videos(&[PathBuf::from("/nonexistent/library")]);
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn scan_indexes_new_files_once() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("ep01.mkv"), b"first episode bytes");
        write_file(&dir.path().join("ep02.mkv"), b"second episode bytes");

        let pool = init_memory_pool().unwrap();
        let config = LibraryConfig {
            paths: vec![dir.path().to_path_buf()],
            ..LibraryConfig::default()
        };

        let report = scan_library(&pool, &config, None).await.unwrap();
        assert_eq!(report.discovered, 2);
        // ffprobe is unavailable in tests, so durations come back as the
        // sentinel and the rows are skipped rather than persisted.
        assert_eq!(report.added + report.skipped, 2);
    }

    #[tokio::test]
    async fn scan_prunes_vanished_rows() {
        let pool = init_memory_pool().unwrap();
        {
            let mut conn = pool.get().unwrap();
            queries::videos::insert_videos_if_absent(
                &mut conn,
                &[VideoRecord {
                    hash: "GONE".into(),
                    file_name: "gone".into(),
                    file_path: "/nonexistent/gone.mkv".into(),
                    file_size: 1,
                    duration_secs: 1,
                    last_watched: None,
                }],
            )
            .unwrap();
        }

        let config = LibraryConfig::default();
        let report = scan_library(&pool, &config, None).await.unwrap();
        assert_eq!(report.pruned, 1);

        let conn = pool.get().unwrap();
        assert!(queries::videos::list_videos(&conn).unwrap().is_empty());
    }
}
