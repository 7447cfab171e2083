//! Batch pipelines tying the database, the remote clients, and the
//! worker pool together.
//!
//! Matching proceeds in chunks: each chunk fans out over the pool, and
//! its confirmed matches are persisted before the next chunk starts, so
//! an interrupted run loses at most one chunk of work. Inserts use
//! `INSERT OR IGNORE`, so re-running after an interruption is safe.

use std::collections::BTreeSet;
use std::sync::Arc;

use kandan_common::{Error, Result};
use kandan_db::models::{BindingRecord, VideoRecord};
use kandan_db::pool::DbPool;
use kandan_db::queries;

use crate::config::{DanmuConfig, MatchingConfig};
use crate::danmu::{self, DanmuCache};
use crate::remote::{DanmuClient, FetchOptions, MatchCandidate, MatchClient, MatchOutcome};
use crate::workers::{run_bounded, ProgressHook};

/// A video the service did not commit to an episode for. Resolution
/// requires a manual binding. An empty candidate list means the
/// service either knew nothing about the file or could not be reached.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PendingMatch {
    pub video: VideoRecord,
    pub candidates: Vec<MatchCandidate>,
}

/// Summary of one match batch.
#[derive(Debug, Default, serde::Serialize)]
pub struct MatchBatchReport {
    /// Videos submitted to the service.
    pub scanned: usize,
    /// Bindings persisted this run.
    pub matched: usize,
    /// Videos awaiting a manual decision, including those the service
    /// could not be reached for.
    pub needs_manual: Vec<PendingMatch>,
    /// Hashes the service rejected, with its error message.
    pub rejected: Vec<(String, String)>,
}

/// Summary of one danmu batch.
#[derive(Debug, Default, serde::Serialize)]
pub struct DanmuBatchReport {
    pub downloaded: usize,
    pub already_cached: usize,
    /// Episodes whose download failed; retried on the next run.
    pub skipped: Vec<i64>,
}

/// Match every unbound video against the service and persist confirmed
/// bindings.
///
/// Per-item rejections and outages never abort the batch: rejections
/// are recorded with their message, outages land in `needs_manual`
/// with no candidates.
pub async fn run_match_batch(
    pool: &DbPool,
    client: Arc<MatchClient>,
    config: &MatchingConfig,
    progress: Option<ProgressHook>,
) -> Result<MatchBatchReport> {
    let unbound = {
        let conn = pool.get().map_err(|e| Error::database(e.to_string()))?;
        queries::videos::list_unbound_videos(&conn)?
    };

    let mut report = MatchBatchReport {
        scanned: unbound.len(),
        ..Default::default()
    };
    if unbound.is_empty() {
        tracing::info!("No unbound videos to match");
        return Ok(report);
    }
    tracing::info!(
        videos = unbound.len(),
        chunk_size = config.chunk_size,
        concurrency = config.concurrency,
        "Starting match batch"
    );

    for chunk in unbound.chunks(config.chunk_size) {
        let work_client = client.clone();
        let results = run_bounded(
            chunk.to_vec(),
            config.concurrency,
            progress.clone(),
            |video| video.file_name.clone(),
            move |video| {
                let client = work_client.clone();
                async move {
                    let outcome = client.match_video(&video).await;
                    (video, outcome)
                }
            },
        )
        .await;

        let mut bindings = Vec::new();
        for (video, outcome) in results {
            match outcome {
                Ok(MatchOutcome::Matched(candidate)) => {
                    bindings.push(candidate.into_binding(&video.hash));
                }
                Ok(MatchOutcome::Ambiguous(candidates)) => {
                    report.needs_manual.push(PendingMatch { video, candidates });
                }
                Ok(MatchOutcome::Unavailable) => {
                    report.needs_manual.push(PendingMatch {
                        video,
                        candidates: Vec::new(),
                    });
                }
                Err(Error::ServiceRejected { message }) => {
                    tracing::warn!(hash = %video.hash, %message, "Service rejected video");
                    report.rejected.push((video.hash, message));
                }
                Err(e) => return Err(e),
            }
        }

        // Persist this chunk before the next one starts.
        if !bindings.is_empty() {
            let mut conn = pool.get().map_err(|e| Error::database(e.to_string()))?;
            report.matched += queries::bindings::insert_bindings_if_absent(&mut conn, &bindings)?;
        }
    }

    tracing::info!(
        matched = report.matched,
        needs_manual = report.needs_manual.len(),
        rejected = report.rejected.len(),
        "Match batch finished"
    );
    Ok(report)
}

/// Download the comment payload for every bound episode that is not
/// cached yet.
pub async fn run_danmu_batch(
    pool: &DbPool,
    client: Arc<DanmuClient>,
    cache: DanmuCache,
    config: &DanmuConfig,
    force: bool,
    progress: Option<ProgressHook>,
) -> Result<DanmuBatchReport> {
    let episode_ids: Vec<i64> = {
        let conn = pool.get().map_err(|e| Error::database(e.to_string()))?;
        // Several files can bind to the same episode; fetch each once.
        queries::bindings::list_bindings(&conn)?
            .into_iter()
            .map(|b| b.episode_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    let mut report = DanmuBatchReport::default();
    if episode_ids.is_empty() {
        tracing::info!("No bound episodes to fetch danmu for");
        return Ok(report);
    }
    tracing::info!(episodes = episode_ids.len(), force, "Starting danmu batch");

    let options = FetchOptions::from_config(config);
    let shared_cache = Arc::new(cache);
    let work_client = client.clone();
    let work_cache = shared_cache.clone();
    let results = run_bounded(
        episode_ids,
        config.concurrency,
        progress,
        |id| format!("episode {id}"),
        move |episode_id| {
            let client = work_client.clone();
            let cache = work_cache.clone();
            let options = options.clone();
            async move {
                let outcome = danmu::ensure_cached(&client, &cache, episode_id, &options, force).await;
                (episode_id, outcome)
            }
        },
    )
    .await;

    for (episode_id, outcome) in results {
        match outcome {
            Ok(true) => report.downloaded += 1,
            Ok(false) => report.already_cached += 1,
            Err(e) => {
                tracing::warn!(episode_id, error = %e, "Skipping episode");
                report.skipped.push(episode_id);
            }
        }
    }

    tracing::info!(
        downloaded = report.downloaded,
        already_cached = report.already_cached,
        skipped = report.skipped.len(),
        "Danmu batch finished"
    );
    Ok(report)
}

/// Bind a video to an episode chosen by hand.
///
/// The video must exist and must not already be bound; re-binding
/// requires an explicit unbind first.
pub fn bind_manual(pool: &DbPool, hash: &str, candidate: MatchCandidate) -> Result<BindingRecord> {
    let mut conn = pool.get().map_err(|e| Error::database(e.to_string()))?;

    if queries::videos::get_video(&conn, hash)?.is_none() {
        return Err(Error::not_found("video", hash));
    }
    if queries::bindings::get_binding(&conn, hash)?.is_some() {
        return Err(Error::Conflict(format!("video {hash} is already bound")));
    }

    let binding = candidate.into_binding(hash);
    queries::bindings::insert_bindings_if_absent(&mut conn, std::slice::from_ref(&binding))?;
    tracing::info!(hash, episode_id = binding.episode_id, "Manually bound video");
    Ok(binding)
}

/// Remove the binding for a video so it can be re-matched.
pub fn unbind(pool: &DbPool, hash: &str) -> Result<()> {
    let conn = pool.get().map_err(|e| Error::database(e.to_string()))?;
    if !queries::bindings::delete_binding(&conn, hash)? {
        return Err(Error::not_found("binding", hash));
    }
    Ok(())
}
