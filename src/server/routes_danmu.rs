//! Playback-facing danmu routes.
//!
//! `/comment/:hash` serves the XML overlay document for desktop
//! players; `/dplayer/v3` serves the JSON document for web players.
//! Both resolve a video hash to its bound episode and, when configured,
//! download a missing payload on demand.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use kandan_common::Error;
use kandan_db::queries;
use serde::Deserialize;

use super::ApiError;
use crate::danmu;
use crate::remote::FetchOptions;
use crate::state::AppContext;

pub fn danmu_routes() -> Router<AppContext> {
    Router::new()
        .route("/comment/:hash", get(comment_overlay))
        .route("/dplayer/v3", get(dplayer_comments))
}

async fn comment_overlay(
    State(ctx): State<AppContext>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let episode_id = resolve_episode(&ctx, &hash).await?;
    let xml = danmu::overlay_markup_for(&ctx.danmu_cache, episode_id)?;
    mark_watched(&ctx, &hash);
    Ok(([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], xml))
}

#[derive(Debug, Deserialize)]
pub struct DplayerQuery {
    /// Video hash of the episode being played.
    pub id: String,
}

async fn dplayer_comments(
    State(ctx): State<AppContext>,
    Query(query): Query<DplayerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let episode_id = resolve_episode(&ctx, &query.id).await?;
    let json = danmu::web_json_for(&ctx.danmu_cache, episode_id)?;
    mark_watched(&ctx, &query.id);
    Ok(Json(json))
}

/// Map a video hash to its bound episode, downloading the payload on
/// demand when the cache has no entry yet.
async fn resolve_episode(ctx: &AppContext, hash: &str) -> Result<i64, Error> {
    let binding = {
        let conn = ctx.db_pool.get().map_err(|e| Error::database(e.to_string()))?;
        queries::bindings::get_binding(&conn, hash)?
            .ok_or_else(|| Error::not_found("binding", hash))?
    };

    if !ctx.danmu_cache.contains(binding.episode_id) && ctx.config.danmu.fetch_on_demand {
        let options = FetchOptions::from_config(&ctx.config.danmu);
        danmu::ensure_cached(
            &ctx.danmu_client,
            &ctx.danmu_cache,
            binding.episode_id,
            &options,
            false,
        )
        .await?;
    }

    Ok(binding.episode_id)
}

/// Serving comments implies playback is starting.
fn mark_watched(ctx: &AppContext, hash: &str) {
    let result = ctx
        .db_pool
        .get()
        .map_err(|e| Error::database(e.to_string()))
        .and_then(|conn| queries::videos::set_last_watched(&conn, hash));
    if let Err(e) = result {
        tracing::warn!(hash, error = %e, "Failed to record watch time");
    }
}
