//! Library browsing and manual binding routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use kandan_common::Error;
use kandan_db::models::{BindingRecord, VideoRecord};
use kandan_db::queries;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::orchestrator;
use crate::remote::MatchCandidate;
use crate::state::AppContext;

pub fn library_routes() -> Router<AppContext> {
    Router::new()
        .route("/library", get(list_library))
        .route("/videos", get(list_videos))
        .route("/videos/unbound", get(list_unbound))
        .route("/bind", post(bind_video))
        .route("/bind/:hash", delete(unbind_video))
}

/// One bound video with its episode identity.
#[derive(Debug, Serialize)]
pub struct LibraryEntry {
    pub hash: String,
    pub file_name: String,
    pub file_path: String,
    pub duration_secs: i64,
    pub last_watched: Option<String>,
    pub anime_id: i64,
    pub episode_id: i64,
    pub anime_title: String,
    pub episode_title: String,
    pub source_type: String,
    pub label: String,
}

impl From<(VideoRecord, BindingRecord)> for LibraryEntry {
    fn from((video, binding): (VideoRecord, BindingRecord)) -> Self {
        let label = binding.label();
        Self {
            hash: video.hash,
            file_name: video.file_name,
            file_path: video.file_path,
            duration_secs: video.duration_secs,
            last_watched: video.last_watched,
            anime_id: binding.anime_id,
            episode_id: binding.episode_id,
            anime_title: binding.anime_title,
            episode_title: binding.episode_title,
            source_type: binding.source_type,
            label,
        }
    }
}

async fn list_library(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db_pool.get().map_err(|e| Error::database(e.to_string()))?;
    let entries: Vec<LibraryEntry> = queries::bindings::list_bound_videos(&conn)?
        .into_iter()
        .map(LibraryEntry::from)
        .collect();
    Ok(Json(entries))
}

async fn list_videos(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db_pool.get().map_err(|e| Error::database(e.to_string()))?;
    Ok(Json(queries::videos::list_videos(&conn)?))
}

async fn list_unbound(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db_pool.get().map_err(|e| Error::database(e.to_string()))?;
    Ok(Json(queries::videos::list_unbound_videos(&conn)?))
}

/// Request to bind a video to an episode chosen by hand.
#[derive(Debug, Deserialize)]
pub struct BindRequest {
    pub hash: String,
    pub candidate: MatchCandidate,
}

async fn bind_video(
    State(ctx): State<AppContext>,
    Json(req): Json<BindRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let binding = orchestrator::bind_manual(&ctx.db_pool, &req.hash, req.candidate)?;
    Ok((StatusCode::CREATED, Json(binding)))
}

async fn unbind_video(
    State(ctx): State<AppContext>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    orchestrator::unbind(&ctx.db_pool, &hash)?;
    Ok(StatusCode::NO_CONTENT)
}
