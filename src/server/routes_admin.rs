//! Administrative trigger routes for the scan, match, and danmu
//! pipelines.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use super::ApiError;
use crate::orchestrator;
use crate::scanner;
use crate::state::AppContext;

pub fn admin_routes() -> Router<AppContext> {
    Router::new()
        .route("/scan", post(trigger_scan))
        .route("/match", post(trigger_match))
        .route("/danmu", post(trigger_danmu))
}

async fn trigger_scan(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let report = scanner::scan_library(&ctx.db_pool, &ctx.config.library, None).await?;
    Ok(Json(report))
}

async fn trigger_match(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let report = orchestrator::run_match_batch(
        &ctx.db_pool,
        ctx.match_client.clone(),
        &ctx.config.matching,
        None,
    )
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
pub struct DanmuTriggerQuery {
    /// Re-download payloads that are already cached.
    #[serde(default)]
    pub force: bool,
}

async fn trigger_danmu(
    State(ctx): State<AppContext>,
    Query(query): Query<DanmuTriggerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = orchestrator::run_danmu_batch(
        &ctx.db_pool,
        ctx.danmu_client.clone(),
        ctx.danmu_cache.clone(),
        &ctx.config.danmu,
        query.force,
        None,
    )
    .await?;
    Ok(Json(report))
}
