//! HTTP API server.

use anyhow::{Context, Result};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppContext;

pub mod routes_admin;
pub mod routes_danmu;
pub mod routes_library;

/// Error wrapper that renders as a JSON body with the status code
/// derived from the underlying error.
pub struct ApiError(kandan_common::Error);

impl From<kandan_common::Error> for ApiError {
    fn from(err: kandan_common::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Create the Axum router with all routes.
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            routes_library::library_routes()
                .merge(routes_danmu::danmu_routes())
                .merge(routes_admin::admin_routes()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "kandan",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "kandan is running"
    }))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Run the server until ctrl-c.
pub async fn run_server(ctx: AppContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = create_router(ctx);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install ctrl-c handler");
    }
    tracing::info!("Shutting down");
}
