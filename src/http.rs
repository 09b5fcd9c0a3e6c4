//! HTTP control interface
//!
//! Routes map one-to-one onto the orchestrators. Every failure leaves as an
//! [`ErrorBody`] with the status code it carries.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::clone::{CloneOrchestrator, CloneRequest};
use crate::config::Config;
use crate::output::{ErrorBody, ErrorCode, LogsResult, StatusResult};
use crate::preview::PreviewLauncher;
use crate::{status, tail};

const INDEX_HTML: &str = include_str!("../templates/index.html");

pub struct AppState {
    pub config: Arc<Config>,
    pub clone: CloneOrchestrator,
    pub preview: PreviewLauncher,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            clone: CloneOrchestrator::new(Arc::clone(&config)),
            preview: PreviewLauncher::new(Arc::clone(&config)),
            config,
        }
    }
}

type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/clone", post(clone_repo))
        .route("/status", get(status_report))
        .route("/logs", get(logs))
        .route("/start-preview", post(start_preview))
        .with_state(state)
}

/// Serve the facade on `addr` until Ctrl-C
pub async fn serve(config: Config, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// === POST /clone ===

async fn clone_repo(State(state): State<SharedState>, body: Bytes) -> Response {
    // Missing or malformed JSON counts as an empty request
    let request: CloneRequest = serde_json::from_slice(&body).unwrap_or_default();

    match state.clone.clone_repo(&request).await {
        Ok(report) => Json(crate::output::CloneResult::from(report)).into_response(),
        Err(e) => {
            tracing::info!(error = %e, "clone request failed");
            AppError(ErrorBody::from(&e)).into_response()
        }
    }
}

// === GET /status ===

async fn status_report(State(state): State<SharedState>) -> Json<StatusResult> {
    Json(StatusResult {
        ok: true,
        status: status::collect(&state.config).await,
    })
}

// === GET /logs ===

async fn logs(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LogsResult>, AppError> {
    let lines = tail::parse_lines(params.get("tail").map(String::as_str));
    let path = state.config.log_path.to_string_lossy().into_owned();
    let log = tail::tail_file_async(&state.config.log_path, lines).await;

    if log.is_empty() {
        return Err(AppError(
            ErrorBody::new(ErrorCode::NotFound, 404, "Log file not found or empty").with_path(&path),
        ));
    }

    Ok(Json(LogsResult {
        ok: true,
        path,
        lines,
        log,
    }))
}

// === POST /start-preview ===

async fn start_preview(State(state): State<SharedState>) -> Response {
    match state.preview.start().await {
        Ok(outcome) => Json(crate::output::PreviewResult::from(outcome)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "preview start failed");
            AppError(ErrorBody::from_preview(&e)).into_response()
        }
    }
}

// === Error handling ===

struct AppError(ErrorBody);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}
