//! HTTP serving layer.
//!
//! Provides four endpoints:
//! - `/` - landing page
//! - `/check` - runs the full batch and responds with the rendered report
//! - `/sites/{page}` - generated per-site detail pages
//! - `/status` - JSON snapshot of the last completed run
//!
//! The serving layer is a thin collaborator over the library: it triggers
//! `run_audit` and serves the artifacts the runner wrote.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::report::{render_index, AuditReport};
use crate::run::run_audit;

/// Shared state for the report server.
#[derive(Clone)]
pub struct ServerState {
    config: Arc<Config>,
    last_report: Arc<RwLock<Option<AuditReport>>>,
    /// Serializes batch runs triggered over HTTP; artifact writing is
    /// single-writer and overlapping runs would contend on the output dir.
    run_lock: Arc<Mutex<()>>,
}

/// JSON response for the `/status` endpoint.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<AuditReport>,
}

/// Creates and starts the report server.
pub async fn serve(port: u16, config: Config) -> Result<(), anyhow::Error> {
    let state = ServerState {
        config: Arc::new(config),
        last_report: Arc::new(RwLock::new(None)),
        run_lock: Arc::new(Mutex::new(())),
    };

    let app = Router::new()
        .route("/", get(landing_handler))
        .route("/check", get(check_handler))
        .route("/sites/{page}", get(site_page_handler))
        .route("/status", get(status_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}"))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind report server to port {}: {}", port, e))?;

    log::info!("Report server listening on http://127.0.0.1:{port}/");
    log::info!("  - Trigger a run: http://127.0.0.1:{port}/check");
    log::info!("  - Last run:      http://127.0.0.1:{port}/status");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Report server error: {}", e))?;

    Ok(())
}

async fn landing_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>frame_check</title></head>
<body>
    <h1>frame_check</h1>
    <ul>
        <li><a href="/check">Run the frameability check</a></li>
        <li><a href="/status">Last run (JSON)</a></li>
    </ul>
</body>
</html>
"#,
    )
}

/// Runs the full batch and responds with the rendered HTML index.
async fn check_handler(State(state): State<ServerState>) -> Response {
    let _guard = state.run_lock.lock().await;

    match run_audit(state.config.as_ref().clone()).await {
        Ok(report) => {
            let html = render_index(&report);
            *state.last_report.write().await = Some(report);
            Html(html).into_response()
        }
        Err(e) => {
            log::error!("Batch run triggered over HTTP failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("frame_check error: {e:#}"),
            )
                .into_response()
        }
    }
}

/// Serves a generated per-site page from the output directory.
async fn site_page_handler(
    State(state): State<ServerState>,
    Path(page): Path<String>,
) -> Response {
    let Some(file_name) = sanitize_page_name(&page) else {
        return (StatusCode::BAD_REQUEST, "invalid page name").into_response();
    };

    let path = state.config.out_dir.join("sites").join(file_name);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Html(content).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "no such site page").into_response(),
    }
}

async fn status_handler(State(state): State<ServerState>) -> Json<StatusResponse> {
    let report = state.last_report.read().await.clone();
    Json(StatusResponse {
        status: if report.is_some() { "complete" } else { "idle" },
        report,
    })
}

/// Validates a requested page name: plain `.html` file names only, no path
/// traversal.
fn sanitize_page_name(page: &str) -> Option<&str> {
    if !page.ends_with(".html") || page.contains("..") {
        return None;
    }
    if page.contains('/') || page.contains('\\') || page.starts_with('.') {
        return None;
    }
    Some(page)
}
