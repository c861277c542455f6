use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::watcher::{WatchStatus, Watcher};

#[derive(Clone)]
pub struct AppState {
    pub watcher: Arc<Watcher>,
}

/// Command surface: status, manual scan, scheduler toggle, test post.
pub fn router(watcher: Arc<Watcher>) -> Router {
    let state = AppState { watcher };

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(status))
        .route("/scan", post(scan))
        .route("/toggle", post(toggle))
        .route("/test-notify", post(test_notify))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<WatchStatus> {
    Json(state.watcher.status())
}

#[derive(serde::Deserialize)]
struct ScanQuery {
    #[serde(default)]
    max_items: Option<usize>,
}

#[derive(serde::Serialize)]
struct ScanResp {
    emitted: usize,
}

async fn scan(State(state): State<AppState>, Query(q): Query<ScanQuery>) -> Json<ScanResp> {
    let emitted = state.watcher.run_manual(q.max_items).await;
    Json(ScanResp { emitted })
}

#[derive(serde::Deserialize)]
struct ToggleQuery {
    // absent = flip
    #[serde(default)]
    enabled: Option<bool>,
}

#[derive(serde::Serialize)]
struct ToggleResp {
    enabled: bool,
}

async fn toggle(State(state): State<AppState>, Query(q): Query<ToggleQuery>) -> Json<ToggleResp> {
    let enabled = match q.enabled {
        Some(v) => {
            state.watcher.set_enabled(v);
            v
        }
        None => state.watcher.toggle(),
    };
    Json(ToggleResp { enabled })
}

#[derive(serde::Serialize)]
struct TestNotifyResp {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn test_notify(State(state): State<AppState>) -> (StatusCode, Json<TestNotifyResp>) {
    match state.watcher.send_test().await {
        Ok(()) => (
            StatusCode::OK,
            Json(TestNotifyResp {
                ok: true,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "notify", error = ?e, "test notification failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(TestNotifyResp {
                    ok: false,
                    error: Some(format!("{e:#}")),
                }),
            )
        }
    }
}
