// tests/api_http.rs
//
// HTTP-level tests for the command Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /status
// - POST /scan (with and without max_items)
// - POST /toggle (flip and explicit)
// - POST /test-notify (ok and failing sink)

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use settlement_watch::ingest::fixture::FixtureFetcher;
use settlement_watch::notify::MemoryNotifier;
use settlement_watch::WatchConfig;

const BODY_LIMIT: usize = 1024 * 1024;
const INDEX: &str = "https://www.openclassactions.com/settlements.php";

struct TestApp {
    router: Router,
    notifier: Arc<MemoryNotifier>,
    _dir: tempfile::TempDir,
}

fn test_app(notifier: MemoryNotifier) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = WatchConfig {
        index_url: INDEX.to_string(),
        seen_path: dir.path().join("seen.json"),
        post_interval_secs: 0,
        jitter_max_ms: 0,
        dry_run: true,
        ..WatchConfig::default()
    };
    let fetcher = Arc::new(FixtureFetcher::new().with_page(
        INDEX,
        r#"<a href="/settlements/a.php">A</a><a href="/settlements/b.php">B</a>"#,
    ));
    let notifier = Arc::new(notifier);
    let (_watcher, router) = settlement_watch::app(&cfg, fetcher, notifier.clone());
    TestApp {
        router,
        notifier,
        _dir: dir,
    }
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, String::from_utf8(bytes).expect("utf8"))
}

async fn call_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Json) {
    let (status, body) = call(app, method, uri).await;
    let v = serde_json::from_str(&body).unwrap_or_else(|e| panic!("json from {uri}: {e}: {body}"));
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_app(MemoryNotifier::new());
    let (status, body) = call(&app.router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn status_reports_fresh_scheduler() {
    let app = test_app(MemoryNotifier::new());
    let (status, v) = call_json(&app.router, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["enabled"], true);
    assert_eq!(v["phase"], "idle");
    assert_eq!(v["current_interval_secs"], 3600);
    assert_eq!(v["seen_count"], 0);
    assert_eq!(v["max_items_per_run"], 30);
    assert!(v["last_run_at"].is_null());
}

#[tokio::test]
async fn manual_scan_respects_max_items_and_updates_status() {
    let app = test_app(MemoryNotifier::new());

    let (status, v) = call_json(&app.router, "POST", "/scan?max_items=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["emitted"], 1);

    let (_, v) = call_json(&app.router, "POST", "/scan").await;
    assert_eq!(v["emitted"], 1);

    let (_, v) = call_json(&app.router, "POST", "/scan").await;
    assert_eq!(v["emitted"], 0);

    let (_, st) = call_json(&app.router, "GET", "/status").await;
    assert_eq!(st["seen_count"], 2);
    assert!(st["last_run_at"].is_null(), "manual scans do not reschedule");
    assert_eq!(app.notifier.sent_ids().len(), 2);
}

#[tokio::test]
async fn toggle_flips_and_sets() {
    let app = test_app(MemoryNotifier::new());

    let (_, v) = call_json(&app.router, "POST", "/toggle").await;
    assert_eq!(v["enabled"], false);

    let (_, v) = call_json(&app.router, "POST", "/toggle?enabled=true").await;
    assert_eq!(v["enabled"], true);

    let (_, v) = call_json(&app.router, "POST", "/toggle?enabled=true").await;
    assert_eq!(v["enabled"], true);

    let (_, st) = call_json(&app.router, "GET", "/status").await;
    assert_eq!(st["enabled"], true);
}

#[tokio::test]
async fn test_notify_posts_dummy_record() {
    let app = test_app(MemoryNotifier::new());
    let (status, v) = call_json(&app.router, "POST", "/test-notify").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ok"], true);

    let sent = app.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], settlement_watch::notify::test_record());
}

#[tokio::test]
async fn test_notify_surfaces_sink_failure() {
    let app = test_app(MemoryNotifier::failing());
    let (status, v) = call_json(&app.router, "POST", "/test-notify").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["ok"], false);
    assert!(v["error"].as_str().unwrap().contains("fail"));
}
