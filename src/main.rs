//! Settlement watcher service entrypoint.
//! Loads config, starts the scan scheduler in the background and serves the
//! command surface plus `/metrics`.

use std::sync::Arc;

use settlement_watch::ingest::fetch::HttpFetcher;
use settlement_watch::metrics::Metrics;
use settlement_watch::{notify, WatchConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON when `LOG_FORMAT=json`.
/// `try_init` keeps this a no-op when the runtime already installed a subscriber.
fn init_tracing() {
    // Log targets are per concern (scan, seen, notify, scheduler), not module paths.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("settlement_watch=info,scan=info,seen=info,notify=info,scheduler=info,warn")
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatchConfig::load()?;
    tracing::info!(
        index = %cfg.index_url,
        seen = %cfg.seen_path.display(),
        base_interval_secs = cfg.base_interval_secs,
        max_interval_secs = cfg.max_interval_secs,
        dry_run = cfg.dry_run,
        "starting settlement watcher"
    );

    let metrics = Metrics::init(cfg.base_interval_secs)?;
    let fetcher = Arc::new(HttpFetcher::new(&cfg.user_agent)?);
    let notifier = notify::from_config(&cfg)?;

    let (watcher, router) = settlement_watch::app(&cfg, fetcher, notifier);
    watcher.spawn(cfg.tick());

    Ok(router.merge(metrics.router()).into())
}
