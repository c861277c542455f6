use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static DESCRIBED: OnceCell<()> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured base interval.
    pub fn init(base_interval_secs: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        ensure_metrics_described();
        gauge!("scheduler_interval_secs").set(base_interval_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Register help text once per process.
pub fn ensure_metrics_described() {
    DESCRIBED.get_or_init(|| {
        describe_counter!("scan_runs_total", "Scans started (scheduled and manual)");
        describe_counter!(
            "scan_items_emitted_total",
            "Items emitted and committed to the seen set"
        );
        describe_counter!("scan_index_errors_total", "Index page fetches that failed");
        describe_counter!(
            "extract_fetch_errors_total",
            "Detail pages replaced by a placeholder record"
        );
        describe_counter!("notify_errors_total", "Notifier emissions that failed");
        describe_counter!("seen_persist_errors_total", "Failed writes of the seen file");
        describe_gauge!("scheduler_interval_secs", "Current adaptive scan interval");
        describe_gauge!("seen_ids", "Ids in the seen set");
    });
}
