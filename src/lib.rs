// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod scan;
pub mod scheduler;
pub mod seen;
pub mod watcher;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::WatchConfig;
pub use crate::ingest::types::{Fetcher, ItemRecord};
pub use crate::notify::Notifier;
pub use crate::watcher::{WatchStatus, Watcher};

use std::sync::Arc;

/// Build the watcher and its command router from a loaded config.
/// The tick loop is not started; call `Watcher::spawn` for that.
pub fn app(
    cfg: &WatchConfig,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
) -> (Arc<Watcher>, axum::Router) {
    let watcher = Arc::new(Watcher::from_config(cfg, fetcher, notifier));
    let router = api::router(watcher.clone());
    (watcher, router)
}
