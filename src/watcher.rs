//! Owned runtime context: the scanner (with its seen set) plus the adaptive
//! scheduler, shared by the tick loop and the command surface.
//!
//! The scanner sits behind an async mutex. Scheduled ticks only `try_lock`
//! it, so a tick that lands during any scan is a no-op; manual runs wait for
//! the lock and never touch scheduler bookkeeping.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::gauge;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::WatchConfig;
use crate::extract::Extractor;
use crate::ingest::discovery::LinkDiscovery;
use crate::ingest::types::Fetcher;
use crate::notify::{self, Notifier};
use crate::scan::Scanner;
use crate::scheduler::{AdaptiveScheduler, SchedulerState, TickDecision};
use crate::seen::SeenStore;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchStatus {
    #[serde(flatten)]
    pub scheduler: SchedulerState,
    pub seen_count: usize,
    pub max_items_per_run: usize,
}

pub struct Watcher {
    scanner: tokio::sync::Mutex<Scanner>,
    scheduler: Mutex<AdaptiveScheduler>,
    notifier: Arc<dyn Notifier>,
    max_items: usize,
    seen_count: AtomicUsize,
}

impl Watcher {
    pub fn new(
        scanner: Scanner,
        scheduler: AdaptiveScheduler,
        notifier: Arc<dyn Notifier>,
        max_items: usize,
    ) -> Self {
        let seen_count = AtomicUsize::new(scanner.seen().len());
        Self {
            scanner: tokio::sync::Mutex::new(scanner),
            scheduler: Mutex::new(scheduler),
            notifier,
            max_items,
            seen_count,
        }
    }

    /// Wire discovery, extractor, seen store and scheduler from config.
    /// Loads the seen set from disk.
    pub fn from_config(
        cfg: &WatchConfig,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let discovery = LinkDiscovery::new(
            fetcher.clone(),
            &cfg.index_url,
            cfg.item_rule(),
            cfg.index_timeout(),
        );
        let extractor = Extractor::new(fetcher, cfg.detail_timeout())
            .with_referer(&cfg.index_url)
            .with_jitter(cfg.jitter());
        let seen = SeenStore::open(&cfg.seen_path);
        let scanner = Scanner::new(
            discovery,
            extractor,
            notifier.clone(),
            seen,
            cfg.post_interval(),
        );
        let scheduler = AdaptiveScheduler::new(cfg.base_interval(), cfg.max_interval());
        Self::new(scanner, scheduler, notifier, cfg.max_items_per_run)
    }

    pub async fn tick(&self) -> Option<usize> {
        self.tick_at(Utc::now()).await
    }

    /// One scheduler tick at `now`. Returns the emitted count when a scan ran.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Option<usize> {
        let decision = self
            .scheduler
            .lock()
            .expect("scheduler mutex poisoned")
            .on_tick(now);
        if decision != TickDecision::Run {
            tracing::trace!(target: "scheduler", ?decision, "tick skipped");
            return None;
        }

        let Ok(mut scanner) = self.scanner.try_lock() else {
            tracing::debug!(target: "scheduler", "manual scan in flight, skipping tick");
            self.scheduler
                .lock()
                .expect("scheduler mutex poisoned")
                .abort_run();
            return None;
        };

        let started = Instant::now();
        let emitted = scanner.run(self.max_items).await;
        self.seen_count.store(scanner.seen().len(), Ordering::Relaxed);
        drop(scanner);

        let elapsed =
            ChronoDuration::from_std(started.elapsed()).unwrap_or_else(|_| ChronoDuration::zero());
        let done = now + elapsed;
        let mut sched = self.scheduler.lock().expect("scheduler mutex poisoned");
        sched.finish_run(emitted, done);
        gauge!("scheduler_interval_secs").set(sched.current_interval().as_secs_f64());
        tracing::info!(
            target: "scheduler",
            emitted,
            next_interval_secs = sched.current_interval().as_secs(),
            "scheduled scan finished"
        );
        Some(emitted)
    }

    /// On-demand scan outside the schedule. Waits for an in-flight scan.
    pub async fn run_manual(&self, max_items: Option<usize>) -> usize {
        let max = max_items.unwrap_or(self.max_items);
        let mut scanner = self.scanner.lock().await;
        let emitted = scanner.run(max).await;
        self.seen_count.store(scanner.seen().len(), Ordering::Relaxed);
        tracing::info!(target: "scan", emitted, max, "manual scan finished");
        emitted
    }

    /// Post the fixed dummy settlement through the configured sink.
    pub async fn send_test(&self) -> Result<()> {
        self.notifier.emit(&notify::test_record()).await
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.scheduler
            .lock()
            .expect("scheduler mutex poisoned")
            .set_enabled(enabled);
        tracing::info!(target: "scheduler", enabled, "scheduler toggled");
    }

    /// Flip the enabled flag and return the new value.
    pub fn toggle(&self) -> bool {
        let mut s = self.scheduler.lock().expect("scheduler mutex poisoned");
        let enabled = !s.enabled();
        s.set_enabled(enabled);
        tracing::info!(target: "scheduler", enabled, "scheduler toggled");
        enabled
    }

    pub fn status(&self) -> WatchStatus {
        let scheduler = self
            .scheduler
            .lock()
            .expect("scheduler mutex poisoned")
            .state();
        WatchStatus {
            scheduler,
            seen_count: self.seen_count.load(Ordering::Relaxed),
            max_items_per_run: self.max_items,
        }
    }

    /// Drive `tick` every `every` until the runtime shuts down.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}
