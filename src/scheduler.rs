// src/scheduler.rs
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Scanning,
}

/// What a tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Disabled,
    Busy,
    NotDue,
    Run,
}

/// Status snapshot for the command surface.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchedulerState {
    pub enabled: bool,
    pub phase: Phase,
    pub current_interval_secs: u64,
    pub base_interval_secs: u64,
    pub max_interval_secs: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
}

/// Backoff scheduler.
/// - First tick always runs.
/// - A run that finds nothing doubles the interval, up to the ceiling.
/// - A run that finds something snaps back to the base interval.
/// - Time is passed in explicitly; the tick loop owns the clock.
#[derive(Debug, Clone)]
pub struct AdaptiveScheduler {
    base: ChronoDuration,
    ceiling: ChronoDuration,
    current: ChronoDuration,
    last_run_at: Option<DateTime<Utc>>,
    phase: Phase,
    enabled: bool,
}

impl AdaptiveScheduler {
    /// A ceiling below `base` is raised to `base`.
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        let base = to_chrono(base);
        let ceiling = to_chrono(ceiling).max(base);
        Self {
            base,
            ceiling,
            current: base,
            last_run_at: None,
            phase: Phase::Idle,
            enabled: true,
        }
    }

    /// Decide at `now` and, on `Run`, move to SCANNING. Does nothing otherwise.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> TickDecision {
        if !self.enabled {
            return TickDecision::Disabled;
        }
        if self.phase == Phase::Scanning {
            return TickDecision::Busy;
        }
        if !self.is_due(now) {
            return TickDecision::NotDue;
        }
        self.phase = Phase::Scanning;
        TickDecision::Run
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_run_at {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.current,
        }
    }

    /// Record a completed scheduled run and adapt the interval.
    pub fn finish_run(&mut self, new_items: usize, now: DateTime<Utc>) {
        self.current = if new_items == 0 {
            self.current.checked_mul(2).unwrap_or(self.ceiling).min(self.ceiling)
        } else {
            self.base
        };
        self.last_run_at = Some(now);
        self.phase = Phase::Idle;
    }

    /// Leave SCANNING without counting a run (the scan never started).
    pub fn abort_run(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_interval(&self) -> Duration {
        self.current.to_std().unwrap_or_default()
    }

    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            enabled: self.enabled,
            phase: self.phase,
            current_interval_secs: self.current.num_seconds().max(0) as u64,
            base_interval_secs: self.base.num_seconds().max(0) as u64,
            max_interval_secs: self.ceiling.num_seconds().max(0) as u64,
            last_run_at: self.last_run_at,
            next_run_at: self.last_run_at.and_then(|t| t.checked_add_signed(self.current)),
        }
    }
}

fn to_chrono(d: Duration) -> ChronoDuration {
    ChronoDuration::from_std(d).unwrap_or(ChronoDuration::MAX)
}
