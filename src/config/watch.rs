// src/config/watch.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extract::Jitter;
use crate::ingest::discovery::ItemPathRule;
use crate::ingest::fetch::DEFAULT_USER_AGENT;

pub const ENV_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/watch.toml";
pub const MAX_NOTIFY_RETRIES: u8 = 10;

/// Runtime settings. Every field has a default; a TOML file and then the
/// environment override them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    pub index_url: String,
    pub item_path_segment: String,
    pub item_path_suffix: String,
    pub seen_path: PathBuf,

    /// Scheduler base interval (seconds).
    pub base_interval_secs: u64,
    /// Backoff ceiling (seconds).
    pub max_interval_secs: u64,
    /// How often the tick loop wakes up to ask the scheduler (seconds).
    pub tick_secs: u64,
    /// Pause between two posts within one scan (seconds).
    pub post_interval_secs: u64,
    pub max_items_per_run: usize,

    pub index_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub user_agent: String,

    pub discord_webhook_url: Option<String>,
    pub dry_run: bool,
    pub notify_timeout_secs: u64,
    pub notify_retries: u8,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            index_url: "https://www.openclassactions.com/settlements.php".to_string(),
            item_path_segment: "/settlements/".to_string(),
            item_path_suffix: ".php".to_string(),
            seen_path: PathBuf::from("openclass_seen.json"),
            base_interval_secs: 3600,
            max_interval_secs: 8 * 3600,
            tick_secs: 60,
            post_interval_secs: 10,
            max_items_per_run: 30,
            index_timeout_secs: 20,
            detail_timeout_secs: 25,
            jitter_min_ms: 800,
            jitter_max_ms: 1600,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            discord_webhook_url: None,
            dry_run: false,
            notify_timeout_secs: 5,
            notify_retries: 3,
        }
    }
}

impl WatchConfig {
    /// Load from a TOML file (all keys optional).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// File layer, then env overrides, then validation:
    /// 1) $WATCH_CONFIG_PATH (must exist when set)
    /// 2) config/watch.toml if present
    /// 3) built-in defaults
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(Path::new(DEFAULT_CONFIG_PATH))?
        } else {
            Self::default()
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Override fields from well-known environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_str("SETTLEMENTS_INDEX_URL") {
            self.index_url = v;
        }
        if let Some(v) = env_str("SEEN_FILE") {
            self.seen_path = PathBuf::from(v);
        }
        if let Some(v) = env_parse("CHECK_INTERVAL_SECS")? {
            self.base_interval_secs = v;
        }
        if let Some(v) = env_parse("MAX_CHECK_INTERVAL_SECS")? {
            self.max_interval_secs = v;
        }
        if let Some(v) = env_parse("TICK_SECS")? {
            self.tick_secs = v;
        }
        if let Some(v) = env_parse("POST_INTERVAL_SECS")? {
            self.post_interval_secs = v;
        }
        if let Some(v) = env_parse("MAX_POSTS_PER_RUN")? {
            self.max_items_per_run = v;
        }
        if let Some(v) = env_str("DISCORD_WEBHOOK_URL") {
            self.discord_webhook_url = Some(v);
        }
        if let Some(v) = env_str("NOTIFY_DRY_RUN") {
            self.dry_run = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.index_url)
            .map_err(|e| anyhow!("invalid index_url {:?}: {e}", self.index_url))?;
        if self.base_interval_secs == 0 || self.tick_secs == 0 {
            bail!("base_interval_secs and tick_secs must be greater than zero");
        }
        if self.max_interval_secs < self.base_interval_secs {
            bail!(
                "max_interval_secs ({}) must be >= base_interval_secs ({})",
                self.max_interval_secs,
                self.base_interval_secs
            );
        }
        if self.max_items_per_run == 0 {
            bail!("max_items_per_run must be greater than zero");
        }
        if self.notify_retries > MAX_NOTIFY_RETRIES {
            bail!("notify_retries must be at most {MAX_NOTIFY_RETRIES}");
        }
        if self.discord_webhook_url.is_none() && !self.dry_run {
            bail!("DISCORD_WEBHOOK_URL is not set (set NOTIFY_DRY_RUN=1 to only log)");
        }
        Ok(())
    }

    pub fn item_rule(&self) -> ItemPathRule {
        ItemPathRule {
            segment: self.item_path_segment.clone(),
            suffix: self.item_path_suffix.clone(),
        }
    }

    pub fn jitter(&self) -> Option<Jitter> {
        (self.jitter_max_ms > 0).then_some(Jitter {
            min_ms: self.jitter_min_ms,
            max_ms: self.jitter_max_ms,
        })
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_secs(self.base_interval_secs)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn post_interval(&self) -> Duration {
        Duration::from_secs(self.post_interval_secs)
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_str(key) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{key} must be a number, got {v:?}: {e}")),
    }
}
