// src/notify/mod.rs
pub mod discord;

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

use crate::config::WatchConfig;
use crate::ingest::types::ItemRecord;

pub use discord::DiscordNotifier;

/// Delivery sink for discovered settlements.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn emit(&self, record: &ItemRecord) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Dry-run sink: logs each record instead of posting it.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn emit(&self, record: &ItemRecord) -> Result<()> {
        tracing::info!(
            target: "notify",
            id = %record.id,
            title = %record.title,
            reward = %record.reward,
            deadline = ?record.deadline,
            proof = ?record.proof,
            action_url = ?record.action_url,
            "settlement (dry run)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Test helper: keeps every emitted record, optionally failing each call.
#[derive(Default)]
pub struct MemoryNotifier {
    pub sent: Mutex<Vec<ItemRecord>>,
    fail: bool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail: true,
        }
    }

    pub fn sent_ids(&self) -> Vec<String> {
        self.sent.lock().expect("sent mutex poisoned").iter().map(|r| r.id.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Notifier for MemoryNotifier {
    async fn emit(&self, record: &ItemRecord) -> Result<()> {
        self.sent.lock().expect("sent mutex poisoned").push(record.clone());
        if self.fail {
            return Err(anyhow!("memory notifier set to fail"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Discord when a webhook is configured, the log sink in dry-run mode.
pub fn from_config(cfg: &WatchConfig) -> Result<Arc<dyn Notifier>> {
    match (&cfg.discord_webhook_url, cfg.dry_run) {
        (_, true) => Ok(Arc::new(LogNotifier)),
        (Some(url), false) => Ok(Arc::new(
            DiscordNotifier::new(url.clone())
                .with_timeout(cfg.notify_timeout_secs)
                .with_retries(cfg.notify_retries),
        )),
        (None, false) => Err(anyhow!(
            "DISCORD_WEBHOOK_URL is not set (set NOTIFY_DRY_RUN=1 to only log)"
        )),
    }
}

/// Fixed record used to check that the sink is wired up.
pub fn test_record() -> ItemRecord {
    ItemRecord {
        id: "https://www.openclassactions.com/".to_string(),
        title: "Test Class Action Settlement (Dummy)".to_string(),
        reward: "$10 - $100 (example)".to_string(),
        deadline: Some("Example Deadline".to_string()),
        proof: Some(crate::extract::proof::PROOF_NOT_REQUIRED.to_string()),
        summary: Some(
            "This is just a test settlement to confirm that the bot can post embeds correctly in this channel."
                .to_string(),
        ),
        action_url: None,
    }
}
