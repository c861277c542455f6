use super::Notifier;
use crate::ingest::types::ItemRecord;
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const EMBED_COLOR: u32 = 0x00AAFF;
pub const DISCLAIMER: &str = "⚠️ Apply for these at your own risk, and only if you were \
     actually and legally affected by the issue. Do not submit false claims.";

// Discord embed limits
const TITLE_MAX: usize = 256;
const SUMMARY_MAX: usize = 500;
const FIELD_MAX: usize = 1024;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    async fn post(&self, payload: &DiscordWebhookPayload) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("Discord webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("Discord webhook request failed: {e}"),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(target: "notify", attempt, error = %err, "retrying discord webhook");
            tokio::time::sleep(backoff(attempt)).await;
        }
    }
}

/// 500ms doubling per attempt, capped at 32s.
fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << attempt.saturating_sub(1).min(6))
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn emit(&self, record: &ItemRecord) -> Result<()> {
        let payload = DiscordWebhookPayload {
            content: None,
            embeds: vec![build_embed(record)],
        };
        self.post(&payload).await
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DiscordEmbed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

/// One embed per settlement: summary + disclaimer as the description, the
/// extracted fields below it.
pub fn build_embed(record: &ItemRecord) -> DiscordEmbed {
    let mut description = String::new();
    if let Some(summary) = record.summary.as_deref().filter(|s| !s.is_empty()) {
        description.push_str(&clip(summary, SUMMARY_MAX));
        description.push_str("\n\n");
    }
    description.push_str(DISCLAIMER);

    let mut fields = vec![field("Settlement Award", &record.reward)];
    if let Some(d) = &record.deadline {
        fields.push(field("Deadline", d));
    }
    if let Some(p) = &record.proof {
        fields.push(field("Proof", p));
    }
    if let Some(a) = &record.action_url {
        fields.push(field("Claim Form", a));
    }

    DiscordEmbed {
        title: clip(&record.title, TITLE_MAX),
        url: record.id.starts_with("http").then(|| record.id.clone()),
        description,
        color: EMBED_COLOR,
        fields,
    }
}

fn field(name: &str, value: &str) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value: clip(value, FIELD_MAX),
        inline: false,
    }
}

/// Cap at `max` chars, replacing the tail with "...".
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}
