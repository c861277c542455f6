// src/ingest/types.rs
use anyhow::Result;
use std::time::Duration;

/// Generic display title when a page has no usable heading.
pub const DEFAULT_TITLE: &str = "Class Action Settlement";
/// Stands in for a reward the page never states.
pub const REWARD_NOT_LISTED: &str = "Not listed";

/// One discovered settlement, ready for the notifier.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: String, // canonical detail-page URL, also the dedup key
    pub title: String,
    pub reward: String, // never empty; REWARD_NOT_LISTED when absent
    pub deadline: Option<String>,
    pub proof: Option<String>,
    pub summary: Option<String>,
    pub action_url: Option<String>,
}

impl ItemRecord {
    /// Degraded record used when the detail page could not be fetched.
    pub fn placeholder(url: &str) -> Self {
        Self {
            id: url.to_string(),
            title: DEFAULT_TITLE.to_string(),
            reward: REWARD_NOT_LISTED.to_string(),
            deadline: None,
            proof: None,
            summary: None,
            action_url: None,
        }
    }
}

/// A single GET with the headers the site expects.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub referer: Option<String>,
    pub accept_language: Option<String>,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            referer: None,
            accept_language: None,
            timeout,
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_accept_language(mut self, lang: impl Into<String>) -> Self {
        self.accept_language = Some(lang.into());
        self
    }
}

/// Transport seam: returns the body of a 2xx response, anything else is an error.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, req: &FetchRequest) -> Result<String>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_keeps_id_and_sentinel() {
        let r = ItemRecord::placeholder("https://example.com/settlements/a.php");
        assert_eq!(r.id, "https://example.com/settlements/a.php");
        assert_eq!(r.title, DEFAULT_TITLE);
        assert_eq!(r.reward, REWARD_NOT_LISTED);
        assert!(r.deadline.is_none() && r.proof.is_none());
        assert!(r.summary.is_none() && r.action_url.is_none());
    }
}
