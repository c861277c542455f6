// src/extract/mod.rs
//! Field extraction for a single settlement page.
//!
//! `parse_item` is pure (HTML in, record out) and holds every heuristic.
//! `Extractor` wraps it with the fetch, the politeness jitter and the
//! placeholder fallback, so nothing escapes its boundary as an error.

pub mod action;
pub mod proof;
pub mod reward;
pub mod summary;

use metrics::counter;
use rand::Rng;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;

use crate::ingest::types::{FetchRequest, Fetcher, ItemRecord, DEFAULT_TITLE};
use crate::ingest::{clean_text, following_line, is_bare_label, value_after_colon};

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Block and emphasis elements scanned for labelled values, in document order.
const LINE_SELECTOR: &str = "h2, h3, h4, h5, strong, b, p, li, td, dd";

/// Random pause before each detail fetch, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Jitter {
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}

pub struct Extractor {
    fetcher: Arc<dyn Fetcher>,
    referer: Option<String>,
    timeout: Duration,
    jitter: Option<Jitter>,
}

impl Extractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            referer: None,
            timeout,
            jitter: None,
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_jitter(mut self, jitter: Option<Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Fetch and parse one item page. Transport failures yield a placeholder.
    pub async fn extract(&self, url: &str) -> ItemRecord {
        if let Some(j) = self.jitter {
            tokio::time::sleep(j.sample()).await;
        }

        let mut req = FetchRequest::new(url, self.timeout).with_accept_language(ACCEPT_LANGUAGE);
        if let Some(r) = &self.referer {
            req = req.with_referer(r.clone());
        }

        match self.fetcher.get(&req).await {
            Ok(body) => parse_item(url, &body),
            Err(e) => {
                tracing::warn!(
                    target: "scan",
                    error = ?e,
                    url = %url,
                    "detail fetch failed, using placeholder"
                );
                counter!("extract_fetch_errors_total").increment(1);
                ItemRecord::placeholder(url)
            }
        }
    }
}

/// Build a record from a detail page. Missing fields stay `None`; reward
/// falls back to the "not listed" sentinel.
pub fn parse_item(url: &str, html: &str) -> ItemRecord {
    let doc = Html::parse_document(html);
    let lines = block_lines(&doc);

    ItemRecord {
        id: url.to_string(),
        title: find_title(&doc).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        reward: reward::find_reward(&lines),
        deadline: find_deadline(&lines),
        proof: proof::find_proof(&doc),
        summary: summary::find_summary(&doc),
        action_url: action::find_action_url(&doc, url),
    }
}

fn find_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("h1").expect("static selector");
    let h1 = doc.select(&sel).next()?;
    let t = clean_text(&h1.text().collect::<Vec<_>>().join(" "));
    (!t.is_empty()).then_some(t)
}

const DEADLINE_LABEL_WORDS: &[&str] = &[
    "claim", "claims", "filing", "submission", "final", "the", "deadline", "date",
];

/// First line mentioning a deadline; the value after its colon, or the line.
/// A bare "Claim Deadline" heading takes its value from the next block.
pub fn find_deadline(lines: &[String]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        if !line.to_lowercase().contains("deadline") {
            continue;
        }
        let value = value_after_colon(line);
        if !value.is_empty() && !is_bare_label(&value, DEADLINE_LABEL_WORDS) {
            return Some(value);
        }
        if let Some(next) = following_line(lines, i) {
            if !is_bare_label(next, DEADLINE_LABEL_WORDS) {
                return Some(next.to_string());
            }
        }
    }
    None
}

fn block_lines(doc: &Html) -> Vec<String> {
    let sel = Selector::parse(LINE_SELECTOR).expect("static selector");
    doc.select(&sel)
        .map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixture::FixtureFetcher;
    use crate::ingest::types::REWARD_NOT_LISTED;

    const URL: &str = "https://www.openclassactions.com/settlements/acme.php";

    #[test]
    fn title_falls_back_when_h1_missing_or_blank() {
        let r = parse_item(URL, "<h1>  </h1><p>hi</p>");
        assert_eq!(r.title, DEFAULT_TITLE);
        let r = parse_item(URL, "<h1>Acme  Data\nBreach</h1>");
        assert_eq!(r.title, "Acme Data Breach");
    }

    #[test]
    fn deadline_after_colon_or_whole_line() {
        let l = vec!["Claim Deadline: 12/31/2026".to_string()];
        assert_eq!(find_deadline(&l).as_deref(), Some("12/31/2026"));
        let l = vec!["Deadline:".to_string(), "The deadline is May 1".to_string()];
        assert_eq!(find_deadline(&l).as_deref(), Some("The deadline is May 1"));
        assert_eq!(find_deadline(&[]), None);
    }

    #[test]
    fn deadline_heading_takes_next_block() {
        let l = vec!["Claim Deadline".to_string(), "12/31/2026".to_string()];
        assert_eq!(find_deadline(&l).as_deref(), Some("12/31/2026"));
        let l = vec!["Deadline".to_string()];
        assert_eq!(find_deadline(&l), None);

        let r = parse_item(
            URL,
            "<h1>Acme</h1><h3>Settlement Award</h3><p>Up to $50</p>\
             <h3>Claim Deadline</h3><p>12/31/2026</p>",
        );
        assert_eq!(r.reward, "Up to $50");
        assert_eq!(r.deadline.as_deref(), Some("12/31/2026"));
    }

    #[test]
    fn bare_page_gets_sentinel_reward_and_no_options() {
        let r = parse_item(URL, "<html><body><div>nothing</div></body></html>");
        assert_eq!(r.id, URL);
        assert_eq!(r.reward, REWARD_NOT_LISTED);
        assert!(r.deadline.is_none());
        assert!(r.proof.is_none());
        assert!(r.summary.is_none());
        assert!(r.action_url.is_none());
    }

    #[test]
    fn jitter_sample_stays_in_range() {
        let j = Jitter { min_ms: 10, max_ms: 20 };
        for _ in 0..50 {
            let d = j.sample().as_millis();
            assert!((10..=20).contains(&d));
        }
        let fixed = Jitter { min_ms: 5, max_ms: 5 };
        assert_eq!(fixed.sample(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_placeholder() {
        let fetcher = Arc::new(FixtureFetcher::new());
        let ex = Extractor::new(fetcher.clone(), Duration::from_secs(1));
        let r = ex.extract(URL).await;
        assert_eq!(r, ItemRecord::placeholder(URL));
        assert_eq!(fetcher.requested_urls(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn detail_requests_carry_referer_and_language() {
        let fetcher = Arc::new(FixtureFetcher::new().with_page(URL, "<h1>Acme</h1>"));
        let ex = Extractor::new(fetcher.clone(), Duration::from_secs(25))
            .with_referer("https://www.openclassactions.com/settlements.php");
        let r = ex.extract(URL).await;
        assert_eq!(r.title, "Acme");

        let reqs = fetcher.requests.lock().unwrap();
        assert_eq!(reqs[0].referer.as_deref(), Some("https://www.openclassactions.com/settlements.php"));
        assert_eq!(reqs[0].accept_language.as_deref(), Some(ACCEPT_LANGUAGE));
        assert_eq!(reqs[0].timeout, Duration::from_secs(25));
    }
}
