// src/ingest/discovery.rs
//! Link discovery: one index page in, a set of canonical item URLs out.

use metrics::counter;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::ingest::types::{FetchRequest, Fetcher};

/// Shape of an item detail page path, e.g. `/settlements/acme-data-breach.php`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPathRule {
    pub segment: String,
    pub suffix: String,
}

impl Default for ItemPathRule {
    fn default() -> Self {
        Self {
            segment: "/settlements/".to_string(),
            suffix: ".php".to_string(),
        }
    }
}

impl ItemPathRule {
    /// True when the path has a non-empty page name after the segment and ends with the suffix.
    pub fn matches(&self, path: &str) -> bool {
        let Some(pos) = path.find(&self.segment) else {
            return false;
        };
        let tail = &path[pos + self.segment.len()..];
        tail.len() > self.suffix.len() && tail.ends_with(&self.suffix)
    }
}

/// Resolve every anchor against `base_url` and keep the ones shaped like item pages.
/// Query and fragment are dropped so one page maps to one id.
pub fn extract_item_links(html: &str, base_url: &str, rule: &ItemPathRule) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let Ok(base) = Url::parse(base_url) else {
        return out;
    };

    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("static selector");

    for a in document.select(&anchors) {
        let Some(href) = a.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
        {
            continue;
        }
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        if !rule.matches(resolved.path()) {
            continue;
        }
        resolved.set_query(None);
        resolved.set_fragment(None);
        out.insert(resolved.to_string());
    }
    out
}

pub struct LinkDiscovery {
    fetcher: Arc<dyn Fetcher>,
    index_url: String,
    rule: ItemPathRule,
    timeout: Duration,
}

impl LinkDiscovery {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        index_url: impl Into<String>,
        rule: ItemPathRule,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            index_url: index_url.into(),
            rule,
            timeout,
        }
    }

    /// Fetch the index and return candidate item URLs. Any failure yields an
    /// empty set; the next scheduled tick is the retry.
    pub async fn discover(&self) -> BTreeSet<String> {
        let req = FetchRequest::new(&self.index_url, self.timeout);
        let body = match self.fetcher.get(&req).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(
                    target: "scan",
                    error = ?e,
                    fetcher = self.fetcher.name(),
                    url = %self.index_url,
                    "index fetch failed"
                );
                counter!("scan_index_errors_total").increment(1);
                return BTreeSet::new();
            }
        };

        let links = extract_item_links(&body, &self.index_url, &self.rule);
        tracing::info!(target: "scan", found = links.len(), "settlement links on index");
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.openclassactions.com/settlements.php";

    #[test]
    fn rule_requires_page_name_and_suffix() {
        let r = ItemPathRule::default();
        assert!(r.matches("/settlements/acme-breach.php"));
        assert!(!r.matches("/settlements/"));
        assert!(!r.matches("/settlements/.php"));
        assert!(!r.matches("/settlements.php"));
        assert!(!r.matches("/settlements/acme-breach.html"));
    }

    #[test]
    fn relative_and_absolute_links_resolve_and_dedup() {
        let html = r##"
            <a href="/settlements/acme.php">Acme</a>
            <a href="https://www.openclassactions.com/settlements/acme.php#claim">Acme again</a>
            <a href="settlements/zeta.php?utm=x">Zeta</a>
            <a href="/about.php">About</a>
            <a href="mailto:x@y.z">Mail</a>
            <a href="#top">Top</a>
        "##;
        let links = extract_item_links(html, BASE, &ItemPathRule::default());
        let v: Vec<_> = links.into_iter().collect();
        assert_eq!(
            v,
            vec![
                "https://www.openclassactions.com/settlements/acme.php".to_string(),
                "https://www.openclassactions.com/settlements/zeta.php".to_string(),
            ]
        );
    }

    #[test]
    fn bad_base_yields_nothing() {
        let html = "<a href='/settlements/a.php'>a</a>";
        let links = extract_item_links(html, "not a url", &ItemPathRule::default());
        assert!(links.is_empty());
    }
}
