//! One scan: discover -> filter against the seen set -> extract -> emit -> commit.
//!
//! Items are handled strictly one at a time with a fixed pause between
//! emissions. Each id is committed right after its emission: a crash can
//! repeat at most the in-flight item, it can never drop one silently.

use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

use crate::extract::Extractor;
use crate::ingest::discovery::LinkDiscovery;
use crate::notify::Notifier;
use crate::seen::SeenStore;

pub struct Scanner {
    discovery: LinkDiscovery,
    extractor: Extractor,
    notifier: Arc<dyn Notifier>,
    seen: SeenStore,
    post_interval: Duration,
}

impl Scanner {
    pub fn new(
        discovery: LinkDiscovery,
        extractor: Extractor,
        notifier: Arc<dyn Notifier>,
        seen: SeenStore,
        post_interval: Duration,
    ) -> Self {
        Self {
            discovery,
            extractor,
            notifier,
            seen,
            post_interval,
        }
    }

    pub fn seen(&self) -> &SeenStore {
        &self.seen
    }

    /// Candidate links not yet seen, sorted, capped at `max_items`.
    pub async fn pending(&self, max_items: usize) -> Vec<String> {
        // BTreeSet iteration is already lexicographic.
        self.discovery
            .discover()
            .await
            .into_iter()
            .filter(|url| !self.seen.contains(url))
            .take(max_items)
            .collect()
    }

    /// Run one scan and return how many new items were emitted (and committed).
    pub async fn run(&mut self, max_items: usize) -> usize {
        counter!("scan_runs_total").increment(1);

        let new_links = self.pending(max_items).await;
        if new_links.is_empty() {
            tracing::info!(target: "scan", "no new settlements this cycle");
            return 0;
        }
        tracing::info!(target: "scan", count = new_links.len(), "new settlements to post");

        let total = new_links.len();
        for (i, url) in new_links.iter().enumerate() {
            if i > 0 && !self.post_interval.is_zero() {
                tokio::time::sleep(self.post_interval).await;
            }
            tracing::info!(target: "scan", n = i + 1, total, url = %url, "posting settlement");

            let record = self.extractor.extract(url).await;
            if let Err(e) = self.notifier.emit(&record).await {
                tracing::warn!(
                    target: "scan",
                    error = ?e,
                    notifier = self.notifier.name(),
                    url = %url,
                    "notifier failed; item still marked seen"
                );
                counter!("notify_errors_total").increment(1);
            }

            self.seen.add(record.id.clone());
            self.seen.persist();
            counter!("scan_items_emitted_total").increment(1);
        }
        total
    }
}
