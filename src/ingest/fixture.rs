// src/ingest/fixture.rs
//! In-memory fetcher for tests and offline demos: serves canned bodies by URL
//! and records every request it sees.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::ingest::types::{FetchRequest, Fetcher};

#[derive(Default)]
pub struct FixtureFetcher {
    pages: Mutex<HashMap<String, String>>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.set_page(url, body);
        self
    }

    /// Insert or replace a page; lets tests change the origin between runs.
    pub fn set_page(&self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.lock().expect("fixture mutex poisoned").insert(url.into(), body.into());
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("fixture mutex poisoned")
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn get(&self, req: &FetchRequest) -> Result<String> {
        self.requests.lock().expect("fixture mutex poisoned").push(req.clone());
        self.pages
            .lock()
            .expect("fixture mutex poisoned")
            .get(&req.url)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {}", req.url))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
