// src/ingest/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;

use crate::ingest::types::{FetchRequest, Fetcher};

/// Desktop browser user agent; the site serves a stripped page to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, req: &FetchRequest) -> Result<String> {
        let mut rb = self.client.get(&req.url).timeout(req.timeout);
        if let Some(r) = &req.referer {
            rb = rb.header(REFERER, r);
        }
        if let Some(l) = &req.accept_language {
            rb = rb.header(ACCEPT_LANGUAGE, l);
        }

        let resp = rb
            .send()
            .await
            .with_context(|| format!("GET {}", req.url))?
            .error_for_status()
            .with_context(|| format!("GET {} non-2xx", req.url))?;
        resp.text()
            .await
            .with_context(|| format!("reading body of {}", req.url))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
