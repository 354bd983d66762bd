//! Remote feed fetching and dispatch.
//!
//! A fetched body is tried as JSON first; only when JSON parsing fails does
//! the RSS/Atom scraper run. Fetches optionally go through a CORS-bypass
//! proxy prefix that receives the percent-encoded target URL as a query
//! parameter.
//!
//! All failures here are per-feed: one broken feed produces a failed
//! [`IngestReport`] and the batch moves on.

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ingest::{json, rss, IngestReport};
use crate::state::AppState;

/// Transport seam for fetching feed bodies.
///
/// The production implementation is [`HttpTransport`]; tests substitute
/// canned bodies without touching the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the raw response body at `url` as text.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the response cannot be
    /// read.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP transport backed by a shared reqwest client.
#[derive(Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let wrap = |source: reqwest::Error| Error::FeedFetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(wrap)?;
        let response = response.error_for_status().map_err(wrap)?;
        response.text().await.map_err(wrap)
    }
}

/// Client that turns feed URLs into normalized events in shared state.
pub struct FeedClient {
    transport: Box<dyn Transport>,
    proxy_prefix: Option<String>,
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("proxy_prefix", &self.proxy_prefix)
            .finish_non_exhaustive()
    }
}

impl FeedClient {
    /// Create a client using the HTTP transport.
    #[must_use]
    pub fn new(proxy_prefix: Option<String>) -> Self {
        Self::with_transport(Box::new(HttpTransport::default()), proxy_prefix)
    }

    /// Create a client with a custom transport (used by tests).
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>, proxy_prefix: Option<String>) -> Self {
        Self {
            transport,
            proxy_prefix,
        }
    }

    /// Rewrite a target URL through the proxy prefix, when one is set.
    ///
    /// The target is attached percent-encoded as the `url` query parameter.
    fn request_url(&self, target: &str) -> Result<String> {
        match &self.proxy_prefix {
            Some(prefix) => Url::parse_with_params(prefix, &[("url", target)])
                .map(Into::into)
                .map_err(|e| Error::invalid_url(prefix.clone(), e.to_string())),
            None => Ok(target.to_string()),
        }
    }

    /// Ingest one feed URL into shared state.
    ///
    /// Never returns an error: fetch and parse failures are folded into the
    /// report so callers can keep iterating a batch.
    pub async fn ingest(&self, state: &mut AppState, url: &str) -> IngestReport {
        match self.try_ingest(state, url).await {
            Ok(report) => report,
            Err(err) => {
                warn!(feed = %url, "feed ingestion failed: {err}");
                IngestReport::failed(url, err.to_string())
            }
        }
    }

    async fn try_ingest(&self, state: &mut AppState, url: &str) -> Result<IngestReport> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::EmptyUrl);
        }

        let request_url = self.request_url(url)?;
        debug!(feed = %url, request = %request_url, "fetching feed");
        let body = self.transport.fetch_text(&request_url).await?;
        Ok(ingest_body(state, url, &body))
    }

    /// Ingest all enabled feeds, sequentially.
    ///
    /// Feeds are processed one at a time in configuration order; a single
    /// feed's failure does not halt the batch.
    pub async fn ingest_all(&self, state: &mut AppState) -> Vec<IngestReport> {
        let enabled: Vec<String> = state
            .feeds
            .iter()
            .filter(|f| f.enabled)
            .map(|f| f.url.clone())
            .collect();

        if enabled.is_empty() {
            info!("no feeds enabled");
            return Vec::new();
        }

        info!("fetching {} feeds", enabled.len());
        let mut reports = Vec::with_capacity(enabled.len());
        for url in enabled {
            reports.push(self.ingest(state, &url).await);
        }

        let added: usize = reports.iter().map(|r| r.added).sum();
        let failures = reports.iter().filter(|r| r.is_failure()).count();
        info!(
            "batch complete: {added} new events, {failures} failed feeds of {}",
            reports.len()
        );
        reports
    }
}

/// Normalize and merge one fetched body.
///
/// JSON is tried first; a body that parses as JSON is final even when it
/// contains no events. Everything else goes through the RSS/Atom scraper.
pub fn ingest_body(state: &mut AppState, url: &str, body: &str) -> IngestReport {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let (parsed, events) = json::events_from_value(&value);
        let added = state.add_events(events);
        return IngestReport::ok(url, parsed, added);
    }

    let feed = rss::parse(body, url);
    let parsed = feed.items_found;
    let added = state.add_events(feed.events);
    IngestReport::ok(url, parsed, added)
}
