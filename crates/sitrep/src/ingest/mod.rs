//! Feed ingestion and normalization.
//!
//! Every ingestion path converges on the same normalized [`crate::event::Event`]
//! shape and merges into shared state through the identifier-deduplicated
//! append:
//!
//! - [`feed`] fetches a remote URL and dispatches to JSON or RSS parsing,
//! - [`rss`] scrapes `item`/`entry` elements out of RSS/Atom payloads,
//! - [`json`] ingests user-supplied JSON (array or envelope form),
//! - [`csv`] ingests delimited files with a recognized header row.

pub mod csv;
pub mod feed;
pub mod json;
pub mod rss;

pub use feed::{FeedClient, HttpTransport, Transport};

/// Outcome of ingesting one feed URL.
///
/// Failures are per-feed: a report with an error set never aborts the batch
/// that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// The feed URL this report covers.
    pub feed: String,
    /// Number of event-like elements found in the payload.
    pub parsed: usize,
    /// Number of events actually merged (post geolocation drop and dedup).
    pub added: usize,
    /// Fetch or parse failure, when the feed produced nothing at all.
    pub error: Option<String>,
}

impl IngestReport {
    /// Build a report for a successfully parsed feed.
    #[must_use]
    pub fn ok(feed: impl Into<String>, parsed: usize, added: usize) -> Self {
        Self {
            feed: feed.into(),
            parsed,
            added,
            error: None,
        }
    }

    /// Build a report for a failed feed.
    #[must_use]
    pub fn failed(feed: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            feed: feed.into(),
            parsed: 0,
            added: 0,
            error: Some(error.into()),
        }
    }

    /// Whether the feed fetch/parse failed outright.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the feed succeeded but yielded no usable events.
    ///
    /// This is an informational outcome, not an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.added == 0
    }
}
