//! Error types for sitrep.
//!
//! This module defines all error types used throughout the sitrep crate.
//! Ingestion failures are deliberately coarse and non-fatal: a failed feed
//! or a malformed user input never takes down the session, it is reported
//! and the session continues.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sitrep operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Feed Errors ===
    /// A feed could not be fetched over the network.
    #[error("failed to fetch feed {url}: {source}")]
    FeedFetch {
        /// The feed URL that failed.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// A feed URL (or the configured proxy prefix) could not be parsed.
    #[error("invalid feed URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A feed URL was empty.
    #[error("feed URL must not be empty")]
    EmptyUrl,

    // === Ingestion Errors ===
    /// User-supplied JSON (paste or file upload) failed to parse.
    /// The input is abandoned wholesale; no partial state change occurs.
    #[error("JSON input error: {0}")]
    JsonInput(#[from] serde_json::Error),

    /// User-supplied CSV failed to parse.
    #[error("CSV input error at line {line}: {message}")]
    CsvInput {
        /// 1-based line where parsing failed.
        line: usize,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Polling Errors ===
    /// The polling interval was below the 1 minute minimum.
    /// Starting the poller is aborted.
    #[error("poll interval must be at least 1 minute, got {minutes}")]
    InvalidInterval {
        /// The rejected interval in minutes.
        minutes: u64,
    },

    // === Snapshot Errors ===
    /// No saved snapshot exists at the given path.
    /// Informational when loading; the session keeps its current state.
    #[error("no saved snapshot found at {path}")]
    SnapshotMissing {
        /// Path that was checked.
        path: PathBuf,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for sitrep operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid-URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new CSV input error.
    #[must_use]
    pub fn csv_input(line: usize, message: impl Into<String>) -> Self {
        Self::CsvInput {
            line,
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means no snapshot has been saved yet.
    ///
    /// Callers treat this as an informational outcome, not a failure.
    #[must_use]
    pub fn is_snapshot_missing(&self) -> bool {
        matches!(self, Self::SnapshotMissing { .. })
    }

    /// Check if this error is a per-feed fetch failure.
    ///
    /// Fetch failures are isolated to the feed that caused them and never
    /// halt a batch.
    #[must_use]
    pub fn is_feed_fetch(&self) -> bool {
        matches!(self, Self::FeedFetch { .. })
    }
}
