//! `sitrep` - Situational-awareness feed aggregation
//!
//! This library ingests security and hazard events from RSS/Atom/JSON feeds,
//! geolocates them heuristically, and maintains the session state (events,
//! assets, people, incidents, SOP notes) behind the `sitrep` CLI.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod geo;
pub mod ingest;
pub mod logging;
pub mod poll;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use event::{Event, Filters, Incident};
pub use ingest::{FeedClient, IngestReport};
pub use logging::init_logging;
pub use poll::Poller;
pub use state::{AppState, Snapshot};
