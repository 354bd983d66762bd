//! Core record types for sitrep.
//!
//! This module defines the normalized shapes that every ingestion path
//! (feed, JSON, CSV) converges on, plus the user-maintained records
//! (incidents, SOP notes) and the filter settings applied to the event set.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lowest allowed severity.
pub const SEVERITY_MIN: u8 = 1;

/// Highest allowed severity.
pub const SEVERITY_MAX: u8 = 5;

/// Clamp a raw severity value into the 1..=5 range.
///
/// Values at or below zero become 1, matching the "default 1" rule for
/// records that carry no usable severity signal.
#[must_use]
pub fn clamp_severity(raw: i64) -> u8 {
    if raw < i64::from(SEVERITY_MIN) {
        SEVERITY_MIN
    } else if raw > i64::from(SEVERITY_MAX) {
        SEVERITY_MAX
    } else {
        // raw is within 1..=5 here
        u8::try_from(raw).unwrap_or(SEVERITY_MIN)
    }
}

/// Clamp a float severity (as carried by loose JSON/CSV inputs) into the
/// 1..=5 range, truncating the fraction.
#[must_use]
pub fn clamp_severity_f64(raw: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    let truncated = raw as i64;
    clamp_severity(truncated)
}

/// Generate a short random identifier component (lowercase base-36).
#[must_use]
pub fn random_component(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate a prefixed random identifier, e.g. `inc-k3x9ql`.
#[must_use]
pub fn random_id(prefix: &str) -> String {
    format!("{prefix}-{}", random_component(6))
}

/// Derive a display label for a feed source from its URL.
///
/// Returns the hostname with a leading `www.` stripped, or the raw URL if
/// the hostname cannot be parsed.
#[must_use]
pub fn source_label(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .map_or_else(
            || url.to_string(),
            |host| host.strip_prefix("www.").unwrap_or(&host).to_string(),
        )
}

/// A normalized situational-awareness event.
///
/// Events are append-only within a session: once inserted they are never
/// mutated, except by a wholesale snapshot restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Unique identifier. Uniqueness is enforced at insertion time.
    pub id: String,
    /// Event title.
    pub title: String,
    /// Event category (e.g. "Security", "Natural Hazard").
    pub category: String,
    /// Severity rating, 1 (lowest) to 5 (highest).
    pub severity: u8,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Country name, possibly empty when unknown.
    pub country: String,
    /// Origin label (feed hostname, "CSV", etc.).
    pub source: String,
    /// Link back to the originating article, or empty.
    pub link: String,
    /// Timestamp as carried by the source (ISO-8601 or RSS date string);
    /// defaults to ingestion time when the source has none.
    pub timestamp: String,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: "Untitled".to_string(),
            category: "Unknown".to_string(),
            severity: SEVERITY_MIN,
            lat: 0.0,
            lon: 0.0,
            country: String::new(),
            source: String::new(),
            link: String::new(),
            timestamp: String::new(),
        }
    }
}

impl Event {
    /// Check whether this event carries a usable location.
    ///
    /// The (0, 0) origin is the "no location resolved" sentinel.
    #[must_use]
    pub fn has_location(&self) -> bool {
        self.lat != 0.0 || self.lon != 0.0
    }

    /// Parse the event timestamp leniently.
    ///
    /// Accepts RFC 3339 first, then RFC 2822 (the RSS `pubDate` format).
    /// Returns `None` for anything else.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse a source timestamp string (RFC 3339, then RFC 2822).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A tracked asset (facility, vehicle, site).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Asset type (e.g. "office", "warehouse").
    pub kind: String,
    /// Owning organization.
    pub owner: String,
    /// Country name, possibly empty.
    pub country: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// A tracked person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role description.
    pub role: String,
    /// Current status (e.g. "ok", "unreachable").
    pub status: String,
    /// Country name, possibly empty.
    pub country: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// A tracked incident, optionally linked to the event that triggered it.
///
/// The event link is a bare identifier with no referential integrity:
/// dangling links are tolerated and rendered as "none"/as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier.
    pub id: String,
    /// Incident title.
    pub title: String,
    /// Severity rating, 1 to 5.
    pub severity: u8,
    /// Workflow status (e.g. "open", "monitoring", "closed").
    pub status: String,
    /// Free-text notes.
    pub notes: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Identifier of the originating event, if any.
    pub linked_event_id: Option<String>,
}

impl Incident {
    /// Create a new incident from user-supplied fields.
    #[must_use]
    pub fn new(title: String, severity: u8, status: String, notes: String) -> Self {
        Self {
            id: random_id("inc"),
            title,
            severity: clamp_severity(i64::from(severity)),
            status,
            notes,
            created_at: Utc::now().to_rfc3339(),
            linked_event_id: None,
        }
    }

    /// Auto-derive an incident from an event, carrying over its title and
    /// severity and linking back to the event identifier.
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: random_id("inc"),
            title: event.title.clone(),
            severity: event.severity,
            status: "open".to_string(),
            notes: format!("Auto-created from event {}", event.id),
            created_at: Utc::now().to_rfc3339(),
            linked_event_id: Some(event.id.clone()),
        }
    }

    /// The linked event id for display, or "none".
    #[must_use]
    pub fn linked_event_label(&self) -> &str {
        self.linked_event_id.as_deref().unwrap_or("none")
    }
}

/// A standard-operating-procedure note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopNote {
    /// Unique identifier.
    pub id: String,
    /// Note body.
    pub text: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl SopNote {
    /// Create a new SOP note.
    #[must_use]
    pub fn new(text: String) -> Self {
        Self {
            id: random_id("sop"),
            text,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A configured feed source.
///
/// Feeds are configuration entries, not data; only the enabled flag is
/// mutated, by user toggling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    /// Feed URL.
    pub url: String,
    /// Whether this feed participates in batch fetches.
    pub enabled: bool,
    /// Display label derived from the URL hostname.
    pub label: String,
}

impl Feed {
    /// Create an enabled feed entry for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let label = source_label(&url);
        Self {
            url,
            enabled: true,
            label,
        }
    }
}

/// Filter settings applied to the event collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Minimum severity to include.
    pub min_severity: u8,
    /// Keyword filter: whitespace-separated tokens, an event matches if ANY
    /// token appears in its title, category, or source (case-insensitive).
    pub keyword: String,
    /// Country filter: when non-empty, only these countries are included.
    pub countries: Vec<String>,
    /// Time window in hours; 0 disables the window.
    pub time_window_hours: u64,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            min_severity: SEVERITY_MIN,
            keyword: String::new(),
            countries: Vec::new(),
            time_window_hours: 72,
        }
    }
}

impl Filters {
    /// Check whether an event passes all active filters at time `now`.
    ///
    /// An event with an unparseable timestamp fails an active time window,
    /// matching the reference behavior.
    #[must_use]
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        if event.severity < self.min_severity {
            return false;
        }

        if !self.keyword.is_empty() {
            let haystack = format!("{} {} {}", event.title, event.category, event.source);
            if !keyword_match(&haystack, &self.keyword) {
                return false;
            }
        }

        if !self.countries.is_empty() && !self.countries.contains(&event.country) {
            return false;
        }

        if self.time_window_hours > 0 {
            let Some(ts) = event.parsed_timestamp() else {
                return false;
            };
            let age = now.signed_duration_since(ts);
            if age.num_seconds() > i64::try_from(self.time_window_hours * 3600).unwrap_or(i64::MAX)
            {
                return false;
            }
        }

        true
    }
}

/// ANY-token keyword match: true if any whitespace-separated token of
/// `keyword` appears in `haystack` (case-insensitive). An empty keyword
/// matches everything.
#[must_use]
pub fn keyword_match(haystack: &str, keyword: &str) -> bool {
    let tokens: Vec<String> = keyword
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    if tokens.is_empty() {
        return true;
    }
    let hay = haystack.to_lowercase();
    tokens.iter().any(|t| hay.contains(t))
}
