//! JSON ingestion.
//!
//! Two callers share this module: the feed path (a fetched body that turned
//! out to be JSON) and the direct path (file upload or raw paste). Both
//! accept either a top-level array of event-like objects or an envelope
//! object; the direct path additionally honors the optional `assets` and
//! `people` arrays.
//!
//! Normalization is per-item and tolerant: an object missing its identifier
//! or numeric coordinates is skipped, everything else falls back to field
//! defaults. Malformed JSON on the direct path is an error and the whole
//! input is abandoned.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::event::{clamp_severity_f64, Asset, Event, Person};

/// Collections parsed out of one JSON document.
#[derive(Debug, Default, PartialEq)]
pub struct JsonBatch {
    /// Normalized events.
    pub events: Vec<Event>,
    /// Tracked assets.
    pub assets: Vec<Asset>,
    /// Tracked people.
    pub people: Vec<Person>,
}

/// Parse a user-supplied JSON document (paste or file upload).
///
/// # Errors
///
/// Returns an error when the text is not valid JSON; no partial batch is
/// produced in that case.
pub fn parse_str(text: &str) -> Result<JsonBatch> {
    let value: Value = serde_json::from_str(text)?;
    Ok(parse_value(&value))
}

/// Parse an already-decoded JSON value into a batch.
#[must_use]
pub fn parse_value(value: &Value) -> JsonBatch {
    let mut batch = JsonBatch::default();

    match value {
        Value::Array(items) => {
            batch.events = normalize_events(items);
        }
        Value::Object(obj) => {
            if let Some(Value::Array(items)) = obj.get("events") {
                batch.events = normalize_events(items);
            }
            if let Some(Value::Array(items)) = obj.get("assets") {
                batch.assets = typed_records(items);
            }
            if let Some(Value::Array(items)) = obj.get("people") {
                batch.people = typed_records(items);
            }
        }
        _ => {}
    }

    batch
}

/// Feed-path interpretation: a top-level array, or an object carrying an
/// `events` array. Returns the raw element count alongside the events that
/// normalized successfully.
#[must_use]
pub fn events_from_value(value: &Value) -> (usize, Vec<Event>) {
    let items = match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => match obj.get("events") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    };

    match items {
        Some(items) => (items.len(), normalize_events(items)),
        None => (0, Vec::new()),
    }
}

fn normalize_events(items: &[Value]) -> Vec<Event> {
    items.iter().filter_map(normalize_event).collect()
}

/// Normalize one event-like object.
///
/// Requires an identifier and numeric `lat`/`lon`; all other fields default.
#[must_use]
pub fn normalize_event(value: &Value) -> Option<Event> {
    let obj = value.as_object()?;
    let id = id_of(obj)?;
    let lat = obj.get("lat").and_then(Value::as_f64)?;
    let lon = obj.get("lon").and_then(Value::as_f64)?;

    Some(Event {
        id,
        title: string_or(obj, "title", "Untitled"),
        category: string_or(obj, "category", "Unknown"),
        severity: severity_of(obj),
        lat,
        lon,
        country: string_or(obj, "country", ""),
        source: string_or(obj, "source", ""),
        link: string_or(obj, "link", ""),
        timestamp: timestamp_of(obj),
    })
}

/// Deserialize a list of serde-typed records, skipping items that fail and
/// items without an identifier.
fn typed_records<T>(items: &[Value]) -> Vec<T>
where
    T: serde::de::DeserializeOwned + HasId,
{
    items
        .iter()
        .filter_map(|v| serde_json::from_value::<T>(v.clone()).ok())
        .filter(|r| !r.id().is_empty())
        .collect()
}

/// Records that carry an identifier.
trait HasId {
    fn id(&self) -> &str;
}

impl HasId for Asset {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for Person {
    fn id(&self) -> &str {
        &self.id
    }
}

fn id_of(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

fn severity_of(obj: &Map<String, Value>) -> u8 {
    let raw = match obj.get("severity") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.map_or(1, clamp_severity_f64)
}

fn timestamp_of(obj: &Map<String, Value>) -> String {
    match obj.get("timestamp") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => Utc::now().to_rfc3339(),
    }
}
