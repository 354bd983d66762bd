//! Export formats.
//!
//! Events export as CSV or pretty JSON; incidents, SOP notes, and the
//! configuration snapshot export as pretty JSON. CSV quoting follows the
//! reference behavior: a field containing a comma is wrapped in quotes with
//! inner quote characters doubled, all other fields are emitted raw.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::{Event, Filters, Incident, SopNote};
use crate::state::AppState;

/// Column order for event CSV exports.
const EVENT_COLUMNS: [&str; 10] = [
    "id",
    "title",
    "category",
    "severity",
    "lat",
    "lon",
    "country",
    "source",
    "link",
    "timestamp",
];

/// Escape one CSV field: wrap when it contains a comma, doubling any inner
/// quote characters.
fn escape(field: &str) -> String {
    if field.contains(',') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render events as CSV with a header row.
#[must_use]
pub fn events_to_csv(events: &[&Event]) -> String {
    let mut out = EVENT_COLUMNS.join(",");
    out.push('\n');

    for event in events {
        let row = [
            escape(&event.id),
            escape(&event.title),
            escape(&event.category),
            event.severity.to_string(),
            event.lat.to_string(),
            event.lon.to_string(),
            escape(&event.country),
            escape(&event.source),
            escape(&event.link),
            escape(&event.timestamp),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Render events as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn events_to_json(events: &[&Event]) -> Result<String> {
    Ok(serde_json::to_string_pretty(events)?)
}

/// Render incidents as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn incidents_to_json(incidents: &[Incident]) -> Result<String> {
    Ok(serde_json::to_string_pretty(incidents)?)
}

/// Render SOP notes as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn sops_to_json(sops: &[SopNote]) -> Result<String> {
    Ok(serde_json::to_string_pretty(sops)?)
}

/// The exportable configuration snapshot: role and filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigExport {
    /// Active role profile.
    pub role: String,
    /// Active filter settings.
    pub filters: Filters,
}

/// Render the session's configuration snapshot as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn config_to_json(state: &AppState) -> Result<String> {
    let export = ConfigExport {
        role: state.role.clone(),
        filters: state.filters.clone(),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            id: "e1".to_string(),
            title: "Roadblock near Niamey".to_string(),
            category: "Security".to_string(),
            severity: 2,
            lat: 13.512,
            lon: 2.112,
            country: "Niger".to_string(),
            source: "example.org".to_string(),
            link: "https://example.org/1".to_string(),
            timestamp: "2026-08-01T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_csv_header_and_row() {
        let ev = sample_event();
        let csv = events_to_csv(&[&ev]);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,title,category,severity,lat,lon,country,source,link,timestamp"
        );
        assert_eq!(
            lines.next().unwrap(),
            "e1,Roadblock near Niamey,Security,2,13.512,2.112,Niger,example.org,https://example.org/1,2026-08-01T12:00:00Z"
        );
    }

    #[test]
    fn test_csv_quotes_fields_with_commas() {
        let mut ev = sample_event();
        ev.title = "Clash, with \"casualties\", reported".to_string();
        let csv = events_to_csv(&[&ev]);

        assert!(csv.contains("\"Clash, with \"\"casualties\"\", reported\""));
    }

    #[test]
    fn test_csv_leaves_comma_free_fields_raw() {
        let mut ev = sample_event();
        ev.title = "Plain \"quoted\" title".to_string();
        let csv = events_to_csv(&[&ev]);

        // No comma, so no wrapping and no doubling
        assert!(csv.contains("Plain \"quoted\" title"));
    }

    #[test]
    fn test_csv_empty_event_list() {
        let csv = events_to_csv(&[]);
        assert_eq!(
            csv,
            "id,title,category,severity,lat,lon,country,source,link,timestamp\n"
        );
    }

    #[test]
    fn test_events_json_round_trips() {
        let ev = sample_event();
        let json = events_to_json(&[&ev]).unwrap();
        let parsed: Vec<Event> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![ev]);
    }

    #[test]
    fn test_incidents_json() {
        let inc = Incident::new("Test".to_string(), 3, "open".to_string(), String::new());
        let json = incidents_to_json(&[inc]).unwrap();
        assert!(json.contains("\"status\": \"open\""));
    }

    #[test]
    fn test_config_export() {
        let mut state = AppState::default();
        state.role = "ops".to_string();
        state.filters.keyword = "flood".to_string();

        let json = config_to_json(&state).unwrap();
        assert!(json.contains("\"role\": \"ops\""));
        assert!(json.contains("\"keyword\": \"flood\""));
    }
}
