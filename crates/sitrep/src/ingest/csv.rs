//! CSV ingestion.
//!
//! Parses a delimited file with a header row into normalized events. Any
//! subset of the recognized columns may be present; missing columns take
//! the same defaults as the JSON path. Quoted fields may contain commas,
//! newlines, and doubled quote characters.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::event::{clamp_severity_f64, random_id, Event};

/// Recognized header names per field. Matching is case-insensitive.
const ID_COLUMNS: &[&str] = &["id", "identifier"];
const TITLE_COLUMNS: &[&str] = &["title"];
const CATEGORY_COLUMNS: &[&str] = &["category"];
const SEVERITY_COLUMNS: &[&str] = &["severity"];
const LAT_COLUMNS: &[&str] = &["lat", "latitude"];
const LON_COLUMNS: &[&str] = &["lon", "lng", "longitude"];
const COUNTRY_COLUMNS: &[&str] = &["country"];
const SOURCE_COLUMNS: &[&str] = &["source"];
const LINK_COLUMNS: &[&str] = &["link", "url"];
const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "time", "date"];

/// Parse CSV text into normalized events.
///
/// Rows without parseable numeric coordinates are skipped; rows without an
/// identifier get a synthesized `csv-` one. The source field defaults to
/// `"CSV"`.
///
/// # Errors
///
/// Returns an error when the text has no header row or a quoted field is
/// left unterminated. The whole input is abandoned in that case.
pub fn parse_events(text: &str) -> Result<Vec<Event>> {
    let records = parse_records(text)?;
    let mut rows = records.into_iter();

    let header = rows.next().ok_or_else(|| Error::csv_input(1, "missing header row"))?;
    let columns: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

    let find = |names: &[&str]| -> Option<usize> {
        columns.iter().position(|c| names.contains(&c.as_str()))
    };

    let id_col = find(ID_COLUMNS);
    let title_col = find(TITLE_COLUMNS);
    let category_col = find(CATEGORY_COLUMNS);
    let severity_col = find(SEVERITY_COLUMNS);
    let lat_col = find(LAT_COLUMNS);
    let lon_col = find(LON_COLUMNS);
    let country_col = find(COUNTRY_COLUMNS);
    let source_col = find(SOURCE_COLUMNS);
    let link_col = find(LINK_COLUMNS);
    let timestamp_col = find(TIMESTAMP_COLUMNS);

    let cell = |row: &[String], col: Option<usize>| -> Option<String> {
        col.and_then(|i| row.get(i))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let events = rows
        .filter(|row| row.iter().any(|v| !v.trim().is_empty()))
        .filter_map(|row| {
            let lat = cell(&row, lat_col)?.parse::<f64>().ok()?;
            let lon = cell(&row, lon_col)?.parse::<f64>().ok()?;

            Some(Event {
                id: cell(&row, id_col).unwrap_or_else(|| random_id("csv")),
                title: cell(&row, title_col).unwrap_or_else(|| "Untitled".to_string()),
                category: cell(&row, category_col).unwrap_or_else(|| "Unknown".to_string()),
                severity: cell(&row, severity_col)
                    .and_then(|v| v.parse::<f64>().ok())
                    .map_or(1, clamp_severity_f64),
                lat,
                lon,
                country: cell(&row, country_col).unwrap_or_default(),
                source: cell(&row, source_col).unwrap_or_else(|| "CSV".to_string()),
                link: cell(&row, link_col).unwrap_or_default(),
                timestamp: cell(&row, timestamp_col).unwrap_or_else(|| Utc::now().to_rfc3339()),
            })
        })
        .collect();

    Ok(events)
}

/// Split CSV text into records of fields.
///
/// Handles quoted fields with embedded commas/newlines and doubled quote
/// escapes.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => {
                    record.push(std::mem::take(&mut field));
                }
                '\r' => {
                    // swallowed; the \n that follows ends the record
                }
                '\n' => {
                    line += 1;
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(Error::csv_input(line, "unterminated quoted field"));
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let text = "id,title,category,severity,lat,lon,country,source,link,timestamp\n\
                    e1,Roadblock,Security,2,13.512,2.112,Niger,patrol,https://x.org/1,2026-08-01T12:00:00Z\n";
        let events = parse_events(text).unwrap();

        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.id, "e1");
        assert_eq!(ev.title, "Roadblock");
        assert_eq!(ev.severity, 2);
        assert_eq!(ev.lat, 13.512);
        assert_eq!(ev.country, "Niger");
        assert_eq!(ev.source, "patrol");
    }

    #[test]
    fn test_column_subset_uses_defaults() {
        let text = "lat,lon\n5.6037,-0.187\n";
        let events = parse_events(text).unwrap();

        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert!(ev.id.starts_with("csv-"));
        assert_eq!(ev.title, "Untitled");
        assert_eq!(ev.category, "Unknown");
        assert_eq!(ev.severity, 1);
        assert_eq!(ev.source, "CSV");
        assert!(ev.parsed_timestamp().is_some());
    }

    #[test]
    fn test_alias_headers() {
        let text = "identifier,latitude,longitude\nE-9,1.5,2.5\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events[0].id, "E-9");
        assert_eq!(events[0].lat, 1.5);
        assert_eq!(events[0].lon, 2.5);
    }

    #[test]
    fn test_quoted_field_with_comma_and_doubled_quote() {
        let text = "id,title,lat,lon\ne1,\"Clash, reported \"\"north\"\"\",1.0,2.0\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events[0].title, "Clash, reported \"north\"");
    }

    #[test]
    fn test_row_without_coordinates_skipped() {
        let text = "id,lat,lon\nbad,,\nbad2,abc,def\nok,1.0,2.0\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "ok");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let text = "id,lat,lon\n\ne1,1.0,2.0\n\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_crlf_records() {
        let text = "id,lat,lon\r\ne1,1.0,2.0\r\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e1");
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(parse_events("").is_err());
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let text = "id,title,lat,lon\ne1,\"broken,1.0,2.0\n";
        let err = parse_events(text).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_severity_out_of_range_clamped() {
        let text = "id,severity,lat,lon\ne1,11,1.0,2.0\ne2,-2,1.0,2.5\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events[0].severity, 5);
        assert_eq!(events[1].severity, 1);
    }
}
