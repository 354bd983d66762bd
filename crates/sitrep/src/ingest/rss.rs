//! RSS/Atom feed scraping.
//!
//! Best-effort tag scraping over both RSS (`item`) and Atom (`entry`)
//! dialects. Namespaced geo extensions are matched by local name, so
//! `georss:point` and plain `point`, or `geo:lat` and `latitude`, are all
//! recognized. Malformed XML ends the scan; whatever parsed up to that
//! point is kept.

use chrono::Utc;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use tracing::debug;

use crate::event::{random_component, source_label, Event};
use crate::geo::{self, GeoHints};

/// Severity assigned to all RSS-derived events; RSS carries no severity
/// signal.
const RSS_SEVERITY: u8 = 2;

/// Result of parsing one feed body.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    /// Number of `item`/`entry` elements found in the payload.
    pub items_found: usize,
    /// Normalized events that resolved a usable location.
    pub events: Vec<Event>,
}

/// Raw fields scraped from one `item`/`entry` element.
#[derive(Debug, Default, Clone)]
struct RawItem {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    link: Option<String>,
    published: Option<String>,
    point: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

/// Tracked fields within an item element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Category,
    Link,
    Published,
    Point,
    Lat,
    Lon,
}

fn field_for(local: &str) -> Option<Field> {
    match local {
        "title" => Some(Field::Title),
        "description" | "summary" | "content" | "encoded" => Some(Field::Description),
        "category" | "subject" => Some(Field::Category),
        "link" => Some(Field::Link),
        "pubDate" | "published" | "updated" | "date" => Some(Field::Published),
        "point" => Some(Field::Point),
        "lat" | "latitude" => Some(Field::Lat),
        "long" | "lon" | "longitude" => Some(Field::Lon),
        _ => None,
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Scrape all `item`/`entry` elements out of a feed body.
fn scrape_items(body: &str) -> Vec<RawItem> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<Field> = None;
    let mut buffer = String::new();
    // Atom categories put the value in a `term` attribute
    let mut pending_term: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                let local = local_name(&e);
                if local == "item" || local == "entry" {
                    current = Some(RawItem::default());
                    field = None;
                } else if let Some(item) = current.as_mut() {
                    field = field_for(&local);
                    buffer.clear();
                    pending_term = None;
                    match field {
                        Some(Field::Link) => {
                            if let Some(href) = attribute(&e, "href") {
                                item.link.get_or_insert(href);
                            }
                        }
                        Some(Field::Category) => {
                            pending_term = attribute(&e, "term");
                        }
                        _ => {}
                    }
                }
            }
            Ok(XmlEvent::Empty(e)) => {
                let local = local_name(&e);
                if let Some(item) = current.as_mut() {
                    match field_for(&local) {
                        Some(Field::Link) => {
                            if let Some(href) = attribute(&e, "href") {
                                item.link.get_or_insert(href);
                            }
                        }
                        Some(Field::Category) => {
                            if let Some(term) = attribute(&e, "term") {
                                item.category.get_or_insert(term);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(XmlEvent::Text(t)) => {
                if current.is_some() && field.is_some() {
                    if let Ok(decoded) = t.decode() {
                        if let Ok(text) = quick_xml::escape::unescape(&decoded) {
                            buffer.push_str(&text);
                        }
                    }
                }
            }
            Ok(XmlEvent::CData(c)) => {
                if current.is_some() && field.is_some() {
                    buffer.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(XmlEvent::End(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if local == "item" || local == "entry" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                    field = None;
                } else if let Some(item) = current.as_mut() {
                    if let Some(f) = field.take() {
                        let text = buffer.trim().to_string();
                        let value = if text.is_empty() {
                            pending_term.take()
                        } else {
                            Some(text)
                        };
                        if let Some(value) = value {
                            let slot = match f {
                                Field::Title => &mut item.title,
                                Field::Description => &mut item.description,
                                Field::Category => &mut item.category,
                                Field::Link => &mut item.link,
                                Field::Published => &mut item.published,
                                Field::Point => &mut item.point,
                                Field::Lat => &mut item.lat,
                                Field::Lon => &mut item.lon,
                            };
                            // first occurrence wins
                            if slot.is_none() {
                                *slot = Some(value);
                            }
                        }
                    }
                    buffer.clear();
                }
            }
            Ok(XmlEvent::Eof) => break,
            // Best-effort scraping: stop on malformed XML, keep what we have
            Err(err) => {
                debug!("feed scan stopped on malformed XML: {err}");
                break;
            }
            Ok(_) => {}
        }
    }

    items
}

/// Parse a feed body into normalized events.
///
/// Each element runs through the geolocation fallback chain; elements whose
/// coordinates stay unresolved are discarded rather than rendered at the
/// (0, 0) origin. Identifiers are synthesized from the fetch time, a random
/// component, and the element's position, which keeps them unique within a
/// batch.
#[must_use]
pub fn parse(body: &str, feed_url: &str) -> ParsedFeed {
    let items = scrape_items(body);
    let items_found = items.len();
    let source = source_label(feed_url);
    let now = Utc::now();
    let millis = now.timestamp_millis();

    let events = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let title = item.title.unwrap_or_else(|| "Untitled".to_string());
            let description = item.description.unwrap_or_default();
            let text = format!("{title} {description}");
            let hints = GeoHints {
                point: item.point.as_deref(),
                lat: item.lat.as_deref(),
                lon: item.lon.as_deref(),
            };
            let location = geo::resolve(&hints, &text)?;
            if location.coords.lat == 0.0 && location.coords.lon == 0.0 {
                // indistinguishable from the unresolved sentinel
                return None;
            }

            Some(Event {
                id: format!("rss-{millis}-{}-{idx}", random_component(6)),
                title,
                category: item.category.unwrap_or_else(|| "RSS".to_string()),
                severity: RSS_SEVERITY,
                lat: location.coords.lat,
                lon: location.coords.lon,
                country: location.country.unwrap_or_default().to_string(),
                source: source.clone(),
                link: item.link.unwrap_or_else(|| feed_url.to_string()),
                timestamp: item.published.unwrap_or_else(|| now.to_rfc3339()),
            })
        })
        .collect();

    ParsedFeed {
        items_found,
        events,
    }
}
