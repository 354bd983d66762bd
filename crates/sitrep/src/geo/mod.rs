//! Geolocation heuristics for feed items.
//!
//! Feed items rarely carry structured coordinates, so location is resolved
//! through an ordered fallback chain; the first resolver that produces a
//! coordinate wins:
//!
//! 1. a combined point tag (space-separated "lat lon"),
//! 2. separate latitude/longitude tags,
//! 3. a numeric pair pattern matched out of the item text,
//! 4. a country name recognized in the text, using that country's
//!    representative coordinate.
//!
//! Items that fall through all four resolvers have no usable location and
//! are dropped by the caller rather than rendered at the (0, 0) origin.

pub mod countries;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use countries::find_in_text;

/// A decimal-degree coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// Structured geo hints scraped from a feed item's tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoHints<'a> {
    /// Combined point tag content ("lat lon").
    pub point: Option<&'a str>,
    /// Separate latitude tag content.
    pub lat: Option<&'a str>,
    /// Separate longitude tag content.
    pub lon: Option<&'a str>,
}

/// A resolved location: coordinates plus the country name when one was
/// recognized in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// The resolved coordinates.
    pub coords: Coordinates,
    /// Country name from the table, when the text named one.
    pub country: Option<&'static str>,
}

/// Free-text coordinate pair: latitude with 1-2 integer digits, longitude
/// with 1-3, each with 1-6 fractional digits, separated by non-digit
/// characters.
static COORD_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?\d{1,2}\.\d{1,6})\D+?(-?\d{1,3}\.\d{1,6})")
        .expect("coordinate pattern is valid")
});

/// Parse a combined "lat lon" point tag.
fn parse_point(raw: &str) -> Option<Coordinates> {
    let mut parts = raw.split_whitespace();
    let lat = parts.next()?.parse::<f64>().ok()?;
    let lon = parts.next()?.parse::<f64>().ok()?;
    Some(Coordinates { lat, lon })
}

/// Parse separate latitude/longitude tag contents.
fn parse_lat_lon(lat: &str, lon: &str) -> Option<Coordinates> {
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    Some(Coordinates { lat, lon })
}

/// Match a coordinate pair out of free text.
fn coordinate_pair_in(text: &str) -> Option<Coordinates> {
    let caps = COORD_PAIR.captures(text)?;
    let lat = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let lon = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some(Coordinates { lat, lon })
}

/// Resolve an item's location from its geo tags and combined text.
///
/// Returns `None` when every resolver comes up empty; such items carry no
/// usable location. When coordinates come from tags or the text pattern,
/// the country lookup still runs independently so the country field can be
/// populated alongside them.
#[must_use]
pub fn resolve(hints: &GeoHints<'_>, text: &str) -> Option<Location> {
    let tagged = hints
        .point
        .and_then(parse_point)
        .or_else(|| match (hints.lat, hints.lon) {
            (Some(lat), Some(lon)) => parse_lat_lon(lat, lon),
            _ => None,
        })
        .or_else(|| coordinate_pair_in(text));

    let country = find_in_text(text);

    match tagged {
        Some(coords) => Some(Location {
            coords,
            country: country.map(|c| c.name),
        }),
        None => country.map(|c| Location {
            coords: Coordinates {
                lat: c.lat,
                lon: c.lon,
            },
            country: Some(c.name),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_tag_parsing() {
        let hints = GeoHints {
            point: Some("12.34 56.78"),
            ..GeoHints::default()
        };
        let loc = resolve(&hints, "").unwrap();
        assert_eq!(loc.coords, Coordinates { lat: 12.34, lon: 56.78 });
        assert!(loc.country.is_none());
    }

    #[test]
    fn test_point_tag_beats_country_name() {
        let hints = GeoHints {
            point: Some("12.34 56.78"),
            ..GeoHints::default()
        };
        let loc = resolve(&hints, "Unrest reported in Ghana").unwrap();
        // Tag coordinates win; the country is still recorded.
        assert_eq!(loc.coords, Coordinates { lat: 12.34, lon: 56.78 });
        assert_eq!(loc.country, Some("Ghana"));
    }

    #[test]
    fn test_separate_lat_lon_tags() {
        let hints = GeoHints {
            lat: Some("5.6037"),
            lon: Some("-0.187"),
            ..GeoHints::default()
        };
        let loc = resolve(&hints, "").unwrap();
        assert_eq!(
            loc.coords,
            Coordinates {
                lat: 5.6037,
                lon: -0.187
            }
        );
    }

    #[test]
    fn test_malformed_point_falls_through_to_latlon() {
        let hints = GeoHints {
            point: Some("not coordinates"),
            lat: Some("1.5"),
            lon: Some("2.5"),
        };
        let loc = resolve(&hints, "").unwrap();
        assert_eq!(loc.coords, Coordinates { lat: 1.5, lon: 2.5 });
    }

    #[test]
    fn test_text_coordinate_pair() {
        let loc = resolve(&GeoHints::default(), "Sighting at 13.512, 2.112 this morning").unwrap();
        assert_eq!(
            loc.coords,
            Coordinates {
                lat: 13.512,
                lon: 2.112
            }
        );
    }

    #[test]
    fn test_text_coordinate_pair_negative() {
        let loc = resolve(&GeoHints::default(), "position -1.9403 / 29.8739").unwrap();
        assert_eq!(
            loc.coords,
            Coordinates {
                lat: -1.9403,
                lon: 29.8739
            }
        );
    }

    #[test]
    fn test_country_fallback_accra_ghana() {
        let loc = resolve(
            &GeoHints::default(),
            "Flooding reported in Accra, Ghana",
        )
        .unwrap();
        assert_eq!(loc.country, Some("Ghana"));
        assert_eq!(
            loc.coords,
            Coordinates {
                lat: 7.9465,
                lon: -1.0232
            }
        );
    }

    #[test]
    fn test_no_resolution() {
        assert!(resolve(&GeoHints::default(), "Committee publishes annual report").is_none());
    }

    #[test]
    fn test_pattern_needs_two_numbers() {
        assert!(coordinate_pair_in("altitude 123.456789 recorded").is_none());
    }

    #[test]
    fn test_pattern_requires_fraction() {
        assert!(coordinate_pair_in("between 12 and 56").is_none());
    }

    #[test]
    fn test_pattern_separator_is_non_digit() {
        let c = coordinate_pair_in("12.34;56.78").unwrap();
        assert_eq!(c, Coordinates { lat: 12.34, lon: 56.78 });
    }

    #[test]
    fn test_country_recorded_with_text_coordinates() {
        let loc = resolve(
            &GeoHints::default(),
            "Protest at 12.6392 -7.9996 in Bamako, Mali",
        )
        .unwrap();
        assert_eq!(
            loc.coords,
            Coordinates {
                lat: 12.6392,
                lon: -7.9996
            }
        );
        assert_eq!(loc.country, Some("Mali"));
    }
}
