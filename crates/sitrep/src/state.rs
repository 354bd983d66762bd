//! Shared application state and snapshot persistence.
//!
//! All in-memory collections live in a single [`AppState`] container that
//! is threaded explicitly through the ingestion and filter operations.
//! Persistence is a wholesale snapshot: saving serializes the entire
//! session to one JSON file, loading replaces the session entirely (never
//! a merge).

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::{clamp_severity, Asset, Event, Feed, Filters, Incident, Person, SopNote};

/// The single process-wide state container.
///
/// Events, assets, and people are append-only under the dedup-by-identifier
/// rule; incidents and SOP notes are user-maintained; feeds are
/// configuration entries whose enabled flag is the only mutable part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// UI theme name, carried through snapshots.
    pub theme: String,
    /// Active role profile, carried through snapshots.
    pub role: String,
    /// Normalized events.
    pub events: Vec<Event>,
    /// Tracked assets.
    pub assets: Vec<Asset>,
    /// Tracked people.
    pub people: Vec<Person>,
    /// Tracked incidents.
    pub incidents: Vec<Incident>,
    /// SOP notes.
    pub sops: Vec<SopNote>,
    /// Active filter settings.
    pub filters: Filters,
    /// Configured feeds. Not part of snapshots; rebuilt from configuration.
    pub feeds: Vec<Feed>,
}

/// The persisted session snapshot.
///
/// A single serialized object, replaced wholesale on save and restored
/// wholesale on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// UI theme name.
    pub theme: String,
    /// Active role profile.
    pub role: String,
    /// Filter settings at save time.
    pub filters: Filters,
    /// Events at save time.
    pub events: Vec<Event>,
    /// Assets at save time.
    pub assets: Vec<Asset>,
    /// People at save time.
    pub people: Vec<Person>,
    /// Incidents at save time.
    pub incidents: Vec<Incident>,
    /// SOP notes at save time.
    pub sops: Vec<SopNote>,
}

impl AppState {
    /// Create a state seeded with feeds built from the given URLs.
    #[must_use]
    pub fn with_feeds(urls: &[String]) -> Self {
        Self {
            theme: "light".to_string(),
            role: "all".to_string(),
            feeds: urls.iter().map(Feed::new).collect(),
            ..Self::default()
        }
    }

    /// Append events, dropping any whose identifier is already held or
    /// empty. Severity is clamped into range on the way in.
    ///
    /// Returns the number of events actually added.
    pub fn add_events(&mut self, incoming: Vec<Event>) -> usize {
        let mut seen: HashSet<String> = self.events.iter().map(|e| e.id.clone()).collect();
        let before = self.events.len();

        for mut event in incoming {
            if event.id.is_empty() || seen.contains(&event.id) {
                debug!(id = %event.id, "skipping duplicate event");
                continue;
            }
            event.severity = clamp_severity(i64::from(event.severity));
            seen.insert(event.id.clone());
            self.events.push(event);
        }

        self.events.len() - before
    }

    /// Append assets under the dedup-by-identifier rule.
    pub fn add_assets(&mut self, incoming: Vec<Asset>) -> usize {
        let mut seen: HashSet<String> = self.assets.iter().map(|a| a.id.clone()).collect();
        let before = self.assets.len();

        for asset in incoming {
            if asset.id.is_empty() || seen.contains(&asset.id) {
                continue;
            }
            seen.insert(asset.id.clone());
            self.assets.push(asset);
        }

        self.assets.len() - before
    }

    /// Append people under the dedup-by-identifier rule.
    pub fn add_people(&mut self, incoming: Vec<Person>) -> usize {
        let mut seen: HashSet<String> = self.people.iter().map(|p| p.id.clone()).collect();
        let before = self.people.len();

        for person in incoming {
            if person.id.is_empty() || seen.contains(&person.id) {
                continue;
            }
            seen.insert(person.id.clone());
            self.people.push(person);
        }

        self.people.len() - before
    }

    /// Find an event by identifier.
    #[must_use]
    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// The events passing the active filters at time `now`.
    #[must_use]
    pub fn filtered_events(&self, now: DateTime<Utc>) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| self.filters.matches(e, now))
            .collect()
    }

    /// Create an incident auto-derived from the event with the given id.
    ///
    /// Returns `None` when no such event is held; nothing is created then.
    pub fn incident_from_event(&mut self, event_id: &str) -> Option<&Incident> {
        let incident = Incident::from_event(self.event(event_id)?);
        self.incidents.push(incident);
        self.incidents.last()
    }

    /// Add a user-created incident.
    pub fn add_incident(&mut self, incident: Incident) {
        self.incidents.push(incident);
    }

    /// Add a SOP note.
    pub fn add_sop(&mut self, note: SopNote) {
        self.sops.push(note);
    }

    /// Capture the current session as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            theme: self.theme.clone(),
            role: self.role.clone(),
            filters: self.filters.clone(),
            events: self.events.clone(),
            assets: self.assets.clone(),
            people: self.people.clone(),
            incidents: self.incidents.clone(),
            sops: self.sops.clone(),
        }
    }

    /// Replace the session with a snapshot (full replace, not merge).
    ///
    /// Feeds are left untouched; they come from configuration.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.theme = snapshot.theme;
        self.role = snapshot.role;
        self.filters = snapshot.filters;
        self.events = snapshot.events;
        self.assets = snapshot.assets;
        self.people = snapshot.people;
        self.incidents = snapshot.incidents;
        self.sops = snapshot.sops;
    }

    /// Save the session snapshot to a file, creating parent directories as
    /// needed. The file is replaced wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be written.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let serialized = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, serialized)?;
        info!("session saved to {}", path.display());
        Ok(())
    }

    /// Load a snapshot file and replace the session with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotMissing`] when no file exists at `path`
    /// (an informational outcome), or a parse/IO error otherwise.
    pub fn load_snapshot(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::SnapshotMissing {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        self.restore(snapshot);
        info!("session loaded from {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located_event(id: &str, severity: u8) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {id}"),
            category: "Security".to_string(),
            severity,
            lat: 13.512,
            lon: 2.112,
            country: "Niger".to_string(),
            source: "example.org".to_string(),
            link: String::new(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_add_events_dedup_by_id() {
        let mut state = AppState::default();

        let added = state.add_events(vec![located_event("a", 2), located_event("b", 3)]);
        assert_eq!(added, 2);

        // Same identifier again: neither duplicated nor overwritten
        let mut replacement = located_event("a", 5);
        replacement.title = "Changed".to_string();
        let added = state.add_events(vec![replacement]);
        assert_eq!(added, 0);
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.events[0].title, "Event a");
        assert_eq!(state.events[0].severity, 2);
    }

    #[test]
    fn test_add_events_dedup_within_batch() {
        let mut state = AppState::default();
        let added = state.add_events(vec![located_event("a", 2), located_event("a", 3)]);
        assert_eq!(added, 1);
        assert_eq!(state.events.len(), 1);
    }

    #[test]
    fn test_add_events_idempotent_reingest() {
        let mut state = AppState::default();
        let batch = vec![located_event("a", 2), located_event("b", 3)];

        state.add_events(batch.clone());
        let snapshot_once = state.clone();

        let added = state.add_events(batch);
        assert_eq!(added, 0);
        assert_eq!(state, snapshot_once);
    }

    #[test]
    fn test_add_events_skips_empty_id() {
        let mut state = AppState::default();
        let added = state.add_events(vec![located_event("", 2)]);
        assert_eq!(added, 0);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_add_events_clamps_severity() {
        let mut state = AppState::default();
        state.add_events(vec![located_event("a", 9)]);
        assert_eq!(state.events[0].severity, 5);
    }

    #[test]
    fn test_add_assets_and_people_dedup() {
        let mut state = AppState::default();

        let asset = Asset {
            id: "as1".to_string(),
            name: "Office".to_string(),
            ..Asset::default()
        };
        assert_eq!(state.add_assets(vec![asset.clone(), asset.clone()]), 1);
        assert_eq!(state.add_assets(vec![asset]), 0);

        let person = Person {
            id: "p1".to_string(),
            name: "Field lead".to_string(),
            ..Person::default()
        };
        assert_eq!(state.add_people(vec![person.clone()]), 1);
        assert_eq!(state.add_people(vec![person]), 0);
    }

    #[test]
    fn test_filtered_events() {
        let now = Utc::now();
        let mut state = AppState::default();
        state.add_events(vec![located_event("a", 1), located_event("b", 4)]);
        state.filters.min_severity = 3;

        let filtered = state.filtered_events(now);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "b");
    }

    #[test]
    fn test_incident_from_event() {
        let mut state = AppState::default();
        state.add_events(vec![located_event("a", 4)]);

        let incident = state.incident_from_event("a").unwrap();
        assert_eq!(incident.linked_event_id.as_deref(), Some("a"));
        assert_eq!(incident.severity, 4);
        assert_eq!(state.incidents.len(), 1);
    }

    #[test]
    fn test_incident_from_missing_event() {
        let mut state = AppState::default();
        assert!(state.incident_from_event("ghost").is_none());
        assert!(state.incidents.is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut state = AppState::with_feeds(&["https://a.example/feed".to_string()]);
        state.add_events(vec![located_event("a", 2), located_event("b", 5)]);
        state.add_assets(vec![Asset {
            id: "as1".to_string(),
            ..Asset::default()
        }]);
        state.incident_from_event("a");
        state.add_sop(SopNote::new("Check in every 4 hours".to_string()));
        state.filters.keyword = "roadblock".to_string();
        state.filters.min_severity = 2;

        state.save_snapshot(&path).unwrap();

        let mut restored = AppState::default();
        restored.load_snapshot(&path).unwrap();

        // Collections and filters reproduce exactly, in order
        assert_eq!(restored.events, state.events);
        assert_eq!(restored.assets, state.assets);
        assert_eq!(restored.people, state.people);
        assert_eq!(restored.incidents, state.incidents);
        assert_eq!(restored.sops, state.sops);
        assert_eq!(restored.filters, state.filters);
        assert_eq!(restored.theme, state.theme);
        assert_eq!(restored.role, state.role);
    }

    #[test]
    fn test_load_replaces_not_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut saved = AppState::default();
        saved.add_events(vec![located_event("a", 2)]);
        saved.save_snapshot(&path).unwrap();

        let mut other = AppState::default();
        other.add_events(vec![located_event("x", 3), located_event("y", 3)]);
        other.load_snapshot(&path).unwrap();

        assert_eq!(other.events.len(), 1);
        assert_eq!(other.events[0].id, "a");
    }

    #[test]
    fn test_load_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let mut state = AppState::default();
        let err = state.load_snapshot(&path).unwrap_err();
        assert!(err.is_snapshot_missing());
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_restore_keeps_feeds() {
        let mut state = AppState::with_feeds(&["https://a.example/feed".to_string()]);
        state.restore(Snapshot::default());
        assert_eq!(state.feeds.len(), 1);
    }

    #[test]
    fn test_with_feeds_labels() {
        let state = AppState::with_feeds(&[
            "https://www.gdacs.org/xml/rss.xml".to_string(),
            "https://reliefweb.int/updates/rss.xml".to_string(),
        ]);
        assert_eq!(state.feeds[0].label, "gdacs.org");
        assert_eq!(state.feeds[1].label, "reliefweb.int");
        assert!(state.feeds.iter().all(|f| f.enabled));
    }
}
