//! `sitrep` - CLI for situational-awareness feed aggregation
//!
//! This binary ingests feeds, maintains the session state file, and exposes
//! incident tracking, filtering, and export commands.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tokio::sync::Mutex;

use sitrep::cli::{
    Cli, Command, ConfigCommand, ExportCommand, ExportFormat, ExportTarget, FetchCommand,
    ImportCommand, ImportFormat, IncidentCommand, ListCommand, SopCommand, StateCommand,
    WatchCommand,
};
use sitrep::event::Incident;
use sitrep::ingest::{csv, json, IngestReport};
use sitrep::{export, init_logging, AppState, Config, FeedClient, Poller};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Fetch(cmd) => handle_fetch(&config, &cmd).await,
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Import(cmd) => handle_import(&config, &cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Export(cmd) => handle_export(&config, &cmd),
        Command::Incident(cmd) => handle_incident(&config, cmd),
        Command::Sop(cmd) => handle_sop(&config, cmd),
        Command::State(cmd) => handle_state(&config, cmd),
        Command::Feeds => handle_feeds(&config),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Open the session: configured feeds plus whatever the session file holds.
///
/// A missing session file starts a fresh session; a corrupt one is an error
/// rather than something to silently overwrite.
fn open_session(config: &Config) -> anyhow::Result<AppState> {
    let mut state = AppState::with_feeds(&config.feeds.urls);
    state.filters = config.filters.clone();

    let path = config.session_path();
    match state.load_snapshot(&path) {
        Ok(()) => Ok(state),
        Err(err) if err.is_snapshot_missing() => Ok(state),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Persist the session to the configured session file.
fn save_session(config: &Config, state: &AppState) -> anyhow::Result<()> {
    state
        .save_snapshot(config.session_path())
        .context("failed to save session")?;
    Ok(())
}

fn print_report(report: &IngestReport) {
    if let Some(error) = &report.error {
        println!("  {} FAILED: {error}", report.feed);
    } else if report.is_empty() {
        println!(
            "  {}: no usable events ({} items seen)",
            report.feed, report.parsed
        );
    } else {
        println!(
            "  {}: {} new events ({} items seen)",
            report.feed, report.added, report.parsed
        );
    }
}

async fn handle_fetch(config: &Config, cmd: &FetchCommand) -> anyhow::Result<()> {
    let mut state = open_session(config)?;
    let client = FeedClient::new(config.feeds.proxy_prefix.clone());

    let reports = if cmd.all {
        let enabled = state.feeds.iter().filter(|f| f.enabled).count();
        println!("Fetching {enabled} feeds ...");
        client.ingest_all(&mut state).await
    } else {
        // clap guarantees a URL when --all is absent
        let url = cmd.url.as_deref().unwrap_or_default();
        vec![client.ingest(&mut state, url).await]
    };

    for report in &reports {
        print_report(report);
    }

    let added: usize = reports.iter().map(|r| r.added).sum();
    println!("Ingestion complete: {added} new events, {} total", state.events.len());

    save_session(config, &state)
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let state = open_session(config)?;
    let interval = cmd.interval.unwrap_or(config.poll.interval_minutes);

    let state = Arc::new(Mutex::new(state));
    let client = Arc::new(FeedClient::new(config.feeds.proxy_prefix.clone()));

    let mut poller = Poller::new();
    poller.start(interval, Arc::clone(&client), Arc::clone(&state))?;
    println!("Polling every {interval} minutes. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    poller.stop();
    println!("Polling stopped");

    let state = state.lock().await;
    println!("{} events held", state.events.len());
    save_session(config, &state)
}

fn read_input(file: &PathBuf) -> anyhow::Result<String> {
    if file.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
    }
}

fn handle_import(config: &Config, cmd: &ImportCommand) -> anyhow::Result<()> {
    let mut state = open_session(config)?;
    let text = read_input(&cmd.file)?;

    // Malformed input aborts here, before any state change
    match cmd.format {
        ImportFormat::Json => {
            let batch = json::parse_str(&text).context("invalid JSON input")?;
            let events = state.add_events(batch.events);
            let assets = state.add_assets(batch.assets);
            let people = state.add_people(batch.people);
            println!("Imported {events} events, {assets} assets, {people} people");
        }
        ImportFormat::Csv => {
            let events = csv::parse_events(&text).context("invalid CSV input")?;
            let added = state.add_events(events);
            println!("Imported {added} events");
        }
    }

    save_session(config, &state)
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut state = open_session(config)?;

    // Command-line flags override saved filters for this invocation
    if let Some(min) = cmd.min_severity {
        state.filters.min_severity = min;
    }
    if let Some(keyword) = &cmd.keyword {
        state.filters.keyword.clone_from(keyword);
    }
    if !cmd.country.is_empty() {
        state.filters.countries.clone_from(&cmd.country);
    }
    if let Some(window) = cmd.window {
        state.filters.time_window_hours = window;
    }

    let filtered = state.filtered_events(Utc::now());

    if cmd.json {
        println!("{}", export::events_to_json(&filtered)?);
        return Ok(());
    }

    if filtered.is_empty() {
        println!("No events match the active filters");
        return Ok(());
    }

    for event in &filtered {
        let country = if event.country.is_empty() {
            "N/A"
        } else {
            event.country.as_str()
        };
        println!(
            "S{} [{}] {} - {} ({})",
            event.severity, event.category, event.title, country, event.source
        );
    }
    println!("{} of {} events shown", filtered.len(), state.events.len());
    Ok(())
}

fn write_output(output: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    let state = open_session(config)?;

    if cmd.format == ExportFormat::Csv && cmd.target != ExportTarget::Events {
        anyhow::bail!("CSV export is only available for events");
    }

    let content = match cmd.target {
        ExportTarget::Events => {
            let filtered = state.filtered_events(Utc::now());
            if filtered.is_empty() {
                println!("No events to export");
                return Ok(());
            }
            match cmd.format {
                ExportFormat::Csv => export::events_to_csv(&filtered),
                ExportFormat::Json => export::events_to_json(&filtered)?,
            }
        }
        ExportTarget::Incidents => export::incidents_to_json(&state.incidents)?,
        ExportTarget::Sops => export::sops_to_json(&state.sops)?,
        ExportTarget::Config => export::config_to_json(&state)?,
    };

    write_output(cmd.output.as_ref(), &content)
}

fn handle_incident(config: &Config, cmd: IncidentCommand) -> anyhow::Result<()> {
    let mut state = open_session(config)?;

    match cmd {
        IncidentCommand::Add {
            title,
            severity,
            status,
            notes,
        } => {
            let incident = Incident::new(title, severity, status, notes);
            println!("Created incident {} - {}", incident.id, incident.title);
            state.add_incident(incident);
            save_session(config, &state)
        }
        IncidentCommand::List => {
            if state.incidents.is_empty() {
                println!("No incidents tracked");
                return Ok(());
            }
            for inc in state.incidents.iter().rev() {
                println!(
                    "{} S{} [{}] {} (linked event: {})",
                    inc.id,
                    inc.severity,
                    inc.status,
                    inc.title,
                    inc.linked_event_label()
                );
            }
            Ok(())
        }
        IncidentCommand::FromEvent { event_id } => {
            match state.incident_from_event(&event_id) {
                Some(incident) => {
                    println!("Created incident {} from event {event_id}", incident.id);
                }
                None => {
                    println!("No event with id {event_id}");
                    return Ok(());
                }
            }
            save_session(config, &state)
        }
    }
}

fn handle_sop(config: &Config, cmd: SopCommand) -> anyhow::Result<()> {
    let mut state = open_session(config)?;

    match cmd {
        SopCommand::Add { text } => {
            let note = sitrep::event::SopNote::new(text);
            println!("Saved SOP note {}", note.id);
            state.add_sop(note);
            save_session(config, &state)
        }
        SopCommand::List => {
            if state.sops.is_empty() {
                println!("No SOP notes saved");
                return Ok(());
            }
            for note in state.sops.iter().rev() {
                println!("{} ({})", note.id, note.created_at);
                println!("  {}", note.text);
            }
            Ok(())
        }
    }
}

fn handle_state(config: &Config, cmd: StateCommand) -> anyhow::Result<()> {
    match cmd {
        StateCommand::Save { file } => {
            let state = open_session(config)?;
            let path = file.unwrap_or_else(|| config.session_path());
            state
                .save_snapshot(&path)
                .with_context(|| format!("failed to save snapshot to {}", path.display()))?;
            println!("State saved to {}", path.display());
            Ok(())
        }
        StateCommand::Load { file } => {
            let mut state = open_session(config)?;
            let path = file.unwrap_or_else(|| config.session_path());
            match state.load_snapshot(&path) {
                Ok(()) => {}
                Err(err) if err.is_snapshot_missing() => {
                    println!("No saved state found at {}", path.display());
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
            println!(
                "State loaded: {} events, {} incidents, {} SOP notes",
                state.events.len(),
                state.incidents.len(),
                state.sops.len()
            );
            save_session(config, &state)
        }
    }
}

fn handle_feeds(config: &Config) -> anyhow::Result<()> {
    let state = open_session(config)?;

    println!("Configured feeds");
    println!("----------------");
    for feed in &state.feeds {
        let marker = if feed.enabled { "[x]" } else { "[ ]" };
        println!("{marker} {} ({})", feed.label, feed.url);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Feeds]");
                println!("  Configured:       {}", config.feeds.urls.len());
                println!(
                    "  Proxy prefix:     {}",
                    config.feeds.proxy_prefix.as_deref().unwrap_or("(none)")
                );
                println!();
                println!("[Poll]");
                println!("  Interval (min):   {}", config.poll.interval_minutes);
                println!();
                println!("[Storage]");
                println!("  Session path:     {}", config.session_path().display());
                println!();
                println!("[Filters]");
                println!("  Min severity:     {}", config.filters.min_severity);
                println!("  Time window (h):  {}", config.filters.time_window_hours);
            }
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
            Ok(())
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
            Ok(())
        }
    }
}
