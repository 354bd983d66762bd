//! Command-line interface for sitrep.
//!
//! This module provides the CLI structure and command definitions for the
//! `sitrep` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ExportCommand, ExportFormat, ExportTarget, FetchCommand, ImportCommand,
    ImportFormat, IncidentCommand, ListCommand, SopCommand, StateCommand, WatchCommand,
};

/// sitrep - Situational-awareness feed aggregator
///
/// Ingests security and hazard events from RSS/Atom/JSON feeds, geolocates
/// them heuristically, and tracks the resulting picture across incidents,
/// filters, and exports.
#[derive(Debug, Parser)]
#[command(name = "sitrep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and ingest feeds
    Fetch(FetchCommand),

    /// Poll enabled feeds on a recurring interval
    Watch(WatchCommand),

    /// Import events from a JSON or CSV file
    Import(ImportCommand),

    /// List events passing the active filters
    List(ListCommand),

    /// Export events, incidents, SOP notes, or configuration
    Export(ExportCommand),

    /// Track incidents
    #[command(subcommand)]
    Incident(IncidentCommand),

    /// Manage SOP notes
    #[command(subcommand)]
    Sop(SopCommand),

    /// Save or restore a session snapshot
    #[command(subcommand)]
    State(StateCommand),

    /// List configured feeds
    Feeds,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "sitrep");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap();

        assert_eq!(
            parse(&["sitrep", "feeds"]).verbosity(),
            crate::logging::Verbosity::Normal
        );
        assert_eq!(
            parse(&["sitrep", "-v", "feeds"]).verbosity(),
            crate::logging::Verbosity::Verbose
        );
        assert_eq!(
            parse(&["sitrep", "-vv", "feeds"]).verbosity(),
            crate::logging::Verbosity::Trace
        );
        assert_eq!(
            parse(&["sitrep", "-q", "feeds"]).verbosity(),
            crate::logging::Verbosity::Quiet
        );
    }

    #[test]
    fn test_parse_fetch_url() {
        let cli = Cli::try_parse_from(["sitrep", "fetch", "https://a.example/feed"]).unwrap();
        match cli.command {
            Command::Fetch(cmd) => {
                assert_eq!(cmd.url.as_deref(), Some("https://a.example/feed"));
                assert!(!cmd.all);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fetch_all() {
        let cli = Cli::try_parse_from(["sitrep", "fetch", "--all"]).unwrap();
        match cli.command {
            Command::Fetch(cmd) => {
                assert!(cmd.url.is_none());
                assert!(cmd.all);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fetch_requires_url_or_all() {
        assert!(Cli::try_parse_from(["sitrep", "fetch"]).is_err());
    }

    #[test]
    fn test_parse_watch_interval() {
        let cli = Cli::try_parse_from(["sitrep", "watch", "--interval", "2"]).unwrap();
        match cli.command {
            Command::Watch(cmd) => assert_eq!(cmd.interval, Some(2)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from(["sitrep", "import", "csv", "events.csv"]).unwrap();
        match cli.command {
            Command::Import(cmd) => {
                assert_eq!(cmd.format, ImportFormat::Csv);
                assert_eq!(cmd.file, PathBuf::from("events.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_export_defaults_to_json() {
        let cli = Cli::try_parse_from(["sitrep", "export", "events"]).unwrap();
        match cli.command {
            Command::Export(cmd) => {
                assert_eq!(cmd.target, ExportTarget::Events);
                assert_eq!(cmd.format, ExportFormat::Json);
                assert!(cmd.output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_incident_from_event() {
        let cli = Cli::try_parse_from(["sitrep", "incident", "from-event", "ev-1"]).unwrap();
        match cli.command {
            Command::Incident(IncidentCommand::FromEvent { event_id }) => {
                assert_eq!(event_id, "ev-1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_state_save() {
        let cli = Cli::try_parse_from(["sitrep", "state", "save"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::State(StateCommand::Save { file: None })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["sitrep", "-c", "/custom/config.toml", "feeds"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
