//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Fetch command arguments.
#[derive(Debug, Args)]
pub struct FetchCommand {
    /// Feed URL to ingest once
    #[arg(required_unless_present = "all")]
    pub url: Option<String>,

    /// Fetch all enabled feeds instead
    #[arg(short, long, conflicts_with = "url")]
    pub all: bool,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Poll interval in minutes (minimum 1); defaults to the configured value
    #[arg(short, long)]
    pub interval: Option<u64>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Input format
    #[arg(value_enum)]
    pub format: ImportFormat,

    /// Input file, or '-' to read from stdin
    pub file: PathBuf,
}

/// Supported import formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFormat {
    /// A JSON array of events, or an envelope with events/assets/people
    Json,
    /// A delimited file with a header row
    Csv,
}

/// List command arguments. Flags override the session's saved filters for
/// this invocation only.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Minimum severity (1-5)
    #[arg(long)]
    pub min_severity: Option<u8>,

    /// Keyword filter (any whitespace-separated token matches)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Country filter; may be given multiple times
    #[arg(long)]
    pub country: Vec<String>,

    /// Time window in hours (0 disables the window)
    #[arg(short, long)]
    pub window: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// What to export
    #[arg(value_enum)]
    pub target: ExportTarget,

    /// Output format (CSV is available for events only)
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Output file; prints to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Exportable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    /// The filtered event set
    Events,
    /// All incidents
    Incidents,
    /// All SOP notes
    Sops,
    /// The configuration snapshot (role and filters)
    Config,
}

/// Output format for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Comma-separated values
    Csv,
}

/// Incident tracking commands.
#[derive(Debug, Subcommand)]
pub enum IncidentCommand {
    /// Create an incident
    Add {
        /// Incident title
        #[arg(short, long)]
        title: String,

        /// Severity (1-5)
        #[arg(short, long, default_value = "3")]
        severity: u8,

        /// Workflow status
        #[arg(long, default_value = "open")]
        status: String,

        /// Free-text notes
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// List tracked incidents
    List,

    /// Auto-create an incident from an ingested event
    FromEvent {
        /// Identifier of the originating event
        event_id: String,
    },
}

/// SOP note commands.
#[derive(Debug, Subcommand)]
pub enum SopCommand {
    /// Save a SOP note
    Add {
        /// Note body
        text: String,
    },

    /// List saved SOP notes
    List,
}

/// Session snapshot commands.
#[derive(Debug, Subcommand)]
pub enum StateCommand {
    /// Save the session snapshot
    Save {
        /// Destination file; defaults to the configured session path
        file: Option<PathBuf>,
    },

    /// Replace the session with a saved snapshot
    Load {
        /// Source file; defaults to the configured session path
        file: Option<PathBuf>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
