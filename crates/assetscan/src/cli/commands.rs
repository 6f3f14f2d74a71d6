//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Convert command arguments.
#[derive(Debug, Args)]
pub struct ConvertCommand {
    /// Raw spreadsheet export to read [default: converter.input_path]
    pub input: Option<PathBuf>,

    /// Where to write the keyed mapping [default: converter.output_path]
    pub output: Option<PathBuf>,

    /// Print the conversion summary as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Find command arguments.
#[derive(Debug, Args)]
pub struct FindCommand {
    /// Asset tag, key, or part of one
    pub query: String,

    /// Asset database to search [default: lookup.data_path]
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Asset database to search [default: lookup.data_path]
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Shell command arguments.
#[derive(Debug, Args)]
pub struct ShellCommand {
    /// Asset database to search [default: lookup.data_path]
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Asset database to summarize [default: lookup.data_path]
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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

/// Output format for lookup results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Labelled detail card
    #[default]
    Plain,
    /// JSON object
    Json,
}
