//! Command-line interface for assetscan.
//!
//! This module provides the CLI structure for the `assetscan` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ConvertCommand, FindCommand, OutputFormat, ScanCommand, ShellCommand,
    StatsCommand,
};

/// assetscan - Look up building assets by tag or QR code
///
/// Converts spreadsheet exports into a keyed asset database, then finds
/// assets by typed tag or by scanning their QR labels with a camera.
#[derive(Debug, Parser)]
#[command(name = "assetscan")]
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
    /// Convert a spreadsheet export into the asset database
    Convert(ConvertCommand),

    /// Look up one asset
    Find(FindCommand),

    /// Scan one QR code with the camera and look it up
    Scan(ScanCommand),

    /// Interactive lookup shell
    Shell(ShellCommand),

    /// Show asset database totals
    Stats(StatsCommand),

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

    fn stats_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Stats(StatsCommand {
                data: None,
                json: false,
            }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "assetscan");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(stats_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(stats_cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(stats_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(stats_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(stats_cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_defaults() {
        let cli = Cli::try_parse_from(["assetscan", "convert"]).unwrap();
        match cli.command {
            Command::Convert(cmd) => {
                assert!(cmd.input.is_none());
                assert!(cmd.output.is_none());
            }
            other => panic!("Expected convert, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_convert_paths() {
        let cli = Cli::try_parse_from(["assetscan", "convert", "in.json", "out.json"]).unwrap();
        match cli.command {
            Command::Convert(cmd) => {
                assert_eq!(cmd.input, Some(PathBuf::from("in.json")));
                assert_eq!(cmd.output, Some(PathBuf::from("out.json")));
            }
            other => panic!("Expected convert, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from([
            "assetscan",
            "find",
            "AB-100",
            "--data",
            "/srv/assets.json",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::Find(cmd) => {
                assert_eq!(cmd.query, "AB-100");
                assert_eq!(cmd.data, Some(PathBuf::from("/srv/assets.json")));
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("Expected find, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_find_requires_query() {
        assert!(Cli::try_parse_from(["assetscan", "find"]).is_err());
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from(["assetscan", "scan"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Scan(ScanCommand {
                format: OutputFormat::Plain,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_shell_and_config() {
        let cli = Cli::try_parse_from(["assetscan", "shell"]).unwrap();
        assert!(matches!(cli.command, Command::Shell(_)));

        let cli = Cli::try_parse_from(["assetscan", "config", "show", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Show { json: true })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = ["assetscan", "-c", "/custom/config.toml", "stats"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["assetscan", "stats", "-vv", "-q"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
    }
}
