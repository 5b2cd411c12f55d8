//! Command-line argument definitions for the resource ingester
//!
//! This module defines the CLI interface using the clap derive API.

use crate::{Error, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// CLI arguments for the resource ingester
///
/// Validates community resource CSV files against the resource schema and
/// optionally uploads the normalized records to the resource directory API.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "resource_ingest",
    version,
    about = "Validate community resource CSV files and upload them to the resource API",
    long_about = "Validates community resource listings stored in CSV files: header names, \
                  required fields, enumerated values and categories fetched from the resource \
                  API. Valid records can be uploaded; the ids created by an upload are saved \
                  so the upload can be rolled back later."
)]
pub struct Args {
    /// CSV files or directories containing CSV files
    ///
    /// Directories are searched recursively for files ending in `.csv`.
    #[arg(value_name = "PATH", help = "CSV files or directories containing CSV files")]
    pub paths: Vec<PathBuf>,

    /// Print each parsed record as JSON and raise the log level
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help = "Print parsed records and increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Upload parsed records to the resource API
    ///
    /// Ids of created resources are written to a rollback file in the
    /// configured rollback directory.
    #[arg(long = "upload", help = "Upload parsed records to the resource API")]
    pub upload: bool,

    /// Roll back a previous upload
    ///
    /// Deletes every resource listed in the given rollback-id file.
    #[arg(
        short = 'r',
        long = "rollback",
        value_name = "FILE",
        help = "Delete the resources listed in a rollback-id file",
        conflicts_with = "upload"
    )]
    pub rollback: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// ~/.config/resource-ingest/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Resource API base URL, overriding the config file and environment
    #[arg(long = "api-url", value_name = "URL", help = "Resource API base URL")]
    pub api_url: Option<String>,

    /// Directory for rollback-id files, overriding the config file and environment
    #[arg(
        long = "rollback-dir",
        value_name = "DIR",
        help = "Directory where rollback-id files are written"
    )]
    pub rollback_dir: Option<PathBuf>,

    /// Extra header names accepted besides the resource fields
    #[arg(
        long = "allowed-fields",
        value_name = "NAMES",
        value_delimiter = ',',
        help = "Comma-separated extra columns to accept (replaces the configured list)"
    )]
    pub allowed_fields: Vec<String>,

    /// Suppress output except errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Args {
    /// Validate the arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.paths.is_empty() && self.rollback.is_none() {
            return Err(Error::configuration(
                "Expected at least one CSV file or directory",
            ));
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("resource_ingest").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_paths_and_flags() {
        let args = parse(&["a.csv", "data/", "-vv", "--upload"]);
        assert_eq!(args.paths.len(), 2);
        assert_eq!(args.verbose, 2);
        assert!(args.upload);
        assert!(args.is_verbose());
        assert_eq!(args.get_log_level(), "debug");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(parse(&["a.csv"]).get_log_level(), "warn");
        assert_eq!(parse(&["a.csv", "-v"]).get_log_level(), "info");
        assert_eq!(parse(&["a.csv", "-vvvv"]).get_log_level(), "trace");

        let quiet = parse(&["a.csv", "-q"]);
        assert_eq!(quiet.get_log_level(), "error");
        assert!(!quiet.show_progress());
    }

    #[test]
    fn test_rollback_needs_no_paths() {
        let args = parse(&["-r", "rollback_ids/123.txt"]);
        assert_eq!(args.rollback, Some(PathBuf::from("rollback_ids/123.txt")));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_conflicts_rejected() {
        let result = Args::try_parse_from(["resource_ingest", "a.csv", "--upload", "-r", "x.txt"]);
        assert!(result.is_err());

        let result = Args::try_parse_from(["resource_ingest", "a.csv", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_input() {
        assert!(parse(&[]).validate().is_err());
        assert!(parse(&["a.csv", "-c", "/nonexistent/config.toml"]).validate().is_err());
    }
}
