//! Command implementations for the resource ingester CLI
//!
//! This module contains the main run loop: logging and configuration setup,
//! input discovery, parsing, and the optional upload or rollback step.

use crate::app::adapters::filesystem::discover_csv_files;
use crate::app::services::resource_parser::{ParseSession, ParseStats};
use crate::app::services::rollback::RollbackHandler;
use crate::app::services::uploader::{HttpResourceApi, ResourceUploader};
use crate::app::services::vocabulary::HttpVocabularySource;
use crate::cli::args::Args;
use crate::config::Config;
use crate::text::bulleted_list;
use crate::{Error, Result};
use colored::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a run did, for the final report
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files_found: usize,
    pub parse_stats: ParseStats,
    /// Set when `--upload` was given and every record was uploaded
    pub uploaded: Option<usize>,
    /// Set when `--rollback` was given and every id was deleted
    pub rolled_back: Option<usize>,
    pub duration: Duration,
}

/// Main command runner
///
/// 1. Set up logging and configuration
/// 2. Roll back a previous upload, if asked, and stop
/// 3. Discover input files and fetch the category vocabulary
/// 4. Parse every file, echoing records in verbose mode
/// 5. Upload the records, if asked
pub async fn run(args: Args, cancel: CancellationToken) -> Result<RunSummary> {
    let start_time = Instant::now();

    setup_logging(args.get_log_level(), args.quiet)?;
    info!("Starting resource ingest");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let mut summary = RunSummary::default();

    if let Some(rollback_file) = &args.rollback {
        summary.rolled_back = Some(run_rollback(&config, rollback_file, &args).await?);
        summary.duration = start_time.elapsed();
        report_summary(&args, &summary);
        return Ok(summary);
    }

    let files = discover_csv_files(&args.paths).inspect_err(|e| {
        report_error_log(&e.messages(), e);
    })?;
    summary.files_found = files.len();
    if args.is_verbose() {
        println!(
            "CSV files stored:\n{}\n",
            bulleted_list(files.iter().map(|p| p.display()))
        );
    }
    ensure_not_cancelled(&cancel)?;

    let source = HttpVocabularySource::new(&config.api_url, config.request_timeout())?;
    let mut session = ParseSession::new(config.allowed_fields.clone());
    if let Err(e) = session.load_vocabulary(&source).await {
        report_error_log(session.err_log(), &e);
        return Err(e);
    }
    ensure_not_cancelled(&cancel)?;

    session.add_files(files);
    let parsed = session.parse_all().await;
    summary.parse_stats = session.stats().clone();

    if args.is_verbose() {
        print_records(&session);
    }

    if let Err(e) = parsed {
        error!("Parsing failed: {}", e);
        report_error_log(session.err_log(), &e);
        return Err(e);
    }
    ensure_not_cancelled(&cancel)?;

    if args.upload {
        let api = HttpResourceApi::new(&config.api_url, config.request_timeout())?;
        let uploader = ResourceUploader::new(api, &config.rollback_dir)
            .with_progress(args.show_progress());

        match uploader.upload_all(session.resources()).await {
            Ok(count) => summary.uploaded = Some(count),
            Err(e) => {
                report_error_log(&e.messages(), &e);
                return Err(e);
            }
        }
    }

    summary.duration = start_time.elapsed();
    report_summary(&args, &summary);
    Ok(summary)
}

/// Set up structured logging at `log_level`
pub fn setup_logging(log_level: &str, quiet: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("resource_ingest={}", log_level)));

    let result = if quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {e}")))?;
    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using the layered approach (file -> env -> args)
fn load_configuration(args: &Args) -> Result<Config> {
    let default_config_path = if args.config_file.is_none() {
        Config::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    if let Some(config_path) = config_file {
        info!("Using config file: {}", config_path.display());
    } else {
        info!("No config file found, using defaults and environment variables");
    }

    let config = apply_cli_overrides(Config::load_layered(config_file)?, args);
    config.validate()?;
    Ok(config)
}

/// Apply command-line settings over file and environment values
fn apply_cli_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(api_url) = &args.api_url {
        debug!("--api-url overrides api_url");
        config = config.with_api_url(api_url.as_str());
    }
    if let Some(rollback_dir) = &args.rollback_dir {
        debug!("--rollback-dir overrides rollback_dir");
        config = config.with_rollback_dir(rollback_dir.as_path());
    }
    if !args.allowed_fields.is_empty() {
        debug!("--allowed-fields overrides allowed_fields");
        config = config.with_allowed_fields(args.allowed_fields.iter().map(String::as_str));
    }
    config
}

async fn run_rollback(config: &Config, rollback_file: &Path, args: &Args) -> Result<usize> {
    let api = HttpResourceApi::new(&config.api_url, config.request_timeout())?;
    let handler = RollbackHandler::new(api).with_progress(args.show_progress());

    handler.rollback(rollback_file).await.inspect_err(|e| {
        report_error_log(&e.messages(), e);
    })
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::processing_interrupted("Cancelled by user"))
    } else {
        Ok(())
    }
}

fn print_records(session: &ParseSession) {
    for record in session.resources() {
        match serde_json::to_string(record) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Failed to serialize {}: {}", record.business_name, e),
        }
    }
}

/// Print every accumulated problem as a bulleted list on stderr
///
/// `main` prints `error.summary()` afterwards, so a log holding nothing but
/// that line is skipped.
fn report_error_log(messages: &[String], error: &Error) {
    let messages = log_details(messages, error);
    if messages.is_empty() {
        return;
    }
    eprintln!(
        "{}\n{}",
        format!("{} problem(s) found:", messages.len()).bright_red().bold(),
        bulleted_list(messages)
    );
}

fn log_details<'a>(messages: &'a [String], error: &Error) -> &'a [String] {
    match messages {
        [only] if *only == error.summary() => &[],
        _ => messages,
    }
}

fn report_summary(args: &Args, summary: &RunSummary) {
    if args.quiet {
        return;
    }

    println!("\n{}", "Ingest Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        summary.duration.as_millis().to_string().bright_white()
    );

    if let Some(count) = summary.rolled_back {
        println!(
            "  {} {}",
            "Resources rolled back:".bright_cyan(),
            count.to_string().bright_white().bold()
        );
        return;
    }

    println!(
        "  {} {}",
        "CSV files found:".bright_cyan(),
        summary.files_found.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files parsed:".bright_cyan(),
        summary.parse_stats.files_parsed.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Resources parsed:".bright_cyan(),
        summary.parse_stats.rows_parsed.to_string().bright_white().bold()
    );
    if let Some(count) = summary.uploaded {
        println!(
            "  {} {}",
            "Resources uploaded:".bright_cyan(),
            count.to_string().bright_white().bold()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::RowLocation;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse_args(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("resource_ingest").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_aggregate_log_is_shown_once() {
        let error = Error::ResourceUpload {
            messages: vec![
                "Resource Acme failed to upload: HTTP 500".to_string(),
                "Resource Beta failed to upload: HTTP 500".to_string(),
            ],
        };
        let messages = error.messages();

        assert_eq!(log_details(&messages, &error).len(), 2);
        assert_eq!(error.summary(), "Failed to upload 2 resources");
        for line in &messages {
            assert!(!error.summary().contains(line.as_str()));
        }
    }

    #[test]
    fn test_single_line_log_is_left_to_main() {
        let error = Error::UnknownCategory {
            location: RowLocation::new("a.csv", 2),
            value: "X".to_string(),
        };
        let messages = error.messages();
        assert!(log_details(&messages, &error).is_empty());

        let other = Error::vocabulary("unreachable");
        let log = vec![messages[0].clone(), other.to_string()];
        assert_eq!(log_details(&log, &error).len(), 2);
    }

    #[test]
    fn test_missing_paths_listed_in_log_only() {
        let error = Error::PathNotFound {
            paths: vec!["a.csv".to_string(), "data/".to_string()],
        };
        let messages = error.messages();

        assert_eq!(log_details(&messages, &error).len(), 2);
        assert_eq!(error.summary(), "2 path(s) not found");
    }

    #[test]
    fn test_cli_overrides_win() {
        let args = parse_args(&[
            "a.csv",
            "--api-url",
            "https://staging.example.org/api",
            "--rollback-dir",
            "/tmp/ids",
            "--allowed-fields",
            "GRADELEVEL,notes",
        ]);
        let config = apply_cli_overrides(Config::default(), &args);

        assert_eq!(config.api_url, "https://staging.example.org/api");
        assert_eq!(config.rollback_dir, PathBuf::from("/tmp/ids"));
        assert_eq!(config.allowed_fields.len(), 2);
        assert!(config.allowed_fields.contains("notes"));
    }

    #[test]
    fn test_no_cli_overrides_keeps_config() {
        let base = Config::default().with_api_url("https://api.example.org");
        let config = apply_cli_overrides(base.clone(), &parse_args(&["a.csv"]));

        assert_eq!(config.api_url, "https://api.example.org");
        assert_eq!(config.rollback_dir, base.rollback_dir);
        assert_eq!(config.allowed_fields, base.allowed_fields);
    }
}
