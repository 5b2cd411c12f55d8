//! Report CSV rows whose link column points at an unreachable URL

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::*;
use resource_ingest::app::services::link_checker::{HttpLinkProbe, LinkCheckReport, LinkChecker};
use resource_ingest::cli::commands::setup_logging;
use resource_ingest::constants::{DEFAULT_LINK_CHECK_CONCURRENCY, DEFAULT_LINK_COLUMN};
use std::path::PathBuf;
use std::process;

/// CLI arguments for the link checker
#[derive(Debug, Parser)]
#[command(
    name = "check-links",
    version,
    about = "Check links in a CSV column and list the rows whose links are broken"
)]
struct LinkArgs {
    /// Path to the input CSV file
    #[arg(value_name = "CSV_FILE", help = "Path to the input CSV file")]
    csv_file: PathBuf,

    /// One-based column holding the link
    #[arg(
        long = "column",
        value_name = "N",
        default_value_t = DEFAULT_LINK_COLUMN + 1,
        help = "Column holding the link (1 = first column)"
    )]
    column: usize,

    /// Number of links probed at once
    #[arg(
        short = 'j',
        long = "concurrency",
        value_name = "COUNT",
        default_value_t = DEFAULT_LINK_CHECK_CONCURRENCY,
        help = "Number of links checked concurrently"
    )]
    concurrency: usize,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Only print the broken rows",
        conflicts_with = "verbose"
    )]
    quiet: bool,
}

impl LinkArgs {
    fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            // Skipped-row warnings are shown by default
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

fn main() {
    let args = LinkArgs::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    if let Err(error) = runtime.block_on(run(args)) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

async fn run(args: LinkArgs) -> Result<()> {
    setup_logging(args.log_level(), args.quiet)?;
    anyhow::ensure!(args.column >= 1, "--column counts from 1");

    let probe = HttpLinkProbe::new().context("Failed to set up HTTP client")?;
    let checker = LinkChecker::new(probe, args.concurrency).with_progress(!args.quiet);

    let report = checker
        .check_file(&args.csv_file, args.column - 1)
        .await
        .with_context(|| format!("Failed to check links in {}", args.csv_file.display()))?;

    print_report(&report, args.quiet);
    Ok(())
}

fn print_report(report: &LinkCheckReport, quiet: bool) {
    if !quiet {
        println!("{}", "Header:".bright_cyan());
        println!("{:?}", report.header);
        println!("{}", "-".repeat(80));
    }

    if report.is_clean() {
        if !quiet {
            println!(
                "{} ({} links checked)",
                "No broken links found.".bright_green().bold(),
                report.checked
            );
        }
        return;
    }

    println!("\n{}", "Rows with broken links:".bright_red().bold());
    for broken in &report.broken {
        println!(
            "Row {} ({}): {:?}",
            broken.row.row_number, broken.status, broken.row.fields
        );
    }
}
