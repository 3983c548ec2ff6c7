//! projstat CLI - Timesheet statistics
//!
//! Scans a folder of per-person timesheet workbooks and prints rankings of
//! the busiest days, busiest months and most active employees, optionally
//! exporting them to an Excel workbook.

mod exit;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use projstat_core::{RankingConfig, RankingKind, Renderer, DEFAULT_DAY_LIMIT};
use projstat_loader::{load_directory, FileLocator};
use projstat_render::{validate_export_target, ExcelExporter, JsonRenderer, TextRenderer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::exit::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "projstat")]
#[command(author, version, about = "Rank working hours from per-person timesheet workbooks", long_about = None)]
struct Cli {
    /// Root folder to scan for timesheet workbooks
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Export the rankings to an Excel workbook
    #[arg(short = 'x', long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Rank the busiest days
    #[arg(short, long)]
    day: bool,

    /// Rank the busiest months
    #[arg(short, long)]
    month: bool,

    /// Rank employees by working hours
    #[arg(short, long)]
    employee: bool,

    /// Maximum number of days listed (0 for no limit)
    #[arg(long, value_name = "N", env = "PROJSTAT_DAY_LIMIT", default_value_t = DEFAULT_DAY_LIMIT)]
    day_limit: usize,

    /// Maximum number of months listed (0 for no limit)
    #[arg(long, value_name = "N", env = "PROJSTAT_MONTH_LIMIT")]
    month_limit: Option<usize>,

    /// Maximum number of employees listed (0 for no limit)
    #[arg(long, value_name = "N", env = "PROJSTAT_EMPLOYEE_LIMIT")]
    employee_limit: Option<usize>,

    /// Console output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Selected ranking kinds, in output order
    fn ranking_kinds(&self) -> Vec<RankingKind> {
        [
            (self.day, RankingKind::Day),
            (self.month, RankingKind::Month),
            (self.employee, RankingKind::Employee),
        ]
        .into_iter()
        .filter_map(|(selected, kind)| selected.then_some(kind))
        .collect()
    }

    fn ranking_config(&self) -> RankingConfig {
        RankingConfig::new()
            .day_limit(cap(Some(self.day_limit)))
            .month_limit(cap(self.month_limit))
            .employee_limit(cap(self.employee_limit))
    }
}

/// Zero on the command line lifts the cap
fn cap(limit: Option<usize>) -> Option<usize> {
    limit.filter(|&n| n > 0)
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success.into(),
                _ => ExitCode::Failure.into(),
            };
        }
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::Failure.into()
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let Some(input) = cli.input.as_deref() else {
        return Ok(fatal_with_usage("Missing required input option with correct path"));
    };

    let kinds = cli.ranking_kinds();
    if kinds.is_empty() {
        return Ok(fatal_with_usage("Missing ranking type option (--day, --month or --employee)"));
    }

    let loaded = load_directory(input, &FileLocator::new());
    if loaded.summary.files_found == 0 {
        return Ok(fatal_with_usage(&format!(
            "Incorrect path or no timesheet workbooks in {}",
            input.display()
        )));
    }
    if loaded.repository.is_empty() {
        return Ok(fatal_with_usage(&format!(
            "No employee timesheets could be read from {}",
            input.display()
        )));
    }
    if loaded.summary.files_skipped > 0 {
        warn!(
            skipped = loaded.summary.files_skipped,
            found = loaded.summary.files_found,
            "some timesheet files could not be read"
        );
    }

    let rankings = cli
        .ranking_config()
        .compute_all(&kinds, &loaded.repository);

    let output = match cli.format {
        OutputFormat::Text => TextRenderer::new().render(&rankings),
        OutputFormat::Json => JsonRenderer::new().render(&rankings).map(|json| json + "\n"),
    }
    .context("failed to render rankings")?;
    print!("{output}");

    if let Some(target) = cli.export.as_deref() {
        return Ok(export(&rankings, target));
    }

    Ok(ExitCode::Success)
}

fn export(rankings: &[projstat_core::Ranking], target: &Path) -> ExitCode {
    if let Err(err) = validate_export_target(target) {
        eprintln!("ERROR: {err}");
        return ExitCode::Failure;
    }

    match ExcelExporter::new().save(rankings, target) {
        Ok(()) => {
            info!(path = %target.display(), "export complete");
            println!("Excel file written successfully: {}", target.display());
        }
        Err(err) => eprintln!("Excel file writing failed: {err}"),
    }
    ExitCode::Success
}

fn fatal_with_usage(message: &str) -> ExitCode {
    eprintln!("ERROR: {message}");
    eprintln!("{}", Cli::command().render_help());
    ExitCode::Failure
}
