//! `sheetload`: load a table from the first source that works and report on it

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sl_core::{Dataset, FailureReason, LoadFailure, SheetSelector, SourceDescriptor};
use sl_data::{Loader, LoaderConfig, Session};
use sl_report::{
    categorical_columns, crosstab, describe, describe_table, preview, value_counts, ColumnSummary,
    CrossTab, GroupCounts,
};

mod diagnostics;
mod render;

use diagnostics::Diagnostics;

/// Exit code when no source produced a dataset
const EXIT_NO_DATA: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "sheetload", version, about = "Load a spreadsheet or CSV and summarize it")]
struct Cli {
    /// File to load instead of the default sources (.xlsx, .xls, .csv)
    #[arg(long, value_name = "PATH")]
    upload: Option<PathBuf>,

    /// Remote CSV URL tried after the local data file
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// File name looked up under the data/ directories
    #[arg(long, value_name = "NAME")]
    data_file: Option<String>,

    /// Workbook sheet, by zero-based index or by name
    #[arg(long, value_name = "INDEX|NAME")]
    sheet: Option<String>,

    /// Rows shown in the preview
    #[arg(long, default_value_t = 30)]
    rows: usize,

    /// Column to count values of; defaults to the first text column
    #[arg(long, value_name = "COL")]
    category: Option<String>,

    /// Second column to break the counts down by
    #[arg(long, value_name = "COL")]
    group_by: Option<String>,

    /// Extra cell value read as missing; may be repeated
    #[arg(long = "null-token", value_name = "TOKEN")]
    null_tokens: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print where the loader looked
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    fn loader_config(&self) -> LoaderConfig {
        let mut config = LoaderConfig::from_env();
        if let Some(url) = &self.url {
            config.remote_url = Some(url.clone());
        }
        if let Some(file) = &self.data_file {
            config.data_file = file.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet = SheetSelector::parse(sheet);
        }
        for token in &self.null_tokens {
            config.null_config.add_pattern(token.clone());
        }
        config
    }
}

/// Everything printed for a loaded dataset
#[derive(Serialize)]
struct Report<'a> {
    source: &'a SourceDescriptor,
    rows: usize,
    columns: Vec<String>,
    preview: Vec<Map<String, Value>>,
    summary: Vec<ColumnSummary>,
    counts: Option<GroupCounts>,
    crosstab: Option<CrossTab>,
    failures: &'a [LoadFailure],
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<Diagnostics>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.loader_config();
    let loader = Loader::new(&config);

    let code = run(&cli, &config, &loader)?;
    Ok(ExitCode::from(code))
}

/// Load, report, and return the process exit code
fn run(cli: &Cli, config: &LoaderConfig, loader: &Loader) -> Result<u8> {
    let (session, failures) = load(cli, config, loader);
    let diagnostics = cli.debug.then(|| Diagnostics::collect(config));

    let (dataset, source) = match (session.dataset(), session.source()) {
        (Some(dataset), Some(source)) => (dataset, source),
        _ => {
            eprintln!("no data available, provide one of: local file / upload / URL");
            for failure in &failures {
                eprintln!("  - {}", failure);
            }
            if let Some(diagnostics) = &diagnostics {
                eprint!("{}", diagnostics);
            }
            return Ok(EXIT_NO_DATA);
        }
    };

    let report = build_report(cli, dataset, source, &failures, diagnostics)?;
    match cli.format {
        OutputFormat::Text => print_text(cli, dataset, &report)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }

    Ok(0)
}

/// Resolve this run's dataset.
///
/// An upload replaces the default plan entirely; the local candidates and
/// the remote URL are only consulted when no upload is given.
fn load(cli: &Cli, config: &LoaderConfig, loader: &Loader) -> (Session, Vec<LoadFailure>) {
    let mut session = Session::new();

    let failures = match &cli.upload {
        Some(path) => {
            let failures = match read_upload(path, &config.sheet) {
                Ok(upload) => {
                    let outcome = session.upload(loader, upload);
                    if outcome.is_loaded() {
                        info!("Using uploaded file {}", path.display());
                    }
                    outcome.failures().to_vec()
                }
                Err(failure) => vec![failure],
            };
            for failure in &failures {
                warn!("Could not read uploaded file: {}", failure);
            }
            failures
        }
        None => {
            session.ensure_loaded(loader, &config.source_plan());
            session.last_failures().to_vec()
        }
    };

    (session, failures)
}

/// Read an upload from disk; a file that cannot be read is a load failure
fn read_upload(path: &Path, sheet: &SheetSelector) -> Result<SourceDescriptor, LoadFailure> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match std::fs::read(path) {
        Ok(bytes) => Ok(SourceDescriptor::upload(name, bytes).with_sheet(sheet.clone())),
        Err(e) => Err(LoadFailure {
            source: SourceDescriptor::upload(name, Vec::new()).with_sheet(sheet.clone()),
            reason: FailureReason::Unreadable(format!("{}: {}", path.display(), e)),
        }),
    }
}

/// Column counted when none is requested: first text column, else the first column
fn default_category(dataset: &Dataset) -> Option<String> {
    categorical_columns(dataset)
        .into_iter()
        .next()
        .or_else(|| dataset.column_names().into_iter().next())
}

fn build_report<'a>(
    cli: &Cli,
    dataset: &Dataset,
    source: &'a SourceDescriptor,
    failures: &'a [LoadFailure],
    diagnostics: Option<Diagnostics>,
) -> Result<Report<'a>> {
    let summary = describe(dataset).context("Failed to summarize columns")?;

    let category = cli.category.clone().or_else(|| default_category(dataset));
    let (counts, crosstab) = match (&category, &cli.group_by) {
        (Some(x), Some(by)) => (None, Some(crosstab(dataset, x, by)?)),
        (Some(x), None) => (Some(value_counts(dataset, x)?), None),
        (None, _) => (None, None),
    };

    Ok(Report {
        source,
        rows: dataset.num_rows(),
        columns: dataset.column_names(),
        preview: render::rows_as_json(&preview(dataset, cli.rows))?,
        summary,
        counts,
        crosstab,
        failures,
        diagnostics,
    })
}

fn print_text(cli: &Cli, dataset: &Dataset, report: &Report<'_>) -> Result<()> {
    if let Some(diagnostics) = &report.diagnostics {
        println!("{}", diagnostics);
        for failure in report.failures {
            println!("Skipped {}", failure);
        }
        println!();
    }

    println!("Source: {}", report.source);
    println!("Rows: {} • Columns: {}", report.rows, report.columns.join(", "));
    println!("{}", render::table(&preview(dataset, cli.rows))?);

    println!("\nSummary");
    println!("{}", render::table(&describe_table(&report.summary)?)?);

    if let Some(counts) = &report.counts {
        println!("\nCounts by {}", counts.column);
        println!("{}", render::table(&counts.to_dataset()?)?);
    }
    if let Some(tab) = &report.crosstab {
        println!("\nCounts by {} and {}", tab.row_column, tab.col_column);
        println!("{}", render::table(&tab.to_dataset()?)?);
    }

    Ok(())
}
