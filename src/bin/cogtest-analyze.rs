//! cogtest-analyze - per-day tables from session logs
//!
//! Reads every session log plus the newest dosage export and writes
//! `vars`, `interventions`, `drugs`, `scores_raw` and `scores_agg` as CSV.

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cogtrack::{analyze, CogError, Config, VERSION};

/// cogtest-analyze - aggregate session logs by day
#[derive(Parser)]
#[command(name = "cogtest-analyze")]
#[command(version = VERSION)]
#[command(about = "Aggregate cognitive self-test logs into per-day tables", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./cogtest.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the session log directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Override the output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the dosage export directory
    #[arg(long, conflicts_with = "no_dosage")]
    dosage_dir: Option<PathBuf>,

    /// Skip the dosage export
    #[arg(long)]
    no_dosage: bool,

    /// Print the analysis report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CogError> {
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config);

    let mut analysis = config.analysis;
    if let Some(log_dir) = cli.log_dir {
        analysis.log_dir = log_dir;
    }
    if let Some(output_dir) = cli.output_dir {
        analysis.output_dir = output_dir;
    }
    if let Some(dosage_dir) = cli.dosage_dir {
        analysis.dosage_dir = Some(dosage_dir);
    }
    if cli.no_dosage {
        analysis.dosage_dir = None;
    }

    let report = analyze(&analysis)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| CogError::Io(e.into()))?;
        println!("{}", json);
    } else {
        println!(
            "Read {} logs ({} records, {} skipped)",
            report.ingest.logs,
            report.ingest.records,
            report.ingest.unknown + report.ingest.malformed
        );
        if let Some(export) = &report.dosage_export {
            println!(
                "Dosage export: {} ({} rows)",
                export.display(),
                report.ingest.dosage_rows
            );
        }
        println!("Tables written to {}", report.output_dir.display());
    }
    Ok(())
}

// Error types

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CogError> for CliError {
    fn from(e: CogError) -> Self {
        let (code, hint) = match &e {
            CogError::LogDirMissing(_) => (
                "LOG_DIR_MISSING",
                Some("Run cogtest first or pass --log-dir"),
            ),
            CogError::DosageDirMissing(_) | CogError::NoDosageExport(_) => (
                "DOSAGE_EXPORT_MISSING",
                Some("Pass --dosage-dir or --no-dosage"),
            ),
            CogError::DosageColumnMissing(_) => (
                "DOSAGE_EXPORT_INVALID",
                Some("Export needs category_name, timestamp and value columns"),
            ),
            CogError::ConfigParse(_) | CogError::Config(_) => {
                ("CONFIG_ERROR", Some("Fix the configuration file and retry"))
            }
            CogError::Io(_) | CogError::Csv(_) => {
                ("IO_ERROR", Some("Check file paths and permissions"))
            }
            _ => ("ANALYSIS_ERROR", None),
        };
        CliError {
            code: code.to_string(),
            message: e.to_string(),
            hint: hint.map(str::to_string),
        }
    }
}
