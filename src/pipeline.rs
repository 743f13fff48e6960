//! Analysis pipeline
//!
//! Reads every session log and the latest dosage export, then writes the
//! five per-day tables:
//!
//! 1. `vars` - last reading of each variable
//! 2. `interventions` - last dose of each intervention
//! 3. `drugs` - summed dosage per category
//! 4. `scores_raw` - raw score samples
//! 5. `scores_agg` - reduced score metrics
//!
//! Nothing persists between runs; every table is rebuilt from the logs.

use crate::aggregate::{aggregate_scores, latest, raw_tokens, totals};
use crate::buckets::DayMap;
use crate::config::AnalysisConfig;
use crate::error::CogError;
use crate::export::TableExporter;
use crate::ingest::{latest_export, IngestStats, Ingested, LogIngestor, LogSource};
use crate::recorder::LOG_EXTENSION;
use crate::types::Dose;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Per-day tables ready for export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisTables {
    pub vars: DayMap<i64>,
    pub interventions: DayMap<Dose>,
    pub drugs: DayMap<f64>,
    pub scores_raw: DayMap<String>,
    pub scores_agg: DayMap<f64>,
}

/// Rows written per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableRows {
    pub vars: usize,
    pub interventions: usize,
    pub drugs: usize,
    pub scores_raw: usize,
    pub scores_agg: usize,
}

/// Summary of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub ingest: IngestStats,
    pub dosage_export: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub rows: TableRows,
}

/// Reduce ingested buckets into the five tables
pub fn build_tables(ingested: &Ingested) -> AnalysisTables {
    AnalysisTables {
        vars: latest(&ingested.variables),
        interventions: latest(&ingested.interventions),
        drugs: totals(&ingested.dosages),
        scores_raw: raw_tokens(&ingested.scores),
        scores_agg: aggregate_scores(&ingested.scores),
    }
}

/// Session logs in `dir`, sorted by file name
pub fn session_logs(dir: &Path) -> Result<Vec<PathBuf>, CogError> {
    if !dir.is_dir() {
        return Err(CogError::LogDirMissing(dir.to_path_buf()));
    }

    let mut logs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == LOG_EXTENSION) {
            logs.push(path);
        }
    }
    logs.sort();
    Ok(logs)
}

/// Run a full analysis with `config`
pub fn analyze(config: &AnalysisConfig) -> Result<AnalysisReport, CogError> {
    let mut ingestor = LogIngestor::new();

    for path in session_logs(&config.log_dir)? {
        info!(log = %path.display(), "reading");
        ingestor.ingest_log(&LogSource::read(&path)?)?;
    }

    let dosage_export = match config.resolved_dosage_dir() {
        Some(dir) => {
            let path = latest_export(&dir)?;
            ingestor.ingest_dosage(File::open(&path)?)?;
            Some(path)
        }
        None => None,
    };

    let (ingested, stats) = ingestor.finish();
    let tables = build_tables(&ingested);

    let exporter = TableExporter::new(&config.output_dir);
    let rows = TableRows {
        vars: exporter.export("vars", &tables.vars)?,
        interventions: exporter.export("interventions", &tables.interventions)?,
        drugs: exporter.export("drugs", &tables.drugs)?,
        scores_raw: exporter.export("scores_raw", &tables.scores_raw)?,
        scores_agg: exporter.export("scores_agg", &tables.scores_agg)?,
    };

    info!(
        logs = stats.logs,
        records = stats.records,
        skipped = stats.unknown + stats.malformed,
        "analysis written"
    );

    Ok(AnalysisReport {
        ingest: stats,
        dosage_export,
        output_dir: config.output_dir.clone(),
        rows,
    })
}
