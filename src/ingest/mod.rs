//! Log ingestion
//!
//! Reads session logs and the dosage export into per-day buckets:
//!
//! - `variables`: variable name → readings
//! - `interventions`: intervention name → doses
//! - `dosages`: dosage category → amounts
//! - `scores`: score metric → correctness or latency samples
//!
//! A log whose file name encodes the session start is bucketed by that date.
//! Otherwise each row's own unix timestamp decides its (UTC) day. Either way
//! a row whose timestamp does not parse is rejected.

mod dosage;
mod session_log;

pub use dosage::{latest_export, read_export, DosageExport};
pub use session_log::{parse_record, session_start_from_name, MalformedRow};

use crate::buckets::DayBuckets;
use crate::error::CogError;
use crate::types::{Correctness, Dose, LogRecord, Sample, TestKind};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Metric for n-back trials whose stimulus was a true match
pub const NBACK_POSITIVE_ACCURACY: &str = "nback_positive_accuracy";
/// Metric for n-back trials whose stimulus was not a match
pub const NBACK_NEGATIVE_ACCURACY: &str = "nback_negative_accuracy";
/// Metric for incorrect Stroop answers that named the word
pub const STROOP_INTERFERENCE_RATE: &str = "stroop_interference_rate";

/// Accuracy metric name for a test
pub fn accuracy_metric(kind: TestKind) -> String {
    format!("{}_accuracy", kind.metric_prefix())
}

/// Latency metric name for a test
pub fn time_metric(kind: TestKind) -> String {
    format!("{}_time", kind.metric_prefix())
}

/// Named contents of one session log
#[derive(Debug, Clone)]
pub struct LogSource {
    pub name: String,
    pub contents: String,
}

impl LogSource {
    pub fn new(name: &str, contents: &str) -> Self {
        Self {
            name: name.to_string(),
            contents: contents.to_string(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, CogError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            contents: fs::read_to_string(path)?,
        })
    }
}

/// How rows of a log are assigned to days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayMode {
    /// Every row belongs to the session date from the file name
    FileName(NaiveDate),
    /// Each row's unix timestamp decides its day
    RecordTimestamp,
}

impl DayMode {
    pub fn for_source(name: &str) -> Self {
        match session_start_from_name(name) {
            Some(start) => DayMode::FileName(start.date()),
            None => DayMode::RecordTimestamp,
        }
    }

    fn day_of(&self, record: &LogRecord) -> NaiveDate {
        match self {
            DayMode::FileName(day) => *day,
            DayMode::RecordTimestamp => record.timestamp().date_naive(),
        }
    }
}

/// Per-day buckets produced by ingestion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub variables: DayBuckets<i64>,
    pub interventions: DayBuckets<Dose>,
    pub dosages: DayBuckets<f64>,
    pub scores: DayBuckets<Sample>,
}

/// Counters reported after ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub logs: usize,
    pub records: usize,
    pub unknown: usize,
    pub malformed: usize,
    pub dosage_rows: usize,
    pub dosage_skipped: usize,
}

/// Accumulates logs and dosage entries into day buckets
#[derive(Debug, Default)]
pub struct LogIngestor {
    ingested: Ingested,
    stats: IngestStats,
}

impl LogIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest every row of one session log
    pub fn ingest_log(&mut self, source: &LogSource) -> Result<(), CogError> {
        let mode = DayMode::for_source(&source.name);
        debug!(log = %source.name, ?mode, "reading session log");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source.contents.as_bytes());

        for (line, row) in reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(log = %source.name, line = line + 1, error = %e, "unreadable row");
                    self.stats.malformed += 1;
                    continue;
                }
            };
            let fields: Vec<&str> = row.iter().collect();

            match parse_record(&fields) {
                Ok(Some(record)) => {
                    self.ingest_record(mode.day_of(&record), &record);
                    self.stats.records += 1;
                }
                Ok(None) => self.stats.unknown += 1,
                Err(e) => {
                    warn!(log = %source.name, line = line + 1, error = %e, "skipping row");
                    self.stats.malformed += 1;
                }
            }
        }

        self.stats.logs += 1;
        Ok(())
    }

    /// Add one decoded record to the buckets of `day`
    pub fn ingest_record(&mut self, day: NaiveDate, record: &LogRecord) {
        match record {
            LogRecord::Variable(r) => self.ingested.variables.push(day, &r.name, r.value),
            LogRecord::Intervention(r) => {
                self.ingested
                    .interventions
                    .push(day, &r.name, r.dose.clone())
            }
            LogRecord::ArithmeticTrial(_) => self.push_outcome(day, record),
            LogRecord::NBackTrial(r) => {
                self.push_outcome(day, record);
                if let Some(context) = &r.context {
                    let metric = if context.is_match {
                        NBACK_POSITIVE_ACCURACY
                    } else {
                        NBACK_NEGATIVE_ACCURACY
                    };
                    self.ingested
                        .scores
                        .push(day, metric, Sample::Outcome(r.correctness));
                }
            }
            LogRecord::StroopTrial(r) => {
                self.push_outcome(day, record);
                if let (Correctness::Incorrect, Some(context)) = (r.correctness, &r.context) {
                    let interference = Correctness::from(context.is_word_interference());
                    self.ingested.scores.push(
                        day,
                        STROOP_INTERFERENCE_RATE,
                        Sample::Outcome(interference),
                    );
                }
            }
        }
    }

    fn push_outcome(&mut self, day: NaiveDate, record: &LogRecord) {
        if let (Some(kind), Some((correctness, latency))) = (record.test_kind(), record.outcome())
        {
            let scores = &mut self.ingested.scores;
            scores.push(day, &accuracy_metric(kind), Sample::Outcome(correctness));
            scores.push(day, &time_metric(kind), Sample::Latency(latency));
        }
    }

    /// Ingest the dosage export; amounts are bucketed by the UTC day of their timestamp
    pub fn ingest_dosage<R: std::io::Read>(&mut self, reader: R) -> Result<(), CogError> {
        let export = read_export(reader)?;
        for record in &export.records {
            self.ingested
                .dosages
                .push(record.timestamp.date_naive(), &record.category, record.value);
        }
        self.stats.dosage_rows += export.records.len();
        self.stats.dosage_skipped += export.skipped;
        Ok(())
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn finish(self) -> (Ingested, IngestStats) {
        (self.ingested, self.stats)
    }
}
