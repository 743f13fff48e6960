//! Session log writer
//!
//! Each session appends to its own CSV log, one record per line:
//! `unix_timestamp, record_type, values...`. The file is opened, appended
//! and closed around every record, so a crash loses at most the trial in
//! progress.

use crate::error::CogError;
use crate::types::{Color, LogRecord, Operation};
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `strftime` pattern of the session start embedded in log file names
pub const SESSION_NAME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Extension of session log files
pub const LOG_EXTENSION: &str = "log";

/// Destination for records as they are produced
pub trait RecordSink {
    fn record(&mut self, record: &LogRecord) -> Result<(), CogError>;
}

impl RecordSink for Vec<LogRecord> {
    fn record(&mut self, record: &LogRecord) -> Result<(), CogError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Append-only writer for one session's log file
#[derive(Debug, Clone)]
pub struct SessionRecorder {
    path: PathBuf,
    written: usize,
}

impl SessionRecorder {
    /// Create the log directory if needed and name the log after `started_at`
    pub fn create(log_dir: &Path, started_at: DateTime<Local>) -> Result<Self, CogError> {
        fs::create_dir_all(log_dir)?;
        Ok(Self::at(log_dir.join(session_log_name(started_at))))
    }

    /// Append to an explicit path
    pub fn at(path: PathBuf) -> Self {
        Self { path, written: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended by this recorder
    pub fn written(&self) -> usize {
        self.written
    }
}

impl RecordSink for SessionRecorder {
    fn record(&mut self, record: &LogRecord) -> Result<(), CogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        writer.write_record(encode_record(record))?;
        writer.flush()?;

        self.written += 1;
        debug!(path = %self.path.display(), tag = %record.tag(), "record appended");
        Ok(())
    }
}

/// File name of the log for a session started at `started_at`
pub fn session_log_name(started_at: DateTime<Local>) -> String {
    format!("{}.{}", started_at.format(SESSION_NAME_FORMAT), LOG_EXTENSION)
}

/// Fields of one log line
pub fn encode_record(record: &LogRecord) -> Vec<String> {
    let mut fields = vec![record.timestamp().timestamp().to_string(), record.tag()];

    match record {
        LogRecord::Variable(r) => fields.push(r.value.to_string()),
        LogRecord::Intervention(r) => fields.push(r.dose.to_string()),
        LogRecord::ArithmeticTrial(r) => {
            fields.push(r.correctness.to_string());
            fields.push(r.latency_seconds.to_string());
            if let Some(c) = &r.context {
                fields.extend([
                    join_operators(&c.operators),
                    c.lhs.to_string(),
                    c.op.symbol().to_string(),
                    c.rhs.to_string(),
                    c.response.clone(),
                    c.expected.clone(),
                ]);
            }
        }
        LogRecord::NBackTrial(r) => {
            fields.push(r.correctness.to_string());
            fields.push(r.latency_seconds.to_string());
            if let Some(c) = &r.context {
                fields.extend([
                    c.n.to_string(),
                    c.stimulus.to_string(),
                    c.position.to_string(),
                    c.response.clone(),
                    c.expected().to_string(),
                ]);
            }
        }
        LogRecord::StroopTrial(r) => {
            fields.push(r.correctness.to_string());
            fields.push(r.latency_seconds.to_string());
            if let Some(c) = &r.context {
                fields.extend([
                    join_colors(&c.palette),
                    c.word.name().to_string(),
                    c.ink.name().to_string(),
                    c.response.clone(),
                    c.expected.clone(),
                ]);
            }
        }
    }

    fields
}

fn join_operators(operators: &[Operation]) -> String {
    operators
        .iter()
        .map(Operation::symbol)
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_colors(colors: &[Color]) -> String {
    colors.iter().map(Color::name).collect::<Vec<_>>().join(" ")
}
