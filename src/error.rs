//! Error types for cogtrack

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running a session or analyzing logs
#[derive(Debug, Error)]
pub enum CogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Session log directory not found: {}", .0.display())]
    LogDirMissing(PathBuf),

    #[error("Dosage export directory not found: {}", .0.display())]
    DosageDirMissing(PathBuf),

    #[error("No dosage export (*.csv) in {}", .0.display())]
    NoDosageExport(PathBuf),

    #[error("Dosage export is missing column: {0}")]
    DosageColumnMissing(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Progress tracker error: {0}")]
    Tracker(String),

    #[error("No valid samples for metric: {0}")]
    NoValidSamples(String),
}
