//! cogtrack - Cognitive self-tracking
//!
//! Runs timed mental-performance tests (arithmetic, single n-back, Stroop)
//! alongside self-rated variables and self-administered interventions, and
//! folds the accumulated session logs into per-day tables.
//!
//! ## Phases
//!
//! - **Session**: elicitation → optional wait → timed tests, every record
//!   appended to the session log as it is produced
//! - **Analysis**: session logs + dosage export → day buckets → reductions
//!   → CSV tables
//!
//! The two phases share nothing but the log files on disk.

pub mod aggregate;
pub mod buckets;
pub mod config;
pub mod elicitor;
pub mod error;
pub mod export;
pub mod ingest;
pub mod notify;
pub mod operator;
pub mod pipeline;
pub mod recorder;
pub mod runner;
pub mod session;
pub mod stimulus;
pub mod types;

// Interactive terminal (only needed by the binaries)
#[cfg(feature = "cli")]
pub mod terminal;

pub use config::Config;
pub use error::CogError;
pub use operator::Operator;
pub use pipeline::{analyze, AnalysisReport};
pub use recorder::{RecordSink, SessionRecorder};
pub use runner::{Clock, SystemClock, TrialRunner};
pub use session::{run_session, Session, SessionHooks, SessionSummary};
pub use types::{Correctness, LogRecord, TestKind};

/// Crate version reported by the binaries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
