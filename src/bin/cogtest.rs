//! cogtest - interactive session runner
//!
//! Asks for variable ratings and intervention decisions, waits if needed,
//! then runs the configured timed tests. Every answer is appended to a new
//! log file in the session log directory.

use chrono::Local;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cogtrack::notify::{BeeminderClient, ProgressTracker, TerminalBell};
use cogtrack::session::ThreadSleeper;
use cogtrack::terminal::TerminalOperator;
use cogtrack::{
    run_session, CogError, Config, Operator, SessionHooks, SessionRecorder, SystemClock, VERSION,
};

/// cogtest - timed cognitive self-tests
#[derive(Parser)]
#[command(name = "cogtest")]
#[command(version = VERSION)]
#[command(about = "Run a cognitive self-test session", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./cogtest.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the session log directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Override the duration of each test, in seconds
    #[arg(long)]
    duration: Option<u64>,

    /// Do not offer the habit-tracker update
    #[arg(long)]
    no_tracker: bool,
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

fn run(cli: Cli) -> Result<(), SessionCliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    init_logging(&config);

    if let Some(log_dir) = cli.log_dir {
        config.session.log_dir = log_dir;
    }
    if let Some(duration) = cli.duration {
        config.session.test_duration_secs = duration;
    }

    if !atty::is(atty::Stream::Stdin) || !atty::is(atty::Stream::Stdout) {
        return Err(SessionCliError::NotATerminal);
    }

    let tracker = if cli.no_tracker || !config.tracker.enabled {
        None
    } else {
        match BeeminderClient::from_config(&config.tracker) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "habit tracker disabled");
                None
            }
        }
    };

    let mut recorder = SessionRecorder::create(&config.session.log_dir, Local::now())?;
    let mut operator = TerminalOperator::new();
    let mut sleeper = ThreadSleeper;
    let mut bell = TerminalBell::new(io::stdout());
    let clock = SystemClock::new();

    let summary = run_session(
        &config,
        &clock,
        &mut operator,
        &mut recorder,
        SessionHooks {
            sleeper: &mut sleeper,
            signal: &mut bell,
            tracker: tracker.as_ref().map(|t| t as &dyn ProgressTracker),
        },
    )?;

    operator.announce(&format!(
        "{} records written to {}",
        recorder.written(),
        recorder.path().display()
    ))?;
    if !summary.skipped.is_empty() {
        let skipped: Vec<&str> = summary.skipped.iter().map(|k| k.tag()).collect();
        operator.announce(&format!("Skipped: {}", skipped.join(", ")))?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum SessionCliError {
    Session(CogError),
    NotATerminal,
}

impl From<CogError> for SessionCliError {
    fn from(e: CogError) -> Self {
        SessionCliError::Session(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SessionCliError> for CliError {
    fn from(e: SessionCliError) -> Self {
        match e {
            SessionCliError::NotATerminal => CliError {
                code: "NOT_A_TERMINAL".to_string(),
                message: "cogtest needs an interactive terminal".to_string(),
                hint: Some("Run it directly in a terminal, not through a pipe".to_string()),
            },
            SessionCliError::Session(e) => {
                let (code, hint) = match &e {
                    CogError::Io(_) => ("IO_ERROR", "Check that the log directory is writable"),
                    CogError::ConfigParse(_) | CogError::Config(_) => {
                        ("CONFIG_ERROR", "Fix the configuration file and retry")
                    }
                    CogError::Terminal(_) => ("TERMINAL_ERROR", "Session aborted; earlier records are kept"),
                    _ => ("SESSION_ERROR", "Earlier records are kept in the session log"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}
