//! Attention signal and habit-tracker update
//!
//! Both are thin collaborators at the edge of a session: the signal tells the
//! operator that the intervention wait is over, and the tracker records that a
//! session was completed.

use crate::config::TrackerConfig;
use crate::error::CogError;
use serde_json::json;
use std::env;
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

/// Gets the operator's attention after a wait
pub trait AttentionSignal {
    fn signal(&mut self, message: &str) -> Result<(), CogError>;
}

/// Rings the terminal bell and prints the message
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> AttentionSignal for TerminalBell<W> {
    fn signal(&mut self, message: &str) -> Result<(), CogError> {
        write!(self.out, "\x07{}\r\n", message)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Fire-and-forget update of a habit-tracker goal
pub trait ProgressTracker {
    fn send(&self, goal: &str, amount: f64, comment: &str) -> Result<(), CogError>;
}

/// Beeminder datapoint client
#[derive(Debug, Clone)]
pub struct BeeminderClient {
    base_url: String,
    user: String,
    auth_token: String,
    timeout: Duration,
}

impl BeeminderClient {
    pub fn new(base_url: &str, user: &str, auth_token: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            auth_token: auth_token.to_string(),
            timeout,
        }
    }

    /// Build a client, reading the token from the configured environment variable
    pub fn from_config(config: &TrackerConfig) -> Result<Self, CogError> {
        let auth_token = env::var(&config.auth_token_env).map_err(|_| {
            CogError::Tracker(format!("{} is not set", config.auth_token_env))
        })?;
        Ok(Self::new(
            &config.base_url,
            &config.user,
            &auth_token,
            Duration::from_millis(config.timeout_ms),
        ))
    }

    pub fn datapoint_url(&self, goal: &str) -> String {
        format!(
            "{}/users/{}/goals/{}/datapoints.json",
            self.base_url, self.user, goal
        )
    }
}

impl ProgressTracker for BeeminderClient {
    fn send(&self, goal: &str, amount: f64, comment: &str) -> Result<(), CogError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();

        let body = json!({
            "auth_token": self.auth_token,
            "value": amount,
            "comment": comment,
        });

        match agent.post(&self.datapoint_url(goal)).send_json(body) {
            Ok(response) => {
                info!(goal, status = response.status(), "tracker updated");
                Ok(())
            }
            Err(ureq::Error::Status(code, _)) => {
                warn!(goal, status = code, "tracker rejected datapoint");
                Err(CogError::Tracker(format!("http status {}", code)))
            }
            Err(ureq::Error::Transport(err)) => {
                warn!(goal, error = %err, "tracker unreachable");
                Err(CogError::Tracker(format!("http transport failure: {}", err)))
            }
        }
    }
}
