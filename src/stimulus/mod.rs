//! Stimulus generation
//!
//! This module provides the three trial generators (arithmetic, n-back and
//! Stroop) behind one closed enum. Each generator produces the next stimulus
//! together with the key that counts as correct, and scores the operator's
//! response into a log record.

mod arithmetic;
mod nback;
mod stroop;

pub use arithmetic::{last_digit, ArithmeticGenerator};
pub use nback::NBackGenerator;
pub use stroop::StroopGenerator;

use crate::config::TestSpec;
use crate::types::{Color, Correctness, LogRecord, Operation, TestKind};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// What is shown to the operator for one trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stimulus {
    /// `lhs op rhs = ?`
    Problem { lhs: i64, op: Operation, rhs: i64 },
    /// N-back digit and its 1-based position in the test
    Digit { digit: u8, position: usize },
    /// Color word rendered in an ink color
    ColorWord { word: Color, ink: Color },
}

/// A stimulus and the key that answers it correctly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub stimulus: Stimulus,
    pub expected: char,
}

/// A single operator keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Key(char),
    /// A key that is not a printable character
    Unreadable,
}

impl Response {
    /// Text written to the log
    pub fn as_text(&self) -> String {
        match self {
            Response::Key(c) => c.to_string(),
            Response::Unreadable => String::new(),
        }
    }

    /// Judge the response against the expected key
    pub fn judge(&self, expected: char) -> Correctness {
        match self {
            Response::Key(c) => Correctness::from(*c == expected),
            Response::Unreadable => Correctness::Invalid,
        }
    }
}

/// One of the fixed trial generators
#[derive(Debug)]
pub enum TrialGenerator {
    Arithmetic(ArithmeticGenerator),
    NBack(NBackGenerator),
    Stroop(StroopGenerator),
}

impl TrialGenerator {
    /// Build a generator seeded from the OS
    pub fn from_spec(spec: &TestSpec) -> Self {
        Self::with_rng(spec, StdRng::from_entropy())
    }

    /// Build a generator with a fixed seed (for testing)
    pub fn with_seed(spec: &TestSpec, seed: u64) -> Self {
        Self::with_rng(spec, StdRng::seed_from_u64(seed))
    }

    fn with_rng(spec: &TestSpec, rng: StdRng) -> Self {
        match spec {
            TestSpec::Arithmetic {
                operators,
                operand_min,
                operand_max,
            } => TrialGenerator::Arithmetic(ArithmeticGenerator::new(
                operators.clone(),
                *operand_min..=*operand_max,
                rng,
            )),
            TestSpec::NBack {
                n,
                match_probability,
            } => TrialGenerator::NBack(NBackGenerator::new(*n, *match_probability, rng)),
            TestSpec::Stroop { palette } => {
                TrialGenerator::Stroop(StroopGenerator::new(palette.clone(), rng))
            }
        }
    }

    pub fn kind(&self) -> TestKind {
        match self {
            TrialGenerator::Arithmetic(_) => TestKind::Arithmetic,
            TrialGenerator::NBack(_) => TestKind::NBack,
            TrialGenerator::Stroop(_) => TestKind::Stroop,
        }
    }

    /// Human-readable description shown before the test starts
    pub fn description(&self) -> String {
        match self {
            TrialGenerator::Arithmetic(g) => {
                format!("Arithmetic test with {} operators", g.operators().len())
            }
            TrialGenerator::NBack(g) => format!("Single n-back test with n = {}", g.n()),
            TrialGenerator::Stroop(g) => {
                format!("Stroop test with {} colors", g.palette().len())
            }
        }
    }

    /// Produce the next stimulus
    pub fn next_stimulus(&mut self) -> Prompt {
        match self {
            TrialGenerator::Arithmetic(g) => g.next_prompt(),
            TrialGenerator::NBack(g) => g.next_prompt(),
            TrialGenerator::Stroop(g) => g.next_prompt(),
        }
    }

    /// Score a response to `prompt` into a trial record
    pub fn score_response(
        &self,
        prompt: &Prompt,
        response: Response,
        timestamp: DateTime<Utc>,
        latency_seconds: f64,
    ) -> LogRecord {
        match self {
            TrialGenerator::Arithmetic(g) => {
                LogRecord::ArithmeticTrial(g.score(prompt, response, timestamp, latency_seconds))
            }
            TrialGenerator::NBack(g) => {
                LogRecord::NBackTrial(g.score(prompt, response, timestamp, latency_seconds))
            }
            TrialGenerator::Stroop(g) => {
                LogRecord::StroopTrial(g.score(prompt, response, timestamp, latency_seconds))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[test]
    fn test_judge_response() {
        assert_eq!(Response::Key('7').judge('7'), Correctness::Correct);
        assert_eq!(Response::Key('3').judge('7'), Correctness::Incorrect);
        assert_eq!(Response::Unreadable.judge('7'), Correctness::Invalid);
    }

    #[test]
    fn test_generators_from_default_config() {
        let config = SessionConfig::default();
        let kinds: Vec<TestKind> = config
            .tests
            .iter()
            .map(|spec| TrialGenerator::with_seed(spec, 1).kind())
            .collect();
        assert_eq!(
            kinds,
            vec![TestKind::Arithmetic, TestKind::NBack, TestKind::Stroop]
        );

        let nback = TrialGenerator::with_seed(&config.tests[1], 1);
        assert_eq!(nback.description(), "Single n-back test with n = 3");
    }

    #[test]
    fn test_score_unreadable_response_is_invalid() {
        let config = SessionConfig::default();
        let mut generator = TrialGenerator::with_seed(&config.tests[0], 9);
        let prompt = generator.next_stimulus();
        let record = generator.score_response(&prompt, Response::Unreadable, Utc::now(), 0.5);

        let (correctness, latency) = record.outcome().unwrap();
        assert_eq!(correctness, Correctness::Invalid);
        assert_eq!(latency, 0.5);
    }
}
