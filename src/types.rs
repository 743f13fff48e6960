//! Core types for cogtrack
//!
//! This module defines the records that flow from a live session into the
//! append-only log and back out of it at analysis time: variable readings,
//! intervention doses, trial outcomes and external dosage entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of timed tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Arithmetic,
    NBack,
    Stroop,
}

impl TestKind {
    /// Record type tag written to the session log
    pub fn tag(&self) -> &'static str {
        match self {
            TestKind::Arithmetic => "ArithmeticTest",
            TestKind::NBack => "NBackTest",
            TestKind::Stroop => "StroopTest",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ArithmeticTest" => Some(TestKind::Arithmetic),
            "NBackTest" => Some(TestKind::NBack),
            "StroopTest" => Some(TestKind::Stroop),
            _ => None,
        }
    }

    /// Prefix used for the analysis metric names of this test
    pub fn metric_prefix(&self) -> &'static str {
        match self {
            TestKind::Arithmetic => "arithmetic",
            TestKind::NBack => "nback",
            TestKind::Stroop => "stroop",
        }
    }
}

/// Tri-state outcome of a trial
///
/// `Invalid` marks a response (or a legacy log token) that cannot be judged.
/// It is kept in raw exports but never counts towards accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Correctness {
    Correct,
    Incorrect,
    Invalid,
}

impl Correctness {
    /// Decode a boolean-like log token.
    ///
    /// Accepts `true`/`false` and `y`/`n`/`yes`/`no` (any case). Anything
    /// else decodes to `Invalid` rather than an error.
    pub fn decode(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "true" | "y" | "yes" => Correctness::Correct,
            "false" | "n" | "no" => Correctness::Incorrect,
            _ => Correctness::Invalid,
        }
    }

    /// Token written to the session log
    pub fn as_str(&self) -> &'static str {
        match self {
            Correctness::Correct => "true",
            Correctness::Incorrect => "false",
            Correctness::Invalid => "invalid",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Correctness::Correct => Some(true),
            Correctness::Incorrect => Some(false),
            Correctness::Invalid => None,
        }
    }
}

impl From<bool> for Correctness {
    fn from(v: bool) -> Self {
        if v {
            Correctness::Correct
        } else {
            Correctness::Incorrect
        }
    }
}

impl fmt::Display for Correctness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arithmetic operators available to the arithmetic test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "*",
            Operation::Div => "/",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operation::Add),
            "-" => Some(Operation::Sub),
            "*" => Some(Operation::Mul),
            "/" => Some(Operation::Div),
            _ => None,
        }
    }

    /// Apply the operator. Division truncates toward zero; `None` on a zero
    /// divisor or overflow.
    pub fn apply(&self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            Operation::Add => lhs.checked_add(rhs),
            Operation::Sub => lhs.checked_sub(rhs),
            Operation::Mul => lhs.checked_mul(rhs),
            Operation::Div => lhs.checked_div(rhs),
        }
    }
}

/// Ink and word colors for the Stroop test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Black,
}

impl Color {
    pub fn name(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Magenta => "magenta",
            Color::Cyan => "cyan",
            Color::White => "white",
            Color::Black => "black",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "yellow" => Some(Color::Yellow),
            "blue" => Some(Color::Blue),
            "magenta" => Some(Color::Magenta),
            "cyan" => Some(Color::Cyan),
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }

    /// Key the operator presses to name this color
    pub fn initial(&self) -> char {
        // names are non-empty ASCII
        self.name().chars().next().unwrap_or('?')
    }
}

/// A self-rated scalar reading
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub value: i64,
}

/// Dose of an intervention as logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dose {
    /// Intervention skipped
    None,
    /// Free-text dose or randomization arm
    Amount(String),
}

impl Dose {
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed == "none" {
            Dose::None
        } else {
            Dose::Amount(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Dose::None => "none",
            Dose::Amount(amount) => amount.as_str(),
        }
    }
}

impl fmt::Display for Dose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A self-administered intervention
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionRecord {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub dose: Dose,
}

/// One stimulus-response-latency unit
///
/// `context` carries the test-specific fields. It is always present for
/// trials produced by the runner, and absent for legacy log rows that only
/// stored correctness and latency.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord<C> {
    pub timestamp: DateTime<Utc>,
    pub correctness: Correctness,
    pub latency_seconds: f64,
    pub context: Option<C>,
}

/// Arithmetic trial fields
#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticContext {
    pub operators: Vec<Operation>,
    pub lhs: i64,
    pub op: Operation,
    pub rhs: i64,
    pub response: String,
    pub expected: String,
}

/// N-back trial fields
#[derive(Debug, Clone, PartialEq)]
pub struct NBackContext {
    pub n: usize,
    pub stimulus: u8,
    /// 1-based position of the stimulus in the test's history
    pub position: usize,
    pub response: String,
    /// Ground truth: the stimulus matched the one n steps back
    pub is_match: bool,
}

impl NBackContext {
    /// Expected key for this trial
    pub fn expected(&self) -> &'static str {
        if self.is_match {
            "y"
        } else {
            "n"
        }
    }
}

/// Stroop trial fields
#[derive(Debug, Clone, PartialEq)]
pub struct StroopContext {
    pub palette: Vec<Color>,
    pub word: Color,
    pub ink: Color,
    pub response: String,
    pub expected: String,
}

impl StroopContext {
    /// The operator named the word instead of the ink
    pub fn is_word_interference(&self) -> bool {
        self.response.chars().next() == Some(self.word.initial())
    }
}

/// An entry from the external dosage export
#[derive(Debug, Clone, PartialEq)]
pub struct DosageRecord {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub value: f64,
}

/// A session log record
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Variable(VariableRecord),
    Intervention(InterventionRecord),
    ArithmeticTrial(TrialRecord<ArithmeticContext>),
    NBackTrial(TrialRecord<NBackContext>),
    StroopTrial(TrialRecord<StroopContext>),
}

impl LogRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LogRecord::Variable(r) => r.timestamp,
            LogRecord::Intervention(r) => r.timestamp,
            LogRecord::ArithmeticTrial(r) => r.timestamp,
            LogRecord::NBackTrial(r) => r.timestamp,
            LogRecord::StroopTrial(r) => r.timestamp,
        }
    }

    /// Record type discriminator as written to the log
    pub fn tag(&self) -> String {
        match self {
            LogRecord::Variable(r) => format!("variable: {}", r.name),
            LogRecord::Intervention(r) => format!("intervention: {}", r.name),
            LogRecord::ArithmeticTrial(_) => TestKind::Arithmetic.tag().to_string(),
            LogRecord::NBackTrial(_) => TestKind::NBack.tag().to_string(),
            LogRecord::StroopTrial(_) => TestKind::Stroop.tag().to_string(),
        }
    }

    pub fn test_kind(&self) -> Option<TestKind> {
        match self {
            LogRecord::ArithmeticTrial(_) => Some(TestKind::Arithmetic),
            LogRecord::NBackTrial(_) => Some(TestKind::NBack),
            LogRecord::StroopTrial(_) => Some(TestKind::Stroop),
            _ => None,
        }
    }

    /// Correctness and latency of a trial record
    pub fn outcome(&self) -> Option<(Correctness, f64)> {
        match self {
            LogRecord::ArithmeticTrial(r) => Some((r.correctness, r.latency_seconds)),
            LogRecord::NBackTrial(r) => Some((r.correctness, r.latency_seconds)),
            LogRecord::StroopTrial(r) => Some((r.correctness, r.latency_seconds)),
            _ => None,
        }
    }
}

/// A raw value in a per-day score bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Outcome(Correctness),
    Latency(f64),
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Outcome(c) => write!(f, "{}", c),
            Sample::Latency(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_boolean_families() {
        assert_eq!(Correctness::decode("true"), Correctness::Correct);
        assert_eq!(Correctness::decode("false"), Correctness::Incorrect);
        assert_eq!(Correctness::decode("y"), Correctness::Correct);
        assert_eq!(Correctness::decode("n"), Correctness::Incorrect);
        assert_eq!(Correctness::decode("yes"), Correctness::Correct);
        assert_eq!(Correctness::decode("no"), Correctness::Incorrect);
        assert_eq!(Correctness::decode("maybe"), Correctness::Invalid);
        assert_eq!(Correctness::decode(""), Correctness::Invalid);
    }

    #[test]
    fn test_correctness_token_roundtrip() {
        for c in [Correctness::Correct, Correctness::Incorrect, Correctness::Invalid] {
            assert_eq!(Correctness::decode(c.as_str()), c);
        }
    }

    #[test]
    fn test_operation_apply() {
        assert_eq!(Operation::Sub.apply(3, 8), Some(-5));
        assert_eq!(Operation::Div.apply(7, 2), Some(3));
        assert_eq!(Operation::Div.apply(-7, 2), Some(-3));
        assert_eq!(Operation::Div.apply(7, 0), None);
    }

    #[test]
    fn test_dose_parse() {
        assert_eq!(Dose::parse("none"), Dose::None);
        assert_eq!(Dose::parse("  "), Dose::None);
        assert_eq!(Dose::parse("200mg"), Dose::Amount("200mg".to_string()));
    }

    #[test]
    fn test_record_tags() {
        let record = LogRecord::Variable(VariableRecord {
            timestamp: Utc::now(),
            name: "energy level".to_string(),
            value: 3,
        });
        assert_eq!(record.tag(), "variable: energy level");
        assert_eq!(TestKind::from_tag("NBackTest"), Some(TestKind::NBack));
        assert_eq!(TestKind::from_tag("nback"), None);
    }
}
