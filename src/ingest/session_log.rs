//! Session log row decoding
//!
//! Rows are `timestamp,tag,...`. Trial rows written before context fields
//! were logged only carry `correct,latency`; they still decode, with no
//! context attached.

use crate::recorder::SESSION_NAME_FORMAT;
use crate::types::{
    ArithmeticContext, Color, Correctness, Dose, InterventionRecord, LogRecord, NBackContext,
    Operation, StroopContext, TestKind, TrialRecord, VariableRecord,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::Path;
use thiserror::Error;

const VARIABLE_PREFIX: &str = "variable:";
const INTERVENTION_PREFIX: &str = "intervention:";

/// A row that has a known tag but cannot be decoded
#[derive(Debug, Error, PartialEq)]
#[error("{0}")]
pub struct MalformedRow(String);

/// Session start time encoded in a log file name, if the name carries one
pub fn session_start_from_name(name: &str) -> Option<NaiveDateTime> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    NaiveDateTime::parse_from_str(stem, SESSION_NAME_FORMAT).ok()
}

/// Decode one log row.
///
/// `Ok(None)` means the tag is not one this crate knows about.
pub fn parse_record<S: AsRef<str>>(fields: &[S]) -> Result<Option<LogRecord>, MalformedRow> {
    if fields.len() < 2 {
        return Err(MalformedRow(format!("expected at least 2 fields, got {}", fields.len())));
    }

    let tag = fields[1].as_ref().trim();
    let data: Vec<&str> = fields[2..].iter().map(|f| f.as_ref()).collect();

    let kind = if tag.starts_with(VARIABLE_PREFIX) || tag.starts_with(INTERVENTION_PREFIX) {
        None
    } else {
        match TestKind::from_tag(tag) {
            Some(kind) => Some(kind),
            None => return Ok(None),
        }
    };

    let timestamp = parse_timestamp(fields[0].as_ref())
        .ok_or_else(|| MalformedRow(format!("bad timestamp '{}'", fields[0].as_ref())))?;

    let record = match kind {
        Some(kind) => parse_trial(kind, timestamp, &data)?,
        None => {
            if let Some(name) = tag.strip_prefix(VARIABLE_PREFIX) {
                let raw = field(&data, 0, "value")?;
                let value = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| MalformedRow(format!("bad variable value '{}'", raw)))?;
                LogRecord::Variable(VariableRecord {
                    timestamp,
                    name: name.trim().to_string(),
                    value,
                })
            } else {
                let name = tag.trim_start_matches(INTERVENTION_PREFIX);
                LogRecord::Intervention(InterventionRecord {
                    timestamp,
                    name: name.trim().to_string(),
                    dose: Dose::parse(data.first().copied().unwrap_or("")),
                })
            }
        }
    };

    Ok(Some(record))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let secs = match raw.parse::<i64>() {
        Ok(secs) => secs,
        Err(_) => {
            let secs = raw.parse::<f64>().ok()?;
            if !secs.is_finite() {
                return None;
            }
            secs.trunc() as i64
        }
    };
    Utc.timestamp_opt(secs, 0).single()
}

fn field<'a>(data: &[&'a str], idx: usize, name: &str) -> Result<&'a str, MalformedRow> {
    data.get(idx)
        .copied()
        .ok_or_else(|| MalformedRow(format!("missing {} field", name)))
}

fn parse_trial(
    kind: TestKind,
    timestamp: DateTime<Utc>,
    data: &[&str],
) -> Result<LogRecord, MalformedRow> {
    let correctness = Correctness::decode(field(data, 0, "correct")?);
    let raw_latency = field(data, 1, "latency")?;
    let latency_seconds = raw_latency
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MalformedRow(format!("bad latency '{}'", raw_latency)))?;

    let extra = &data[2..];
    let record = match kind {
        TestKind::Arithmetic => LogRecord::ArithmeticTrial(TrialRecord {
            timestamp,
            correctness,
            latency_seconds,
            context: arithmetic_context(extra),
        }),
        TestKind::NBack => LogRecord::NBackTrial(TrialRecord {
            timestamp,
            correctness,
            latency_seconds,
            context: nback_context(extra),
        }),
        TestKind::Stroop => LogRecord::StroopTrial(TrialRecord {
            timestamp,
            correctness,
            latency_seconds,
            context: stroop_context(extra),
        }),
    };
    Ok(record)
}

/// Items of a logged list, either space-joined (`red green`) or in the
/// bracketed form of older logs (`[:red, :green]`)
fn list_items(raw: &str) -> impl Iterator<Item = &str> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(symbol_name)
        .filter(|item| !item.is_empty())
}

fn symbol_name(raw: &str) -> &str {
    raw.trim().trim_start_matches(':')
}

fn arithmetic_context(extra: &[&str]) -> Option<ArithmeticContext> {
    let [operators, lhs, op, rhs, response, expected] = extra else {
        return None;
    };
    Some(ArithmeticContext {
        operators: list_items(operators)
            .filter_map(Operation::from_symbol)
            .collect(),
        lhs: lhs.trim().parse().ok()?,
        op: Operation::from_symbol(symbol_name(op))?,
        rhs: rhs.trim().parse().ok()?,
        response: response.to_string(),
        expected: expected.to_string(),
    })
}

fn nback_context(extra: &[&str]) -> Option<NBackContext> {
    let [n, stimulus, position, response, expected] = extra else {
        return None;
    };
    let is_match = match Correctness::decode(expected) {
        Correctness::Correct => true,
        Correctness::Incorrect => false,
        Correctness::Invalid => return None,
    };
    Some(NBackContext {
        n: n.trim().parse().ok()?,
        stimulus: stimulus.trim().parse().ok()?,
        position: position.trim().parse().ok()?,
        response: response.to_string(),
        is_match,
    })
}

fn stroop_context(extra: &[&str]) -> Option<StroopContext> {
    let [palette, word, ink, response, expected] = extra else {
        return None;
    };
    Some(StroopContext {
        palette: list_items(palette).filter_map(Color::from_name).collect(),
        word: Color::from_name(symbol_name(word))?,
        ink: Color::from_name(symbol_name(ink))?,
        response: response.to_string(),
        expected: expected.to_string(),
    })
}
