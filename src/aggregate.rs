//! Per-day reductions
//!
//! Score buckets are reduced by the suffix of their metric name:
//! `_accuracy` and `_rate` become the share of `Correct` among judged
//! samples, `_time` becomes the mean latency. A bucket with nothing to
//! reduce leaves its cell empty.

use crate::buckets::{DayBuckets, DayMap};
use crate::error::CogError;
use crate::types::{Correctness, Sample};
use tracing::debug;

/// How a score metric is reduced to one number per day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Correct / (correct + incorrect); invalid samples are ignored
    Ratio,
    /// Arithmetic mean of latencies
    Mean,
}

impl Reduction {
    pub fn for_metric(metric: &str) -> Option<Self> {
        if metric.ends_with("_accuracy") || metric.ends_with("_rate") {
            Some(Reduction::Ratio)
        } else if metric.ends_with("_time") {
            Some(Reduction::Mean)
        } else {
            None
        }
    }
}

/// Share of correct outcomes, ignoring invalid ones
pub fn accuracy(outcomes: &[Correctness]) -> Option<f64> {
    let (correct, judged) = outcomes
        .iter()
        .filter_map(Correctness::as_bool)
        .fold((0usize, 0usize), |(c, n), v| (c + usize::from(v), n + 1));
    if judged == 0 {
        None
    } else {
        Some(correct as f64 / judged as f64)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Reduce one bucket of samples
pub fn reduce(metric: &str, samples: &[Sample]) -> Result<Option<f64>, CogError> {
    let value = match Reduction::for_metric(metric) {
        None => return Ok(None),
        Some(Reduction::Ratio) => {
            let outcomes: Vec<Correctness> = samples
                .iter()
                .filter_map(|s| match s {
                    Sample::Outcome(c) => Some(*c),
                    Sample::Latency(_) => None,
                })
                .collect();
            accuracy(&outcomes)
        }
        Some(Reduction::Mean) => {
            let latencies: Vec<f64> = samples
                .iter()
                .filter_map(|s| match s {
                    Sample::Latency(v) => Some(*v),
                    Sample::Outcome(_) => None,
                })
                .collect();
            mean(&latencies)
        }
    };

    value
        .map(Some)
        .ok_or_else(|| CogError::NoValidSamples(metric.to_string()))
}

/// Reduce every score bucket; empty buckets become missing cells
pub fn aggregate_scores(scores: &DayBuckets<Sample>) -> DayMap<f64> {
    scores.map_cells(|day, metric, samples| match reduce(metric, samples) {
        Ok(value) => value,
        Err(e) => {
            debug!(%day, error = %e, "leaving cell empty");
            None
        }
    })
}

/// Last value of each bucket
pub fn latest<T: Clone>(buckets: &DayBuckets<T>) -> DayMap<T> {
    buckets.map_cells(|_, _, values| values.last().cloned())
}

/// Sum of each bucket
pub fn totals(buckets: &DayBuckets<f64>) -> DayMap<f64> {
    buckets.map_cells(|_, _, values| Some(values.iter().sum()))
}

/// Raw samples of each bucket as `;`-joined tokens
pub fn raw_tokens(scores: &DayBuckets<Sample>) -> DayMap<String> {
    scores.map_cells(|_, _, samples| {
        Some(
            samples
                .iter()
                .map(Sample::to_string)
                .collect::<Vec<_>>()
                .join(";"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_accuracy_excludes_invalid() {
        let outcomes = [
            Correctness::Correct,
            Correctness::Incorrect,
            Correctness::Invalid,
            Correctness::Correct,
        ];
        let acc = accuracy(&outcomes).unwrap();
        assert!((acc - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_of_only_invalid_is_missing() {
        assert_eq!(accuracy(&[Correctness::Invalid]), None);
        assert!(matches!(
            reduce("nback_accuracy", &[Sample::Outcome(Correctness::Invalid)]),
            Err(CogError::NoValidSamples(_))
        ));
    }

    #[test]
    fn test_reduction_by_suffix() {
        assert_eq!(Reduction::for_metric("stroop_accuracy"), Some(Reduction::Ratio));
        assert_eq!(
            Reduction::for_metric("stroop_interference_rate"),
            Some(Reduction::Ratio)
        );
        assert_eq!(Reduction::for_metric("nback_time"), Some(Reduction::Mean));
        assert_eq!(Reduction::for_metric("mood"), None);
    }

    #[test]
    fn test_aggregate_scores() {
        let mut scores = DayBuckets::new();
        scores.push(day(1), "nback_time", Sample::Latency(1.0));
        scores.push(day(1), "nback_time", Sample::Latency(2.0));
        scores.push(day(1), "nback_accuracy", Sample::Outcome(Correctness::Correct));
        scores.push(day(2), "nback_accuracy", Sample::Outcome(Correctness::Invalid));

        let agg = aggregate_scores(&scores);
        assert_eq!(agg.get(day(1), "nback_time"), Some(&1.5));
        assert_eq!(agg.get(day(1), "nback_accuracy"), Some(&1.0));
        assert_eq!(agg.get(day(2), "nback_accuracy"), None);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_latest_totals_and_raw() {
        let mut readings = DayBuckets::new();
        readings.push(day(1), "mood", 2i64);
        readings.push(day(1), "mood", 4i64);
        assert_eq!(latest(&readings).get(day(1), "mood"), Some(&4));

        let mut doses = DayBuckets::new();
        doses.push(day(1), "caffeine", 100.0);
        doses.push(day(1), "caffeine", 50.0);
        assert_eq!(totals(&doses).get(day(1), "caffeine"), Some(&150.0));

        let mut scores = DayBuckets::new();
        scores.push(day(1), "stroop_accuracy", Sample::Outcome(Correctness::Correct));
        scores.push(day(1), "stroop_accuracy", Sample::Outcome(Correctness::Invalid));
        assert_eq!(
            raw_tokens(&scores).get(day(1), "stroop_accuracy").map(String::as_str),
            Some("true;invalid")
        );
    }
}
