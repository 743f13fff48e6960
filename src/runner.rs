//! Timed test runner
//!
//! Drives one test for a wall-clock duration. Elapsed time is checked after
//! each trial, so a test runs for at least its duration and the last trial may
//! overshoot by one response time.

use crate::error::CogError;
use crate::operator::Operator;
use crate::recorder::RecordSink;
use crate::stimulus::TrialGenerator;
use crate::types::LogRecord;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::info;

/// Source of monotonic and wall-clock time
pub trait Clock {
    /// Monotonic time since the clock was created
    fn elapsed(&self) -> Duration;

    /// Current wall-clock time
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of running one test
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// The operator declined the test before the first trial
    Skipped,
    /// Trials in the order they were answered
    Completed(Vec<LogRecord>),
}

impl TestOutcome {
    pub fn trials(&self) -> &[LogRecord] {
        match self {
            TestOutcome::Skipped => &[],
            TestOutcome::Completed(records) => records,
        }
    }
}

/// Runs tests against a clock for a fixed duration
pub struct TrialRunner<'a, C: Clock> {
    clock: &'a C,
    duration: Duration,
}

impl<'a, C: Clock> TrialRunner<'a, C> {
    pub fn new(clock: &'a C, duration: Duration) -> Self {
        Self { clock, duration }
    }

    /// Run one test, sending every trial to `sink` as soon as it is scored
    pub fn run(
        &self,
        generator: &mut TrialGenerator,
        operator: &mut dyn Operator,
        sink: &mut dyn RecordSink,
    ) -> Result<TestOutcome, CogError> {
        let description = generator.description();
        if !operator.confirm_start(&description, self.duration)? {
            info!(test = generator.kind().tag(), "test skipped");
            return Ok(TestOutcome::Skipped);
        }

        let started = self.clock.elapsed();
        let mut trials = Vec::new();

        loop {
            let prompt = generator.next_stimulus();

            let shown = self.clock.elapsed();
            let response = operator.present(&prompt.stimulus)?;
            let latency = self.clock.elapsed().saturating_sub(shown);

            let record = generator.score_response(
                &prompt,
                response,
                self.clock.now_utc(),
                latency.as_secs_f64(),
            );
            sink.record(&record)?;
            trials.push(record);

            if self.clock.elapsed().saturating_sub(started) > self.duration {
                break;
            }
        }

        info!(
            test = generator.kind().tag(),
            trials = trials.len(),
            "test finished"
        );
        Ok(TestOutcome::Completed(trials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestSpec;
    use crate::operator::testing::{ManualClock, ScriptedOperator};
    use crate::stimulus::Response;
    use crate::types::{Color, Correctness};

    fn stroop_spec() -> TestSpec {
        TestSpec::Stroop {
            palette: vec![Color::Red, Color::Green, Color::Blue],
        }
    }

    #[test]
    fn test_runs_at_least_duration() {
        let clock = ManualClock::new();
        let mut operator = ScriptedOperator::timed(clock.clone(), Duration::from_secs(1));
        let mut generator = TrialGenerator::with_seed(&stroop_spec(), 1);
        let mut sink: Vec<LogRecord> = Vec::new();

        let runner = TrialRunner::new(&clock, Duration::from_secs(2));
        let outcome = runner.run(&mut generator, &mut operator, &mut sink).unwrap();

        // elapsed 1s and 2s keep going, 3s overshoots and stops
        assert_eq!(outcome.trials().len(), 3);
        assert_eq!(sink.len(), 3);
        assert_eq!(operator.shown.len(), 3);
        for record in outcome.trials() {
            assert_eq!(record.outcome().unwrap().1, 1.0);
        }
    }

    #[test]
    fn test_zero_duration_runs_one_trial() {
        let clock = ManualClock::new();
        let mut operator = ScriptedOperator::timed(clock.clone(), Duration::from_millis(400));
        let mut generator = TrialGenerator::with_seed(&stroop_spec(), 2);
        let mut sink: Vec<LogRecord> = Vec::new();

        let runner = TrialRunner::new(&clock, Duration::ZERO);
        let outcome = runner.run(&mut generator, &mut operator, &mut sink).unwrap();
        assert_eq!(outcome.trials().len(), 1);
    }

    #[test]
    fn test_abort_before_start_records_nothing() {
        let clock = ManualClock::new();
        let mut operator = ScriptedOperator::timed(clock.clone(), Duration::from_secs(1))
            .with_starts(vec![false]);
        let mut generator = TrialGenerator::with_seed(&stroop_spec(), 3);
        let mut sink: Vec<LogRecord> = Vec::new();

        let runner = TrialRunner::new(&clock, Duration::from_secs(60));
        let outcome = runner.run(&mut generator, &mut operator, &mut sink).unwrap();

        assert_eq!(outcome, TestOutcome::Skipped);
        assert!(sink.is_empty());
        assert!(operator.shown.is_empty());
    }

    #[test]
    fn test_scores_scripted_keys() {
        let clock = ManualClock::new();
        let spec = TestSpec::NBack {
            n: 2,
            match_probability: 1.0,
        };
        // first two trials can never match, the third is forced to
        let mut operator = ScriptedOperator::timed(clock.clone(), Duration::from_secs(1))
            .with_keys(vec![
                Response::Key('n'),
                Response::Unreadable,
                Response::Key('y'),
            ]);
        let mut generator = TrialGenerator::with_seed(&spec, 4);
        let mut sink: Vec<LogRecord> = Vec::new();

        let runner = TrialRunner::new(&clock, Duration::from_secs(2));
        runner.run(&mut generator, &mut operator, &mut sink).unwrap();

        let verdicts: Vec<Correctness> = sink.iter().map(|r| r.outcome().unwrap().0).collect();
        assert_eq!(
            verdicts,
            vec![
                Correctness::Correct,
                Correctness::Invalid,
                Correctness::Correct
            ]
        );
    }
}
