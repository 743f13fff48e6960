//! Live session orchestration
//!
//! A session runs: variable ratings → interventions → optional wait →
//! timed tests → optional tracker update. Every record is handed to the
//! sink the moment it exists.

use crate::config::Config;
use crate::elicitor::{elicit_variables, InterventionElicitor};
use crate::error::CogError;
use crate::notify::{AttentionSignal, ProgressTracker};
use crate::operator::Operator;
use crate::recorder::RecordSink;
use crate::runner::{Clock, TestOutcome, TrialRunner};
use crate::stimulus::TrialGenerator;
use crate::types::TestKind;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Blocks for the intervention wait period
pub trait Sleeper {
    fn sleep(&mut self, period: Duration);
}

/// Sleeps the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, period: Duration) {
        std::thread::sleep(period);
    }
}

/// Collaborators used around the tests
pub struct SessionHooks<'a> {
    pub sleeper: &'a mut dyn Sleeper,
    pub signal: &'a mut dyn AttentionSignal,
    pub tracker: Option<&'a dyn ProgressTracker>,
}

/// Trials answered in one test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub kind: TestKind,
    pub trials: usize,
}

/// What a finished session did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub variables: usize,
    pub interventions: usize,
    pub waited: bool,
    pub tests: Vec<TestSummary>,
    pub skipped: Vec<TestKind>,
    pub tracker_updated: bool,
}

impl SessionSummary {
    /// Records handed to the sink
    pub fn records(&self) -> usize {
        self.variables + self.interventions + self.tests.iter().map(|t| t.trials).sum::<usize>()
    }
}

/// Run one session with OS randomness
pub fn run_session<C: Clock>(
    config: &Config,
    clock: &C,
    operator: &mut dyn Operator,
    sink: &mut dyn RecordSink,
    hooks: SessionHooks<'_>,
) -> Result<SessionSummary, CogError> {
    Session::new(config, clock).run(operator, sink, hooks)
}

/// A configured session bound to a clock
pub struct Session<'a, C: Clock> {
    config: &'a Config,
    clock: &'a C,
    seed: Option<u64>,
}

impl<'a, C: Clock> Session<'a, C> {
    pub fn new(config: &'a Config, clock: &'a C) -> Self {
        Self {
            config,
            clock,
            seed: None,
        }
    }

    /// Use deterministic randomness (for testing)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn run(
        &self,
        operator: &mut dyn Operator,
        sink: &mut dyn RecordSink,
        hooks: SessionHooks<'_>,
    ) -> Result<SessionSummary, CogError> {
        let session = &self.config.session;
        let mut summary = SessionSummary::default();

        let variables = elicit_variables(&session.variables, operator, self.clock, sink)?;
        summary.variables = variables.len();

        let mut elicitor = match self.seed {
            Some(seed) => InterventionElicitor::with_seed(&session.interventions, seed),
            None => InterventionElicitor::new(&session.interventions),
        };
        let elicitation = elicitor.elicit(operator, self.clock, sink)?;
        summary.interventions = elicitation.records.len();

        if elicitation.should_wait {
            let period = Duration::from_secs(session.wait_period_secs);
            operator.announce(&format!(
                "You should wait for {}. Do stuff, I'll remind you.",
                describe_period(period)
            ))?;
            info!(seconds = period.as_secs(), "waiting for interventions");
            hooks.sleeper.sleep(period);
            hooks.signal.signal("Science time!")?;
            summary.waited = true;
        }

        let runner = TrialRunner::new(self.clock, Duration::from_secs(session.test_duration_secs));
        for (i, spec) in session.tests.iter().enumerate() {
            let mut generator = match self.seed {
                Some(seed) => TrialGenerator::with_seed(spec, seed.wrapping_add(i as u64 + 1)),
                None => TrialGenerator::from_spec(spec),
            };
            match runner.run(&mut generator, operator, sink)? {
                TestOutcome::Skipped => summary.skipped.push(generator.kind()),
                TestOutcome::Completed(trials) => summary.tests.push(TestSummary {
                    kind: generator.kind(),
                    trials: trials.len(),
                }),
            }
        }

        if let Some(tracker) = hooks.tracker {
            summary.tracker_updated = self.update_tracker(tracker, operator)?;
        }

        operator.announce("Done.")?;
        Ok(summary)
    }

    fn update_tracker(
        &self,
        tracker: &dyn ProgressTracker,
        operator: &mut dyn Operator,
    ) -> Result<bool, CogError> {
        let config = &self.config.tracker;
        if !config.enabled || !operator.confirm("Send to Beeminder?")? {
            return Ok(false);
        }

        match tracker.send(&config.goal, config.amount, &config.comment) {
            Ok(()) => {
                operator.announce("Bee buzzed.")?;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "tracker update failed");
                operator.announce(&format!("Tracker update failed: {}", e))?;
                Ok(false)
            }
        }
    }
}

fn describe_period(period: Duration) -> String {
    let secs = period.as_secs();
    if secs % 60 == 0 {
        let minutes = secs / 60;
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        format!("{} seconds", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InterventionSpec, RandomArm, TestSpec, VariableSpec};
    use crate::operator::testing::{Answer, ManualClock, ScriptedOperator};
    use crate::types::{Color, LogRecord};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSleeper(Vec<Duration>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, period: Duration) {
            self.0.push(period);
        }
    }

    #[derive(Default)]
    struct RecordingSignal(Vec<String>);

    impl AttentionSignal for RecordingSignal {
        fn signal(&mut self, message: &str) -> Result<(), CogError> {
            self.0.push(message.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingTracker {
        sent: RefCell<Vec<(String, f64)>>,
        fail: bool,
    }

    impl ProgressTracker for RecordingTracker {
        fn send(&self, goal: &str, amount: f64, _comment: &str) -> Result<(), CogError> {
            if self.fail {
                return Err(CogError::Tracker("offline".to_string()));
            }
            self.sent.borrow_mut().push((goal.to_string(), amount));
            Ok(())
        }
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.session.variables = vec![VariableSpec::likert("energy level")];
        config.session.interventions = vec![InterventionSpec {
            name: "caffeine".to_string(),
            arms: Some(vec![RandomArm::pre()]),
            wait: true,
            blinded: false,
        }];
        config.session.tests = vec![
            TestSpec::NBack {
                n: 2,
                match_probability: 0.5,
            },
            TestSpec::Stroop {
                palette: vec![Color::Red, Color::Green, Color::Blue],
            },
        ];
        config.session.test_duration_secs = 2;
        config
    }

    #[test]
    fn test_full_session_flow() {
        let config = small_config();
        let clock = ManualClock::new();
        let mut operator = ScriptedOperator::timed(clock.clone(), Duration::from_secs(1))
            .with_answers(vec![
                Answer::Rating(3),
                Answer::Choice('r'),
                Answer::Confirm(true),
            ]);
        let mut sink: Vec<LogRecord> = Vec::new();
        let mut sleeper = RecordingSleeper::default();
        let mut signal = RecordingSignal::default();
        let tracker = RecordingTracker::default();

        let summary = Session::new(&config, &clock)
            .with_seed(5)
            .run(
                &mut operator,
                &mut sink,
                SessionHooks {
                    sleeper: &mut sleeper,
                    signal: &mut signal,
                    tracker: Some(&tracker),
                },
            )
            .unwrap();

        assert_eq!(summary.variables, 1);
        assert_eq!(summary.interventions, 1);
        assert!(summary.waited);
        assert_eq!(sleeper.0, vec![Duration::from_secs(300)]);
        assert_eq!(signal.0, vec!["Science time!"]);
        assert_eq!(
            summary.tests,
            vec![
                TestSummary {
                    kind: TestKind::NBack,
                    trials: 3
                },
                TestSummary {
                    kind: TestKind::Stroop,
                    trials: 3
                },
            ]
        );
        assert!(summary.tracker_updated);
        assert_eq!(tracker.sent.borrow().as_slice(), &[("cogtest".to_string(), 1.0)]);

        // 1 variable + 1 intervention + 6 trials, in order
        assert_eq!(sink.len(), 8);
        assert_eq!(summary.records(), 8);
        assert!(matches!(sink[0], LogRecord::Variable(_)));
        assert!(matches!(sink[1], LogRecord::Intervention(_)));
        assert!(matches!(sink[2], LogRecord::NBackTrial(_)));
        assert!(matches!(sink[7], LogRecord::StroopTrial(_)));
        assert!(operator
            .messages
            .iter()
            .any(|m| m == "You should wait for 5 minutes. Do stuff, I'll remind you."));
    }

    #[test]
    fn test_skipped_test_and_failed_tracker() {
        let mut config = small_config();
        config.session.interventions = vec![InterventionSpec::plain("DXM")];
        let clock = ManualClock::new();
        let mut operator = ScriptedOperator::timed(clock.clone(), Duration::from_secs(1))
            .with_answers(vec![
                Answer::Rating(5),
                Answer::Choice('n'),
                Answer::Confirm(true),
            ])
            .with_starts(vec![false, true]);
        let mut sink: Vec<LogRecord> = Vec::new();
        let mut sleeper = RecordingSleeper::default();
        let mut signal = RecordingSignal::default();
        let tracker = RecordingTracker {
            fail: true,
            ..Default::default()
        };

        let summary = Session::new(&config, &clock)
            .with_seed(1)
            .run(
                &mut operator,
                &mut sink,
                SessionHooks {
                    sleeper: &mut sleeper,
                    signal: &mut signal,
                    tracker: Some(&tracker),
                },
            )
            .unwrap();

        assert!(!summary.waited);
        assert!(sleeper.0.is_empty());
        assert_eq!(summary.skipped, vec![TestKind::NBack]);
        assert_eq!(summary.tests.len(), 1);
        assert!(!summary.tracker_updated);
        assert!(operator
            .messages
            .iter()
            .any(|m| m.starts_with("Tracker update failed")));
    }

    #[test]
    fn test_describe_period() {
        assert_eq!(describe_period(Duration::from_secs(300)), "5 minutes");
        assert_eq!(describe_period(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_period(Duration::from_secs(90)), "90 seconds");
    }
}
