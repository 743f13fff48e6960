//! Variable and intervention elicitation
//!
//! Before testing, the operator rates each configured variable and decides
//! for each intervention whether to take it, skip it or let the RNG decide.
//! The session waits before testing if any intervention that needs time to
//! act was applied.

use crate::config::{ArmAction, InterventionSpec, RandomArm, VariableSpec};
use crate::error::CogError;
use crate::operator::Operator;
use crate::recorder::RecordSink;
use crate::runner::Clock;
use crate::types::{Dose, InterventionRecord, LogRecord, VariableRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// Operator's decision for one intervention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Take,
    Skip,
    Randomize,
}

impl Choice {
    pub fn key(&self) -> char {
        match self {
            Choice::Take => 'y',
            Choice::Skip => 'n',
            Choice::Randomize => 'r',
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Choice::Take => "(y)es",
            Choice::Skip => "(n)o",
            Choice::Randomize => "(r)andomize",
        }
    }

    fn from_key(key: char, offered: &[Choice]) -> Option<Choice> {
        offered.iter().copied().find(|c| c.key() == key)
    }
}

/// Records produced by elicitation and whether testing must wait
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Elicitation {
    pub records: Vec<LogRecord>,
    pub should_wait: bool,
}

/// Ask the operator to rate every variable
pub fn elicit_variables<C: Clock>(
    variables: &[VariableSpec],
    operator: &mut dyn Operator,
    clock: &C,
    sink: &mut dyn RecordSink,
) -> Result<Vec<LogRecord>, CogError> {
    let mut records = Vec::with_capacity(variables.len());

    for variable in variables {
        let prompt = format!(
            "How's your {} today, on a scale of {}-{}?",
            variable.name, variable.min, variable.max
        );
        let value = operator.rate(&prompt, variable.min..=variable.max)?;

        let record = LogRecord::Variable(VariableRecord {
            timestamp: clock.now_utc(),
            name: variable.name.clone(),
            value,
        });
        sink.record(&record)?;
        records.push(record);
    }

    Ok(records)
}

/// Walks the configured interventions
pub struct InterventionElicitor<'a> {
    interventions: &'a [InterventionSpec],
    rng: StdRng,
}

impl<'a> InterventionElicitor<'a> {
    pub fn new(interventions: &'a [InterventionSpec]) -> Self {
        Self {
            interventions,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create an elicitor with a fixed seed (for testing)
    pub fn with_seed(interventions: &'a [InterventionSpec], seed: u64) -> Self {
        Self {
            interventions,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn elicit<C: Clock>(
        &mut self,
        operator: &mut dyn Operator,
        clock: &C,
        sink: &mut dyn RecordSink,
    ) -> Result<Elicitation, CogError> {
        if self.interventions.is_empty() {
            return Ok(Elicitation::default());
        }

        operator.announce("Let us pray to the RNG:")?;

        let interventions = self.interventions;
        let mut elicitation = Elicitation::default();
        for spec in interventions {
            let (dose, wait) = self.elicit_one(spec, operator)?;

            let record = LogRecord::Intervention(InterventionRecord {
                timestamp: clock.now_utc(),
                name: spec.name.clone(),
                dose,
            });
            sink.record(&record)?;
            elicitation.records.push(record);
            elicitation.should_wait = elicitation.should_wait || wait;
        }

        Ok(elicitation)
    }

    fn elicit_one(
        &mut self,
        spec: &InterventionSpec,
        operator: &mut dyn Operator,
    ) -> Result<(Dose, bool), CogError> {
        let mut offered = vec![Choice::Take, Choice::Skip];
        if spec.arms.is_some() {
            offered.push(Choice::Randomize);
        }
        let keys: Vec<char> = offered.iter().map(Choice::key).collect();
        let labels: Vec<&str> = offered.iter().map(Choice::label).collect();

        let prompt = format!(" -> {}  {}", spec.name, labels.join(" "));
        let key = operator.choose(&prompt, &keys)?;

        match Choice::from_key(key, &offered) {
            Some(Choice::Take) => {
                let dose = operator.read_line("enter dose")?;
                Ok((Dose::parse(&dose), false))
            }
            Some(Choice::Randomize) => {
                let arm = spec
                    .arms
                    .as_deref()
                    .and_then(|arms| arms.choose(&mut self.rng))
                    .cloned()
                    .ok_or_else(|| {
                        CogError::Config(format!("intervention '{}' has no arms", spec.name))
                    })?;
                debug!(intervention = %spec.name, dose = %arm.dose, "arm drawn");

                operator.announce(&announcement(spec, &arm))?;
                // blinded arms must not be told apart by the wait
                let wait = spec.wait && (arm.action == ArmAction::Apply || spec.blinded);
                Ok((Dose::Amount(arm.dose), wait))
            }
            Some(Choice::Skip) | None => Ok((Dose::None, false)),
        }
    }
}

fn announcement(spec: &InterventionSpec, arm: &RandomArm) -> String {
    if spec.blinded {
        let label = arm.label.as_deref().unwrap_or("the prepared dose");
        return format!("Take {} now.", label);
    }
    match arm.action {
        ArmAction::Apply if arm.dose == "pre" => "Apply to brain now.".to_string(),
        ArmAction::Apply => format!("RNG prescribes: {}", arm.dose),
        ArmAction::Skip => "Skip it.".to_string(),
    }
}
