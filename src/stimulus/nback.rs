//! Single n-back generator
//!
//! Shows one digit per trial. The operator answers `y` when the digit equals
//! the one shown n trials earlier and `n` otherwise. Random digits alone match
//! about one time in ten, so a configurable share of trials deliberately
//! repeats the digit from n steps back.

use super::{Prompt, Response, Stimulus};
use crate::types::{NBackContext, TrialRecord};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;

#[derive(Debug)]
pub struct NBackGenerator {
    n: usize,
    match_probability: f64,
    history: Vec<u8>,
    rng: StdRng,
}

impl NBackGenerator {
    pub fn new(n: usize, match_probability: f64, rng: StdRng) -> Self {
        Self {
            n,
            match_probability,
            history: Vec::new(),
            rng,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Digits shown so far, oldest first
    pub fn history(&self) -> &[u8] {
        &self.history
    }

    /// The digit n steps back from the next stimulus, once n digits precede it
    fn reference(&self) -> Option<u8> {
        if self.n > 0 && self.history.len() >= self.n {
            Some(self.history[self.history.len() - self.n])
        } else {
            None
        }
    }

    pub fn next_prompt(&mut self) -> Prompt {
        let reference = self.reference();

        let digit = match reference {
            Some(previous) if self.rng.gen::<f64>() < self.match_probability => previous,
            _ => self.rng.gen_range(0..=9),
        };
        let is_match = reference == Some(digit);

        self.history.push(digit);

        Prompt {
            stimulus: Stimulus::Digit {
                digit,
                position: self.history.len(),
            },
            expected: if is_match { 'y' } else { 'n' },
        }
    }

    pub fn score(
        &self,
        prompt: &Prompt,
        response: Response,
        timestamp: DateTime<Utc>,
        latency_seconds: f64,
    ) -> TrialRecord<NBackContext> {
        let context = match prompt.stimulus {
            Stimulus::Digit { digit, position } => Some(NBackContext {
                n: self.n,
                stimulus: digit,
                position,
                response: response.as_text(),
                is_match: prompt.expected == 'y',
            }),
            _ => None,
        };

        TrialRecord {
            timestamp,
            correctness: response.judge(prompt.expected),
            latency_seconds,
            context,
        }
    }
}
