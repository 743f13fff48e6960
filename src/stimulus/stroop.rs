//! Stroop test generator
//!
//! Shows a color word printed in a different ink color. The operator types the
//! initial of the ink color and has to suppress reading the word.

use super::{Prompt, Response, Stimulus};
use crate::types::{Color, StroopContext, TrialRecord};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;

#[derive(Debug)]
pub struct StroopGenerator {
    palette: Vec<Color>,
    last: Option<(Color, Color)>,
    rng: StdRng,
}

impl StroopGenerator {
    pub fn new(palette: Vec<Color>, rng: StdRng) -> Self {
        Self {
            palette,
            last: None,
            rng,
        }
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    /// Draw an incongruent word/ink pair that differs from the previous pair.
    ///
    /// Terminates only if the palette holds at least two distinct colors.
    pub fn next_prompt(&mut self) -> Prompt {
        let len = self.palette.len();
        loop {
            let word = self.palette[self.rng.gen_range(0..len)];
            let ink = self.palette[self.rng.gen_range(0..len)];
            if word == ink || self.last == Some((word, ink)) {
                continue;
            }

            self.last = Some((word, ink));
            return Prompt {
                stimulus: Stimulus::ColorWord { word, ink },
                expected: ink.initial(),
            };
        }
    }

    pub fn score(
        &self,
        prompt: &Prompt,
        response: Response,
        timestamp: DateTime<Utc>,
        latency_seconds: f64,
    ) -> TrialRecord<StroopContext> {
        let context = match prompt.stimulus {
            Stimulus::ColorWord { word, ink } => Some(StroopContext {
                palette: self.palette.clone(),
                word,
                ink,
                response: response.as_text(),
                expected: prompt.expected.to_string(),
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
