//! Arithmetic test generator
//!
//! Draws `lhs op rhs` problems; the operator answers with the last digit of
//! the result.

use super::{Prompt, Response, Stimulus};
use crate::types::{ArithmeticContext, Operation, TrialRecord};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

/// Generator for arithmetic problems
#[derive(Debug)]
pub struct ArithmeticGenerator {
    operators: Vec<Operation>,
    operands: RangeInclusive<i64>,
    last: Option<(i64, Operation, i64)>,
    rng: StdRng,
}

impl ArithmeticGenerator {
    pub fn new(operators: Vec<Operation>, operands: RangeInclusive<i64>, rng: StdRng) -> Self {
        Self {
            operators,
            operands,
            last: None,
            rng,
        }
    }

    pub fn operators(&self) -> &[Operation] {
        &self.operators
    }

    /// Draw a problem that differs from the previous one.
    ///
    /// Terminates only if the configured pool has more than one valid problem.
    pub fn next_prompt(&mut self) -> Prompt {
        loop {
            let lhs = self.rng.gen_range(self.operands.clone());
            let rhs = self.rng.gen_range(self.operands.clone());
            let Some(&op) = self.operators.choose(&mut self.rng) else {
                continue;
            };
            let Some(result) = op.apply(lhs, rhs) else {
                continue;
            };
            if self.last == Some((lhs, op, rhs)) {
                continue;
            }

            self.last = Some((lhs, op, rhs));
            return Prompt {
                stimulus: Stimulus::Problem { lhs, op, rhs },
                expected: last_digit(result),
            };
        }
    }

    pub fn score(
        &self,
        prompt: &Prompt,
        response: Response,
        timestamp: DateTime<Utc>,
        latency_seconds: f64,
    ) -> TrialRecord<ArithmeticContext> {
        let context = match prompt.stimulus {
            Stimulus::Problem { lhs, op, rhs } => Some(ArithmeticContext {
                operators: self.operators.clone(),
                lhs,
                op,
                rhs,
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

/// Last decimal digit of the absolute value
pub fn last_digit(value: i64) -> char {
    let digit = (value.unsigned_abs() % 10) as u32;
    char::from_digit(digit, 10).unwrap_or('0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generator(operators: Vec<Operation>, operands: RangeInclusive<i64>) -> ArithmeticGenerator {
        ArithmeticGenerator::new(operators, operands, StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_last_digit() {
        assert_eq!(last_digit(7), '7');
        assert_eq!(last_digit(56), '6');
        assert_eq!(last_digit(0), '0');
        assert_eq!(last_digit(-3), '3');
        assert_eq!(last_digit(-72), '2');
    }

    #[test]
    fn test_expected_answer_matches_problem() {
        let mut gen = generator(vec![Operation::Add, Operation::Sub, Operation::Mul], 1..=9);
        for _ in 0..200 {
            let prompt = gen.next_prompt();
            match prompt.stimulus {
                Stimulus::Problem { lhs, op, rhs } => {
                    assert!((1..=9).contains(&lhs));
                    assert!((1..=9).contains(&rhs));
                    assert_eq!(prompt.expected, last_digit(op.apply(lhs, rhs).unwrap()));
                }
                other => panic!("unexpected stimulus {:?}", other),
            }
        }
    }

    #[test]
    fn test_no_consecutive_repeats_in_small_pool() {
        // 2 operands x 2 operands x 1 operator = 4 problems
        let mut gen = generator(vec![Operation::Add], 1..=2);
        let mut previous = gen.next_prompt();
        for _ in 0..500 {
            let current = gen.next_prompt();
            assert_ne!(current.stimulus, previous.stimulus);
            previous = current;
        }
    }

    #[test]
    fn test_division_skips_zero_divisor() {
        let mut gen = generator(vec![Operation::Div], 0..=3);
        for _ in 0..200 {
            match gen.next_prompt().stimulus {
                Stimulus::Problem { rhs, .. } => assert_ne!(rhs, 0),
                other => panic!("unexpected stimulus {:?}", other),
            }
        }
    }

    #[test]
    fn test_score_records_context() {
        let gen = generator(vec![Operation::Sub], 1..=9);
        let prompt = Prompt {
            stimulus: Stimulus::Problem {
                lhs: 2,
                op: Operation::Sub,
                rhs: 9,
            },
            expected: '7',
        };

        let record = gen.score(&prompt, Response::Key('7'), Utc::now(), 1.25);
        assert_eq!(record.correctness, crate::types::Correctness::Correct);
        let context = record.context.unwrap();
        assert_eq!(context.lhs, 2);
        assert_eq!(context.response, "7");
        assert_eq!(context.expected, "7");
        assert_eq!(context.operators, vec![Operation::Sub]);
    }
}
