use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use serde_json::json;

use super::integer_distractors;
use crate::generator::{GeneratorError, ProblemGenerator};
use crate::model::{AgeGroup, Answer, ComparisonRule, Difficulty, Domain, GeneratedProblem, SubType};

/// Terms shown to the learner, including the blank.
const SEQUENCE_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceGenerator;

fn number_max(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Beginner => 10,
        Difficulty::Easy => 20,
        Difficulty::Medium => 50,
        Difficulty::Challenging => 100,
        Difficulty::Expert => 200,
    }
}

fn skip_steps(difficulty: Difficulty) -> &'static [i64] {
    match difficulty {
        Difficulty::Beginner | Difficulty::Easy => &[2],
        Difficulty::Medium => &[2, 5],
        Difficulty::Challenging => &[2, 5, 10],
        Difficulty::Expert => &[2, 3, 4, 5, 10],
    }
}

/// `SEQUENCE_LEN` terms from `start` by `step`, with the term at `blank` hidden.
fn sequence(start: i64, step: i64, blank: usize, prompt: &str) -> GeneratedProblem {
    let terms: Vec<i64> = (0..SEQUENCE_LEN as i64).map(|i| start + step * i).collect();
    let shown: Vec<Option<i64>> = terms
        .iter()
        .enumerate()
        .map(|(i, t)| (i != blank).then_some(*t))
        .collect();
    let rendered: Vec<String> = shown
        .iter()
        .map(|t| t.map_or_else(|| "__".to_string(), |v| v.to_string()))
        .collect();

    GeneratedProblem {
        prompt: format!("{prompt}: {}", rendered.join(", ")),
        display: json!({ "kind": "sequence", "terms": shown, "blank": blank, "step": step }),
        correct_answer: Answer::Integer(terms[blank]),
        distractors: Vec::new(),
        rule: ComparisonRule::Exact,
    }
}

impl ProblemGenerator for SequenceGenerator {
    fn domain(&self) -> Domain {
        Domain::Sequences
    }

    fn sub_types(&self, difficulty: Difficulty, age_group: AgeGroup) -> Vec<SubType> {
        let mut offered = vec![SubType::CountingOn];
        if difficulty >= Difficulty::Easy {
            offered.push(SubType::SkipCounting);
        }
        if difficulty >= Difficulty::Medium {
            offered.push(SubType::CountingBackwards);
        }
        if difficulty >= Difficulty::Challenging && age_group >= AgeGroup::Kindergarten {
            offered.push(SubType::MissingNumber);
        }
        offered
    }

    fn generate(
        &self,
        difficulty: Difficulty,
        sub_type: SubType,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedProblem, GeneratorError> {
        let max = number_max(difficulty);
        let last = SEQUENCE_LEN - 1;
        let span = |step: i64| step * (SEQUENCE_LEN as i64 - 1);

        let (mut problem, step) = match sub_type {
            SubType::CountingOn => {
                let start = rng.random_range(0..=max - span(1));
                (sequence(start, 1, last, "What comes next"), 1)
            }
            SubType::SkipCounting => {
                let step = *skip_steps(difficulty).choose(rng).unwrap_or(&2);
                // Skip counting starts on a multiple of the step.
                let start = step * rng.random_range(0..=(max - span(step)).max(0) / step);
                (sequence(start, step, last, "Count on"), step)
            }
            SubType::CountingBackwards => {
                let step = if difficulty == Difficulty::Expert { 2 } else { 1 };
                let start = rng.random_range(span(step)..=max);
                (sequence(start, -step, last, "Count back"), step)
            }
            SubType::MissingNumber => {
                let step = *skip_steps(difficulty).choose(rng).unwrap_or(&2);
                let start = rng.random_range(0..=(max - span(step)).max(0));
                let blank = rng.random_range(1..last);
                (sequence(start, step, blank, "Fill in the missing number"), step)
            }
            other => {
                return Err(GeneratorError::UnsupportedSubType {
                    domain: Domain::Sequences,
                    sub_type: other,
                });
            }
        };

        if let Answer::Integer(correct) = problem.correct_answer {
            problem.distractors = integer_distractors(rng, correct, step.max(2), 0);
        }
        Ok(problem)
    }

    fn expected_answer_ms(&self, sub_type: SubType, difficulty: Difficulty) -> Option<u32> {
        let base = match sub_type {
            SubType::CountingOn => 4_000,
            SubType::MissingNumber => 9_000,
            _ => 6_000,
        };
        Some(base + 1_000 * difficulty.rank() as u32)
    }
}
