use rand::{Rng, RngCore};
use serde_json::json;

use super::integer_distractors;
use crate::generator::{GeneratorError, ProblemGenerator};
use crate::model::{AgeGroup, Answer, ComparisonRule, Difficulty, Domain, GeneratedProblem, SubType};

#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticGenerator;

fn operand_max(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Beginner => 5,
        Difficulty::Easy => 10,
        Difficulty::Medium => 20,
        Difficulty::Challenging => 50,
        Difficulty::Expert => 100,
    }
}

fn times_table_max(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Beginner | Difficulty::Easy => 2,
        Difficulty::Medium => 5,
        Difficulty::Challenging => 10,
        Difficulty::Expert => 12,
    }
}

fn equation(left: i64, operator: &str, right: i64, result: Option<i64>) -> GeneratedProblem {
    let (prompt, answer) = match result {
        Some(total) => (format!("{left} {operator} ? = {total}"), right),
        None => (
            format!("{left} {operator} {right} = ?"),
            match operator {
                "+" => left + right,
                "-" => left - right,
                _ => left * right,
            },
        ),
    };
    GeneratedProblem {
        prompt,
        display: json!({
            "kind": "equation",
            "left": left,
            "operator": operator,
            "right": if result.is_some() { None } else { Some(right) },
            "result": result,
        }),
        correct_answer: Answer::Integer(answer),
        distractors: Vec::new(),
        rule: ComparisonRule::Exact,
    }
}

fn comparison(a: i64, b: i64) -> GeneratedProblem {
    let word = match a.cmp(&b) {
        std::cmp::Ordering::Greater => "greater",
        std::cmp::Ordering::Less => "less",
        std::cmp::Ordering::Equal => "equal",
    };
    GeneratedProblem {
        prompt: format!("Is {a} greater than, less than, or equal to {b}?"),
        display: json!({ "kind": "compare", "left": a, "right": b }),
        correct_answer: Answer::text(word),
        distractors: ["greater", "less", "equal"]
            .into_iter()
            .filter(|w| *w != word)
            .map(Answer::text)
            .collect(),
        rule: ComparisonRule::CaseInsensitive,
    }
}

impl ProblemGenerator for ArithmeticGenerator {
    fn domain(&self) -> Domain {
        Domain::Arithmetic
    }

    fn sub_types(&self, difficulty: Difficulty, age_group: AgeGroup) -> Vec<SubType> {
        let mut offered = vec![SubType::Addition];
        if difficulty >= Difficulty::Easy {
            offered.push(SubType::Subtraction);
        }
        if difficulty >= Difficulty::Challenging && age_group >= AgeGroup::EarlyPrimary {
            offered.push(SubType::Multiplication);
        }
        if difficulty >= Difficulty::Medium && age_group >= AgeGroup::Kindergarten {
            offered.push(SubType::MissingAddend);
        }
        offered.push(SubType::NumberComparison);
        offered
    }

    fn generate(
        &self,
        difficulty: Difficulty,
        sub_type: SubType,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedProblem, GeneratorError> {
        let max = operand_max(difficulty);

        let mut problem = match sub_type {
            SubType::Addition => {
                let a = rng.random_range(0..=max);
                let b = rng.random_range(0..=max);
                equation(a, "+", b, None)
            }
            SubType::Subtraction => {
                let a = rng.random_range(1..=max);
                let b = rng.random_range(0..=a);
                equation(a, "-", b, None)
            }
            SubType::Multiplication => {
                let table = times_table_max(difficulty);
                let a = rng.random_range(1..=table);
                let b = rng.random_range(1..=10);
                equation(a, "×", b, None)
            }
            SubType::MissingAddend => {
                let total = rng.random_range(2..=max);
                let known = rng.random_range(0..=total);
                equation(known, "+", total - known, Some(total))
            }
            SubType::NumberComparison => {
                let a = rng.random_range(0..=max);
                // Equal pairs are rare by chance, so force them now and then.
                let b = if rng.random_bool(0.2) { a } else { rng.random_range(0..=max) };
                return Ok(comparison(a, b));
            }
            other => {
                return Err(GeneratorError::UnsupportedSubType {
                    domain: Domain::Arithmetic,
                    sub_type: other,
                });
            }
        };

        if let Answer::Integer(correct) = problem.correct_answer {
            let spread = (max / 5).clamp(2, 10);
            problem.distractors = integer_distractors(rng, correct, spread, 0);
        }
        Ok(problem)
    }

    fn expected_answer_ms(&self, sub_type: SubType, difficulty: Difficulty) -> Option<u32> {
        let base = match sub_type {
            SubType::NumberComparison => 4_000,
            SubType::Addition | SubType::Subtraction => 6_000,
            _ => 8_000,
        };
        Some(base + 1_500 * difficulty.rank() as u32)
    }
}
