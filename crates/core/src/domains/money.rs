use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, RngCore};
use serde_json::json;

use super::{DISTRACTOR_COUNT, integer_distractors};
use crate::generator::{GeneratorError, ProblemGenerator};
use crate::model::{AgeGroup, Answer, ComparisonRule, Difficulty, Domain, GeneratedProblem, SubType};

#[derive(Debug, Clone, Copy, Default)]
pub struct MoneyGenerator;

/// Coin values in cents available at each difficulty.
fn coin_set(difficulty: Difficulty) -> &'static [i64] {
    match difficulty {
        Difficulty::Beginner => &[1],
        Difficulty::Easy => &[1, 5],
        Difficulty::Medium => &[1, 5, 10],
        Difficulty::Challenging => &[1, 5, 10, 25],
        Difficulty::Expert => &[1, 5, 10, 25, 100],
    }
}

fn max_coins(difficulty: Difficulty) -> usize {
    3 + 2 * difficulty.rank()
}

fn dollars(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[allow(clippy::cast_precision_loss)]
fn decimal(cents: i64) -> Answer {
    Answer::Decimal(cents as f64 / 100.0)
}

fn random_coins(rng: &mut dyn RngCore, difficulty: Difficulty) -> Vec<i64> {
    let set = coin_set(difficulty);
    let count = rng.random_range(2..=max_coins(difficulty));
    let mut coins: Vec<i64> = (0..count)
        .map(|_| set.choose(rng).copied().unwrap_or(1))
        .collect();
    coins.sort_unstable_by(|a, b| b.cmp(a));
    coins
}

/// Wrong amounts `step` cents apart, so the one-cent tolerance never accepts them.
fn cent_distractors(rng: &mut dyn RngCore, cents: i64, step: i64) -> Vec<Answer> {
    let step = step.max(2);
    let lowest_offset = -((cents - 1) / step);
    integer_distractors(rng, 0, 3, lowest_offset)
        .into_iter()
        .filter_map(|a| match a {
            Answer::Integer(offset) => Some(decimal(cents + offset * step)),
            _ => None,
        })
        .collect()
}

/// Greedy split of `cents` into coins from `set`, largest first.
fn greedy_coins(mut cents: i64, set: &[i64]) -> Vec<i64> {
    let mut coins = Vec::new();
    for &coin in set.iter().rev() {
        while cents >= coin {
            coins.push(coin);
            cents -= coin;
        }
    }
    coins
}

impl MoneyGenerator {
    fn coin_counting(rng: &mut dyn RngCore, difficulty: Difficulty) -> GeneratedProblem {
        let coins = random_coins(rng, difficulty);
        let total: i64 = coins.iter().sum();
        let largest = coin_set(difficulty).last().copied().unwrap_or(1);
        GeneratedProblem {
            prompt: "How much money is this?".to_string(),
            display: json!({ "kind": "coins", "coins": coins }),
            correct_answer: decimal(total),
            distractors: cent_distractors(rng, total, largest),
            rule: ComparisonRule::CURRENCY,
        }
    }

    fn amount_comparison(rng: &mut dyn RngCore, difficulty: Difficulty) -> GeneratedProblem {
        let left = random_coins(rng, difficulty);
        let mut right = random_coins(rng, difficulty);
        let left_total: i64 = left.iter().sum();
        if right.iter().sum::<i64>() == left_total {
            right.push(1);
        }
        let right_total: i64 = right.iter().sum();
        let (answer, other) = if left_total > right_total {
            ("left", "right")
        } else {
            ("right", "left")
        };
        GeneratedProblem {
            prompt: "Which side has more money?".to_string(),
            display: json!({ "kind": "coin_compare", "left": left, "right": right }),
            correct_answer: Answer::text(answer),
            distractors: vec![Answer::text(other)],
            rule: ComparisonRule::CaseInsensitive,
        }
    }

    fn making_change(rng: &mut dyn RngCore, difficulty: Difficulty) -> GeneratedProblem {
        let max_dollars = match difficulty {
            Difficulty::Beginner | Difficulty::Easy | Difficulty::Medium => 1,
            Difficulty::Challenging => 5,
            Difficulty::Expert => 10,
        };
        let paid = 100 * rng.random_range(1..=max_dollars);
        // Whole-nickel prices below challenging.
        let step = if difficulty >= Difficulty::Challenging { 1 } else { 5 };
        let price = step * rng.random_range(1..paid / step);
        let change = paid - price;
        GeneratedProblem {
            prompt: format!(
                "Something costs {}. You pay with {}. How much change do you get?",
                dollars(price),
                dollars(paid)
            ),
            display: json!({ "kind": "making_change", "price_cents": price, "paid_cents": paid }),
            correct_answer: decimal(change),
            distractors: cent_distractors(rng, change, 5),
            rule: ComparisonRule::CURRENCY,
        }
    }

    fn coin_combination(rng: &mut dyn RngCore, difficulty: Difficulty) -> GeneratedProblem {
        let set = coin_set(difficulty);
        let target = rng.random_range(10..=100);

        let mut options = vec![greedy_coins(target, set)];
        let mut attempts = 0;
        while options.len() <= DISTRACTOR_COUNT && attempts < 32 {
            attempts += 1;
            let offset = rng.random_range(1..=10);
            let wrong = if rng.random_bool(0.5) || target - offset < 1 {
                target + offset
            } else {
                target - offset
            };
            let coins = greedy_coins(wrong, set);
            if !options.contains(&coins) {
                options.push(coins);
            }
        }
        let correct = options[0].clone();
        options.shuffle(rng);
        let index = options.iter().position(|o| *o == correct).unwrap_or(0);

        GeneratedProblem {
            prompt: format!("Which group of coins makes {}?", dollars(target)),
            display: json!({ "kind": "coin_options", "target_cents": target, "options": options }),
            correct_answer: Answer::Choice(index),
            distractors: (0..options.len())
                .filter(|i| *i != index)
                .map(Answer::Choice)
                .collect(),
            rule: ComparisonRule::ChoiceIndex,
        }
    }
}

impl ProblemGenerator for MoneyGenerator {
    fn domain(&self) -> Domain {
        Domain::Money
    }

    fn sub_types(&self, difficulty: Difficulty, age_group: AgeGroup) -> Vec<SubType> {
        let mut offered = vec![SubType::CoinCounting, SubType::AmountComparison];
        if difficulty >= Difficulty::Medium && age_group >= AgeGroup::Kindergarten {
            offered.push(SubType::MakingChange);
        }
        if difficulty >= Difficulty::Challenging && age_group >= AgeGroup::EarlyPrimary {
            offered.push(SubType::CoinCombination);
        }
        offered
    }

    fn generate(
        &self,
        difficulty: Difficulty,
        sub_type: SubType,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedProblem, GeneratorError> {
        match sub_type {
            SubType::CoinCounting => Ok(Self::coin_counting(rng, difficulty)),
            SubType::AmountComparison => Ok(Self::amount_comparison(rng, difficulty)),
            SubType::MakingChange => Ok(Self::making_change(rng, difficulty)),
            SubType::CoinCombination => Ok(Self::coin_combination(rng, difficulty)),
            other => Err(GeneratorError::UnsupportedSubType {
                domain: Domain::Money,
                sub_type: other,
            }),
        }
    }

    fn expected_answer_ms(&self, sub_type: SubType, difficulty: Difficulty) -> Option<u32> {
        let base = match sub_type {
            SubType::AmountComparison => 6_000,
            SubType::CoinCounting => 8_000,
            _ => 15_000,
        };
        Some(base + 2_000 * difficulty.rank() as u32)
    }
}
