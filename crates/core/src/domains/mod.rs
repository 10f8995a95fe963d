//! Problem generators for the four content domains.
//!
//! Each module exposes one zero-sized generator implementing
//! [`ProblemGenerator`](crate::generator::ProblemGenerator). Gating of sub-types by
//! difficulty and age group lives next to the generator that owns them.

pub mod arithmetic;
pub mod clock;
pub mod money;
pub mod sequences;

use rand::{Rng, RngCore};
use std::collections::BTreeSet;

use crate::generator::ProblemGenerator;
use crate::model::{Answer, Domain};

pub use arithmetic::ArithmeticGenerator;
pub use clock::ClockGenerator;
pub use money::MoneyGenerator;
pub use sequences::SequenceGenerator;

/// Number of wrong options offered next to the correct answer.
pub const DISTRACTOR_COUNT: usize = 3;

/// The built-in generator for `domain`.
#[must_use]
pub fn generator_for(domain: Domain) -> Box<dyn ProblemGenerator> {
    match domain {
        Domain::Arithmetic => Box::new(ArithmeticGenerator),
        Domain::Sequences => Box::new(SequenceGenerator),
        Domain::Clock => Box::new(ClockGenerator),
        Domain::Money => Box::new(MoneyGenerator),
    }
}

/// Up to [`DISTRACTOR_COUNT`] distinct integers near `correct`, never below `floor`.
pub(crate) fn integer_distractors(
    rng: &mut dyn RngCore,
    correct: i64,
    spread: i64,
    floor: i64,
) -> Vec<Answer> {
    let spread = spread.max(1);
    let mut picked = BTreeSet::new();

    for _ in 0..DISTRACTOR_COUNT * 8 {
        if picked.len() == DISTRACTOR_COUNT {
            break;
        }
        let offset = rng.random_range(1..=spread);
        let candidate = if rng.random_bool(0.5) {
            correct + offset
        } else {
            correct - offset
        };
        if candidate >= floor && candidate != correct {
            picked.insert(candidate);
        }
    }

    // Small ranges near the floor can starve the random walk.
    let mut next = correct + 1;
    while picked.len() < DISTRACTOR_COUNT {
        picked.insert(next);
        next += 1;
    }

    picked.into_iter().map(Answer::Integer).collect()
}
