use rand::Rng;
use thiserror::Error;

use crate::mastery::SkillMastery;

/// Floor applied to every weight so mastered skills still come up.
pub const MIN_WEIGHT: f64 = 0.1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("no candidate sub-types to select from")]
    NoCandidates,
}

/// `max(0.1, 1 - success_rate)`. A skill with no record weighs 1.
#[must_use]
pub fn selection_weight(mastery: Option<&SkillMastery>) -> f64 {
    let rate = mastery.map_or(0.0, SkillMastery::success_rate);
    (1.0 - rate).max(MIN_WEIGHT)
}

/// Weighted random choice biased toward weaker skills.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSelector;

impl WeightedSelector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pick one candidate with probability proportional to its weight.
    ///
    /// Uses a single draw from `rng`, so the result is reproducible for a seeded source.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::NoCandidates` when `candidates` is empty.
    pub fn select<'m, T, R, F>(&self, candidates: &[T], lookup: F, rng: &mut R) -> Result<T, SelectionError>
    where
        T: Copy,
        R: Rng + ?Sized,
        F: Fn(T) -> Option<&'m SkillMastery>,
    {
        let (&last, _) = candidates.split_last().ok_or(SelectionError::NoCandidates)?;
        if candidates.len() == 1 {
            return Ok(last);
        }

        let weights: Vec<f64> = candidates
            .iter()
            .map(|c| selection_weight(lookup(*c)))
            .collect();
        let total: f64 = weights.iter().sum();

        let mut r = rng.random_range(0.0..total);
        for (candidate, weight) in candidates.iter().zip(&weights) {
            r -= weight;
            if r <= 0.0 {
                return Ok(*candidate);
            }
        }
        // Rounding can leave a sliver of `r` after the last weight.
        Ok(last)
    }
}
