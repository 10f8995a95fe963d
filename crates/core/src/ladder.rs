use crate::error::ConfigError;
use crate::model::{Attempt, Difficulty};

/// Number of trailing attempts considered when adjusting difficulty.
pub const WINDOW_SIZE: usize = 5;
/// The ladder does not move until the window holds this many attempts.
pub const MIN_WINDOW_ATTEMPTS: usize = 3;
/// Correct answers in a row needed, on top of window accuracy, to advance.
pub const ADVANCE_STREAK: u32 = 3;

/// Outcome of evaluating the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderMove {
    Advance,
    Retreat,
    Hold,
}

/// Ordered, non-empty subset of [`Difficulty`] a domain plays on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyLadder {
    levels: Vec<Difficulty>,
}

impl DifficultyLadder {
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyLadder` or `ConfigError::UnorderedLadder` when the
    /// levels are empty or not strictly ascending.
    pub fn new(levels: Vec<Difficulty>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::EmptyLadder);
        }
        if let Some(pair) = levels.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::UnorderedLadder {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(Self { levels })
    }

    /// Every difficulty, beginner to expert.
    #[must_use]
    pub fn full() -> Self {
        Self {
            levels: Difficulty::ALL.to_vec(),
        }
    }

    #[must_use]
    pub fn levels(&self) -> &[Difficulty] {
        &self.levels
    }

    #[must_use]
    pub fn lowest(&self) -> Difficulty {
        self.levels[0]
    }

    #[must_use]
    pub fn highest(&self) -> Difficulty {
        self.levels[self.levels.len() - 1]
    }

    #[must_use]
    pub fn contains(&self, difficulty: Difficulty) -> bool {
        self.levels.contains(&difficulty)
    }

    #[must_use]
    pub fn position(&self, difficulty: Difficulty) -> Option<usize> {
        self.levels.iter().position(|d| *d == difficulty)
    }

    /// Next level up, or `current` at the top or when `current` is off the ladder.
    #[must_use]
    pub fn step_up(&self, current: Difficulty) -> Difficulty {
        self.position(current)
            .and_then(|i| self.levels.get(i + 1))
            .copied()
            .unwrap_or(current)
    }

    /// Next level down, or `current` at the bottom or when `current` is off the ladder.
    #[must_use]
    pub fn step_down(&self, current: Difficulty) -> Difficulty {
        self.position(current)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.levels.get(i))
            .copied()
            .unwrap_or(current)
    }

    /// Decide the move for the trailing window of `history`.
    #[must_use]
    pub fn evaluate(history: &[Attempt], current_streak: u32) -> LadderMove {
        let window = &history[history.len().saturating_sub(WINDOW_SIZE)..];
        if window.len() < MIN_WINDOW_ATTEMPTS {
            return LadderMove::Hold;
        }

        let total = window.len();
        let correct = window.iter().filter(|a| a.correct).count();

        if correct * 5 >= total * 4 && current_streak >= ADVANCE_STREAK {
            LadderMove::Advance
        } else if correct * 5 <= total * 2 {
            LadderMove::Retreat
        } else {
            LadderMove::Hold
        }
    }

    /// Difficulty after the latest answer. Moves at most one level.
    #[must_use]
    pub fn adjust(&self, history: &[Attempt], current_streak: u32, current: Difficulty) -> Difficulty {
        match Self::evaluate(history, current_streak) {
            LadderMove::Advance => self.step_up(current),
            LadderMove::Retreat => self.step_down(current),
            LadderMove::Hold => current,
        }
    }
}

/// Fraction of correct answers in the trailing window, `None` while it is too short.
#[must_use]
pub fn window_accuracy(history: &[Attempt]) -> Option<f64> {
    let window = &history[history.len().saturating_sub(WINDOW_SIZE)..];
    if window.len() < MIN_WINDOW_ATTEMPTS {
        return None;
    }
    let correct = window.iter().filter(|a| a.correct).count();
    #[allow(clippy::cast_precision_loss)]
    Some(correct as f64 / window.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProblemId, SubType};
    use crate::time::fixed_now;

    fn history(pattern: &[bool]) -> Vec<Attempt> {
        pattern
            .iter()
            .enumerate()
            .map(|(i, correct)| {
                Attempt::new(
                    ProblemId::new(i as u64 + 1),
                    SubType::CountingOn,
                    Difficulty::Medium,
                    *correct,
                    2_000,
                    fixed_now(),
                )
            })
            .collect()
    }

    #[test]
    fn rejects_empty_and_unordered_ladders() {
        assert_eq!(DifficultyLadder::new(vec![]), Err(ConfigError::EmptyLadder));
        assert_eq!(
            DifficultyLadder::new(vec![Difficulty::Medium, Difficulty::Easy]),
            Err(ConfigError::UnorderedLadder {
                previous: Difficulty::Medium,
                next: Difficulty::Easy
            })
        );
        assert!(DifficultyLadder::new(vec![Difficulty::Easy, Difficulty::Easy]).is_err());
    }

    #[test]
    fn short_window_holds() {
        let ladder = DifficultyLadder::full();
        let h = history(&[false, false]);
        assert_eq!(ladder.adjust(&h, 0, Difficulty::Medium), Difficulty::Medium);
        assert_eq!(window_accuracy(&h), None);
    }

    #[test]
    fn strong_window_with_streak_advances() {
        let ladder = DifficultyLadder::full();
        let h = history(&[true, true, true]);
        assert_eq!(ladder.adjust(&h, 3, Difficulty::Easy), Difficulty::Medium);
    }

    #[test]
    fn strong_window_without_streak_holds() {
        let ladder = DifficultyLadder::full();
        // 4/5 correct but the last answer broke the streak.
        let h = history(&[true, true, true, true, false]);
        assert_eq!(ladder.adjust(&h, 0, Difficulty::Easy), Difficulty::Easy);
    }

    #[test]
    fn weak_window_retreats() {
        let ladder = DifficultyLadder::full();
        // Trailing five: false, false, true, false, false.
        let h = history(&[true, true, true, false, false, true, false, false]);
        assert_eq!(ladder.adjust(&h, 0, Difficulty::Medium), Difficulty::Easy);
    }

    #[test]
    fn forty_percent_retreats() {
        let ladder = DifficultyLadder::full();
        let h = history(&[true, true, false, false, false]);
        assert_eq!(window_accuracy(&h), Some(0.4));
        assert_eq!(ladder.adjust(&h, 0, Difficulty::Challenging), Difficulty::Medium);
    }

    #[test]
    fn bounds_are_no_ops() {
        let ladder = DifficultyLadder::new(vec![Difficulty::Easy, Difficulty::Challenging]).unwrap();
        let good = history(&[true, true, true, true, true]);
        let bad = history(&[false, false, false]);
        assert_eq!(ladder.adjust(&good, 5, Difficulty::Challenging), Difficulty::Challenging);
        assert_eq!(ladder.adjust(&bad, 0, Difficulty::Easy), Difficulty::Easy);
        assert_eq!(ladder.adjust(&good, 5, Difficulty::Easy), Difficulty::Challenging);
    }

    #[test]
    fn off_ladder_difficulty_is_left_alone() {
        let ladder = DifficultyLadder::new(vec![Difficulty::Easy, Difficulty::Medium]).unwrap();
        let good = history(&[true, true, true]);
        assert_eq!(ladder.adjust(&good, 3, Difficulty::Expert), Difficulty::Expert);
    }
}
