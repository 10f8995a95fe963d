use crate::model::{Difficulty, Domain, SubType};

/// Everything a composer may use to pick a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackContext {
    pub correct: bool,
    pub streak: u32,
    pub sub_type: SubType,
    pub difficulty: Difficulty,
    pub domain: Domain,
    pub time_taken_ms: u64,
    pub expected_ms: Option<u32>,
}

impl FeedbackContext {
    /// Answered within the advisory time, when one is known.
    #[must_use]
    pub fn was_quick(&self) -> bool {
        self.expected_ms
            .is_some_and(|expected| self.time_taken_ms <= u64::from(expected))
    }
}

/// Turns an outcome into a short phrase for the learner.
pub trait FeedbackComposer: Send + Sync {
    fn compose(&self, context: &FeedbackContext) -> String;
}

/// Minimal built-in phrases. Real games plug in their own corpus.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFeedback;

impl FeedbackComposer for PlainFeedback {
    fn compose(&self, context: &FeedbackContext) -> String {
        match (context.correct, context.streak) {
            (false, _) => "Nice try! Let's look at that one again.".to_string(),
            (true, streak) if streak >= 5 => format!("Amazing, {streak} in a row!"),
            (true, streak) if streak >= 3 => "You're on a roll!".to_string(),
            (true, _) if context.was_quick() => "Quick thinking!".to_string(),
            (true, _) => "Well done!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(correct: bool, streak: u32, time_taken_ms: u64) -> FeedbackContext {
        FeedbackContext {
            correct,
            streak,
            sub_type: SubType::CoinCounting,
            difficulty: Difficulty::Easy,
            domain: Domain::Money,
            time_taken_ms,
            expected_ms: Some(8_000),
        }
    }

    #[test]
    fn phrases_follow_outcome() {
        let composer = PlainFeedback;
        assert!(composer.compose(&context(false, 0, 1_000)).starts_with("Nice try"));
        assert_eq!(composer.compose(&context(true, 6, 1_000)), "Amazing, 6 in a row!");
        assert_eq!(composer.compose(&context(true, 3, 1_000)), "You're on a roll!");
        assert_eq!(composer.compose(&context(true, 1, 1_000)), "Quick thinking!");
        assert_eq!(composer.compose(&context(true, 1, 20_000)), "Well done!");
    }

    #[test]
    fn unknown_expected_time_is_never_quick() {
        let mut ctx = context(true, 1, 10);
        ctx.expected_ms = None;
        assert!(!ctx.was_quick());
    }
}
