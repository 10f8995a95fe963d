use chrono::{DateTime, Utc};

use crate::model::{Difficulty, ProblemId, SubType};

/// One answered problem. Never modified once appended to a session's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub problem_id: ProblemId,
    pub sub_type: SubType,
    pub difficulty: Difficulty,
    pub correct: bool,
    pub time_taken_ms: u64,
    pub answered_at: DateTime<Utc>,
}

impl Attempt {
    #[must_use]
    pub fn new(
        problem_id: ProblemId,
        sub_type: SubType,
        difficulty: Difficulty,
        correct: bool,
        time_taken_ms: u64,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            problem_id,
            sub_type,
            difficulty,
            correct,
            time_taken_ms,
            answered_at,
        }
    }
}
