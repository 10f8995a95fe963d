use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::ConfigError;
use crate::ladder::DifficultyLadder;
use crate::mastery::SkillMastery;
use crate::model::{AgeGroup, Attempt, Difficulty, Domain, SessionId, SubType};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Parameters for a single session, checked by [`SessionConfig::validate`] on `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_questions: u32,
    pub initial_difficulty: Difficulty,
    /// Restrict the session to one sub-type instead of weighted selection.
    pub focus_sub_type: Option<SubType>,
    /// Overrides the engine's default age group for this session.
    pub age_group: Option<AgeGroup>,
}

impl SessionConfig {
    #[must_use]
    pub fn new(max_questions: u32, initial_difficulty: Difficulty) -> Self {
        Self {
            max_questions,
            initial_difficulty,
            focus_sub_type: None,
            age_group: None,
        }
    }

    #[must_use]
    pub fn with_focus(mut self, sub_type: SubType) -> Self {
        self.focus_sub_type = Some(sub_type);
        self
    }

    #[must_use]
    pub fn with_age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = Some(age_group);
        self
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMaxQuestions` for a zero-length session and
    /// `ConfigError::DifficultyNotOnLadder` when the initial difficulty is not playable.
    pub fn validate(&self, ladder: &DifficultyLadder) -> Result<(), ConfigError> {
        if self.max_questions == 0 {
            return Err(ConfigError::InvalidMaxQuestions);
        }
        if !ladder.contains(self.initial_difficulty) {
            return Err(ConfigError::DifficultyNotOnLadder(self.initial_difficulty));
        }
        Ok(())
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Live state of one play-through.
///
/// Counters always satisfy `correct_count + incorrect_count == questions_asked`.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    max_questions: u32,
    age_group: AgeGroup,
    focus: Option<SubType>,
    current_difficulty: Difficulty,
    questions_asked: u32,
    correct_count: u32,
    incorrect_count: u32,
    current_streak: u32,
    longest_streak: u32,
    history: Vec<Attempt>,
}

impl Session {
    /// `config` must already be validated against the ladder in use.
    #[must_use]
    pub fn new(
        id: SessionId,
        config: &SessionConfig,
        default_age_group: AgeGroup,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            started_at,
            max_questions: config.max_questions,
            age_group: config.age_group.unwrap_or(default_age_group),
            focus: config.focus_sub_type,
            current_difficulty: config.initial_difficulty,
            questions_asked: 0,
            correct_count: 0,
            incorrect_count: 0,
            current_streak: 0,
            longest_streak: 0,
            history: Vec::new(),
        }
    }

    /// Append an attempt and update counters and streaks.
    pub fn record(&mut self, attempt: Attempt) {
        self.questions_asked = self.questions_asked.saturating_add(1);
        if attempt.correct {
            self.correct_count = self.correct_count.saturating_add(1);
            self.current_streak = self.current_streak.saturating_add(1);
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.incorrect_count = self.incorrect_count.saturating_add(1);
            self.current_streak = 0;
        }
        self.history.push(attempt);
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.current_difficulty = difficulty;
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    #[must_use]
    pub fn age_group(&self) -> AgeGroup {
        self.age_group
    }

    #[must_use]
    pub fn focus(&self) -> Option<SubType> {
        self.focus
    }

    #[must_use]
    pub fn current_difficulty(&self) -> Difficulty {
        self.current_difficulty
    }

    #[must_use]
    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    #[must_use]
    pub fn history(&self) -> &[Attempt] {
        &self.history
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.questions_asked >= self.max_questions
    }

    /// Correct answers over questions asked; 0 before the first answer.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct_count, self.questions_asked)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            asked: self.questions_asked,
            remaining: self.max_questions.saturating_sub(self.questions_asked),
            current_streak: self.current_streak,
            difficulty: self.current_difficulty,
            is_finished: self.is_finished(),
        }
    }
}

fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole)
    }
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub asked: u32,
    pub remaining: u32,
    pub current_streak: u32,
    pub difficulty: Difficulty,
    pub is_finished: bool,
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionResultError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed questions asked ({asked})")]
    CorrectExceedsAsked { asked: u32, correct: u32 },

    #[error("longest streak ({streak}) exceeds correct answers ({correct})")]
    StreakOverflow { streak: u32, correct: u32 },
}

/// Terminal summary of a finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    session_id: SessionId,
    domain: Domain,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    questions_asked: u32,
    correct_count: u32,
    incorrect_count: u32,
    longest_streak: u32,
    final_difficulty: Difficulty,
    mastery: Vec<SkillMastery>,
}

impl SessionResult {
    /// Snapshot a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError::InvalidTimeRange` if `completed_at` precedes the start.
    pub fn from_session(
        session: &Session,
        domain: Domain,
        completed_at: DateTime<Utc>,
        mastery: Vec<SkillMastery>,
    ) -> Result<Self, SessionResultError> {
        Self::from_persisted(
            session.id(),
            domain,
            session.started_at(),
            completed_at,
            session.questions_asked(),
            session.correct_count(),
            session.longest_streak(),
            session.current_difficulty(),
            mastery,
        )
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError` if the time range or counters are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        session_id: SessionId,
        domain: Domain,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        questions_asked: u32,
        correct_count: u32,
        longest_streak: u32,
        final_difficulty: Difficulty,
        mastery: Vec<SkillMastery>,
    ) -> Result<Self, SessionResultError> {
        if completed_at < started_at {
            return Err(SessionResultError::InvalidTimeRange);
        }
        if correct_count > questions_asked {
            return Err(SessionResultError::CorrectExceedsAsked {
                asked: questions_asked,
                correct: correct_count,
            });
        }
        if longest_streak > correct_count {
            return Err(SessionResultError::StreakOverflow {
                streak: longest_streak,
                correct: correct_count,
            });
        }

        Ok(Self {
            session_id,
            domain,
            started_at,
            completed_at,
            questions_asked,
            correct_count,
            incorrect_count: questions_asked - correct_count,
            longest_streak,
            final_difficulty,
            mastery,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        let millis = self
            .completed_at
            .signed_duration_since(self.started_at)
            .num_milliseconds();
        u64::try_from(millis).unwrap_or(0)
    }

    #[must_use]
    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct_count, self.questions_asked)
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    #[must_use]
    pub fn final_difficulty(&self) -> Difficulty {
        self.final_difficulty
    }

    #[must_use]
    pub fn mastery(&self) -> &[SkillMastery] {
        &self.mastery
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProblemId;
    use crate::time::fixed_now;

    fn attempt(correct: bool) -> Attempt {
        Attempt::new(
            ProblemId::new(1),
            SubType::Addition,
            Difficulty::Easy,
            correct,
            1_500,
            fixed_now(),
        )
    }

    fn session(max: u32) -> Session {
        let config = SessionConfig::new(max, Difficulty::Easy);
        Session::new(SessionId::random(), &config, AgeGroup::Kindergarten, fixed_now())
    }

    #[test]
    fn zero_questions_is_rejected() {
        let ladder = DifficultyLadder::full();
        let err = SessionConfig::new(0, Difficulty::Easy)
            .validate(&ladder)
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidMaxQuestions);
    }

    #[test]
    fn initial_difficulty_must_be_on_ladder() {
        let ladder = DifficultyLadder::new(vec![Difficulty::Easy, Difficulty::Medium]).unwrap();
        let err = SessionConfig::new(5, Difficulty::Expert)
            .validate(&ladder)
            .unwrap_err();
        assert_eq!(err, ConfigError::DifficultyNotOnLadder(Difficulty::Expert));
    }

    #[test]
    fn record_tracks_counters_and_streaks() {
        let mut s = session(10);
        for correct in [true, true, false, true, true, true, false] {
            s.record(attempt(correct));
            assert_eq!(s.correct_count() + s.incorrect_count(), s.questions_asked());
        }
        assert_eq!(s.questions_asked(), 7);
        assert_eq!(s.current_streak(), 0);
        assert_eq!(s.longest_streak(), 3);
        assert_eq!(s.history().len(), 7);
    }

    #[test]
    fn session_age_group_falls_back_to_default() {
        let s = session(3);
        assert_eq!(s.age_group(), AgeGroup::Kindergarten);

        let config = SessionConfig::new(3, Difficulty::Easy).with_age_group(AgeGroup::Preschool);
        let s = Session::new(SessionId::random(), &config, AgeGroup::Kindergarten, fixed_now());
        assert_eq!(s.age_group(), AgeGroup::Preschool);
    }

    #[test]
    fn result_snapshots_session() {
        let mut s = session(2);
        s.record(attempt(true));
        s.record(attempt(false));
        assert!(s.is_finished());

        let completed = fixed_now() + chrono::Duration::seconds(30);
        let result = SessionResult::from_session(&s, Domain::Arithmetic, completed, Vec::new())
            .unwrap();
        assert_eq!(result.questions_asked(), 2);
        assert_eq!(result.incorrect_count(), 1);
        assert!((result.accuracy() - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.elapsed_ms(), 30_000);
    }

    #[test]
    fn result_rejects_inconsistent_counts() {
        let err = SessionResult::from_persisted(
            SessionId::random(),
            Domain::Money,
            fixed_now(),
            fixed_now(),
            2,
            3,
            0,
            Difficulty::Easy,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SessionResultError::CorrectExceedsAsked {
                asked: 2,
                correct: 3
            }
        );
    }
}
