use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::error::ConfigError;
use quiz_core::feedback::{FeedbackComposer, FeedbackContext};
use quiz_core::generator::{GeneratorError, ProblemGenerator};
use quiz_core::ladder::DifficultyLadder;
use quiz_core::mastery::{MasteryTracker, SkillMastery};
use quiz_core::model::{
    AgeGroup, Answer, Attempt, Difficulty, EngineSettings, Problem, ProblemId, Session,
    SessionConfig, SessionId, SessionProgress, SessionResult, SkillKey, SubType,
};
use quiz_core::selector::WeightedSelector;

use super::events::{EventHub, SessionEvent};
use crate::error::EngineError;

/// Where the engine is in a session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingAnswer,
    AnswerProcessed,
    Complete,
}

/// Result of a single submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub problem_id: ProblemId,
    pub correct: bool,
    pub correct_answer: Answer,
    pub new_difficulty: Difficulty,
    pub current_streak: u32,
    pub mastery: SkillMastery,
    pub promoted: bool,
    pub session_complete: bool,
    pub feedback: Option<String>,
}

/// What follows an answered problem.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    Problem(Problem),
    Complete(SessionResult),
}

/// Drives one learner through sessions in a single domain.
///
/// The engine owns its randomness, clock and mastery records. Domains plug in through
/// `G`; everything else (selection, difficulty, mastery) is shared.
pub struct AdaptiveSessionEngine<G> {
    generator: G,
    settings: EngineSettings,
    clock: Clock,
    rng: Box<dyn RngCore + Send>,
    selector: WeightedSelector,
    mastery: MasteryTracker,
    feedback: Option<Arc<dyn FeedbackComposer>>,
    events: EventHub,
    state: SessionState,
    session: Option<Session>,
    pending: Option<Problem>,
    result: Option<SessionResult>,
    next_problem_id: u64,
}

/// Every ladder level must offer at least one sub-type, all from the generator's domain.
fn validate_catalogue<G: ProblemGenerator + ?Sized>(
    generator: &G,
    ladder: &DifficultyLadder,
    age_group: AgeGroup,
) -> Result<(), ConfigError> {
    let domain = generator.domain();
    for &difficulty in ladder.levels() {
        let offered = generator.sub_types(difficulty, age_group);
        if offered.is_empty() {
            return Err(ConfigError::EmptyCatalogue {
                domain,
                difficulty,
                age_group,
            });
        }
        if let Some(&sub_type) = offered.iter().find(|s| s.domain() != domain) {
            return Err(ConfigError::ForeignSubType { sub_type, domain });
        }
    }
    Ok(())
}

impl<G: ProblemGenerator> AdaptiveSessionEngine<G> {
    /// Build an engine, checking the generator's catalogue against the ladder.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any ladder level offers no sub-types for the default
    /// age group, or offers sub-types from another domain.
    pub fn new(generator: G, settings: EngineSettings) -> Result<Self, ConfigError> {
        validate_catalogue(&generator, settings.ladder(), settings.age_group())?;
        let mastery = MasteryTracker::new(settings.promotion());
        Ok(Self {
            generator,
            settings,
            clock: Clock::default(),
            rng: Box::new(StdRng::from_os_rng()),
            selector: WeightedSelector::new(),
            mastery,
            feedback: None,
            events: EventHub::default(),
            state: SessionState::Idle,
            session: None,
            pending: None,
            result: None,
            next_problem_id: 0,
        })
    }

    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = Box::new(rng);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the tracker with previously persisted records.
    #[must_use]
    pub fn with_mastery(mut self, records: HashMap<SkillKey, SkillMastery>) -> Self {
        self.mastery = MasteryTracker::from_records(records, self.settings.promotion());
        self
    }

    #[must_use]
    pub fn with_feedback<F: FeedbackComposer + 'static>(mut self, composer: F) -> Self {
        self.feedback = Some(Arc::new(composer));
        self
    }

    /// Register a callback for every subsequent [`SessionEvent`].
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(Box::new(callback));
    }

    //
    // ─── OPERATIONS ────────────────────────────────────────────────────────────
    //

    /// Start a new session and issue its first problem.
    ///
    /// Any session in progress is replaced. If the configuration is rejected or the
    /// first problem cannot be built, the previous session is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` for an invalid configuration, or a selection or
    /// generator error if the first problem cannot be built.
    pub fn start(&mut self, config: SessionConfig) -> Result<Problem, EngineError> {
        let ladder = self.settings.ladder();
        config.validate(ladder)?;
        let age_group = config.age_group.unwrap_or(self.settings.age_group());
        validate_catalogue(&self.generator, ladder, age_group)?;

        let domain = self.generator.domain();
        if let Some(focus) = config.focus_sub_type {
            if focus.domain() != domain {
                return Err(ConfigError::ForeignSubType {
                    sub_type: focus,
                    domain,
                }
                .into());
            }
            let offered = ladder
                .levels()
                .iter()
                .any(|d| self.generator.sub_types(*d, age_group).contains(&focus));
            if !offered {
                return Err(ConfigError::FocusNotOffered(focus).into());
            }
        }

        let mut id_bytes = [0_u8; 16];
        self.rng.fill_bytes(&mut id_bytes);
        let session = Session::new(
            SessionId::from_random_bytes(id_bytes),
            &config,
            self.settings.age_group(),
            self.clock.now(),
        );
        let session_id = session.id();

        let previous = (
            self.state,
            self.session.replace(session),
            self.pending.take(),
            self.result.take(),
        );
        let problem = match self.build_problem() {
            Ok(problem) => problem,
            Err(err) => {
                (self.state, self.session, self.pending, self.result) = previous;
                return Err(err);
            }
        };

        info!(
            %session_id,
            %domain,
            difficulty = %config.initial_difficulty,
            max_questions = config.max_questions,
            "session started"
        );
        self.events.emit(&SessionEvent::Started {
            session_id,
            domain,
            difficulty: config.initial_difficulty,
            max_questions: config.max_questions,
        });
        Ok(self.commit_problem(problem))
    }

    /// Grade an answer for the pending problem and adapt difficulty and mastery.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotStarted` without a session, and
    /// `EngineError::UnknownProblem` if `problem_id` is not the pending problem. Neither
    /// changes any state.
    pub fn submit_answer(
        &mut self,
        problem_id: ProblemId,
        answer: &Answer,
        time_taken_ms: u64,
    ) -> Result<Outcome, EngineError> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::NotStarted);
        };
        let Some(problem) = self.pending.take_if(|p| p.id == problem_id) else {
            warn!(
                %problem_id,
                pending = ?self.pending.as_ref().map(|p| p.id),
                "answer submitted for a problem that is not pending"
            );
            return Err(EngineError::UnknownProblem(problem_id));
        };

        let correct = problem.is_correct(answer);
        session.record(Attempt::new(
            problem.id,
            problem.sub_type,
            problem.difficulty,
            correct,
            time_taken_ms,
            self.clock.now(),
        ));

        let update = self.mastery.update(&problem.sub_type.skill_key(), correct);
        if update.promoted {
            debug!(
                skill = %update.mastery.skill_key(),
                level = update.mastery.level(),
                "skill promoted"
            );
            self.events.emit(&SessionEvent::SkillPromoted {
                skill_key: update.mastery.skill_key().clone(),
                level: update.mastery.level(),
            });
        }

        let before = session.current_difficulty();
        let after = self
            .settings
            .ladder()
            .adjust(session.history(), session.current_streak(), before);
        if after != before {
            session.set_difficulty(after);
            debug!(from = %before, to = %after, "difficulty changed");
            self.events
                .emit(&SessionEvent::DifficultyChanged { from: before, to: after });
        }

        let streak = session.current_streak();
        let finished = session.is_finished();
        self.events.emit(&SessionEvent::AnswerEvaluated {
            problem_id,
            correct,
            streak,
        });

        let feedback = self.feedback.as_ref().map(|composer| {
            composer.compose(&FeedbackContext {
                correct,
                streak,
                sub_type: problem.sub_type,
                difficulty: problem.difficulty,
                domain: problem.domain,
                time_taken_ms,
                expected_ms: problem.expected_answer_ms,
            })
        });

        if finished {
            self.complete()?;
        } else {
            self.state = SessionState::AnswerProcessed;
        }

        Ok(Outcome {
            problem_id,
            correct,
            correct_answer: problem.correct_answer,
            new_difficulty: after,
            current_streak: streak,
            mastery: update.mastery,
            promoted: update.promoted,
            session_complete: finished,
            feedback,
        })
    }

    /// The next problem, or the session result once every question has been asked.
    ///
    /// While a problem awaits its answer the same problem is returned again.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotStarted` without a session, `EngineError::Selection`
    /// when no sub-type is eligible, or a generator error.
    pub fn next_problem(&mut self) -> Result<NextStep, EngineError> {
        match self.state {
            SessionState::Idle => Err(EngineError::NotStarted),
            SessionState::AwaitingAnswer => self
                .pending
                .clone()
                .map(NextStep::Problem)
                .ok_or(EngineError::NotStarted),
            SessionState::AnswerProcessed => {
                let problem = self.build_problem()?;
                Ok(NextStep::Problem(self.commit_problem(problem)))
            }
            SessionState::Complete => self
                .result
                .clone()
                .map(NextStep::Complete)
                .ok_or(EngineError::NotStarted),
        }
    }

    /// Hand back the result of a completed session and discard its history.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotComplete` while questions remain and
    /// `EngineError::NotStarted` without a session.
    pub fn end(&mut self) -> Result<SessionResult, EngineError> {
        match self.state {
            SessionState::Idle => Err(EngineError::NotStarted),
            SessionState::Complete => {
                self.session = None;
                self.pending = None;
                self.result.clone().ok_or(EngineError::NotStarted)
            }
            SessionState::AwaitingAnswer | SessionState::AnswerProcessed => {
                let (asked, max) = self
                    .session
                    .as_ref()
                    .map_or((0, 0), |s| (s.questions_asked(), s.max_questions()));
                Err(EngineError::NotComplete { asked, max })
            }
        }
    }

    /// Drop any session in progress without producing a result.
    pub fn abandon(&mut self) {
        if let Some(session) = &self.session {
            info!(
                session_id = %session.id(),
                asked = session.questions_asked(),
                "session abandoned"
            );
        }
        self.reset();
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.session.as_ref().map(Session::progress)
    }

    #[must_use]
    pub fn pending_problem(&self) -> Option<&Problem> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn mastery(&self) -> &MasteryTracker {
        &self.mastery
    }

    /// All mastery records, ordered by skill key.
    #[must_use]
    pub fn mastery_snapshot(&self) -> Vec<SkillMastery> {
        self.mastery.snapshot()
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.session = None;
        self.pending = None;
        self.result = None;
    }

    /// Select and generate the next problem without touching session state.
    fn build_problem(&mut self) -> Result<Problem, EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NotStarted)?;
        let difficulty = session.current_difficulty();
        let candidates: Vec<SubType> = match session.focus() {
            Some(focus) => vec![focus],
            None => self.generator.sub_types(difficulty, session.age_group()),
        };

        let mastery = &self.mastery;
        let sub_type = self.selector.select(
            &candidates,
            |s: SubType| mastery.get(&s.skill_key()),
            &mut self.rng,
        )?;

        let generated = self.generator.generate(difficulty, sub_type, &mut *self.rng)?;
        if generated.distractors.contains(&generated.correct_answer) {
            return Err(GeneratorError::Invalid(format!(
                "{sub_type} listed its correct answer as a distractor"
            ))
            .into());
        }
        let expected = self.generator.expected_answer_ms(sub_type, difficulty);

        Ok(Problem::from_generated(
            ProblemId::new(self.next_problem_id + 1),
            sub_type,
            difficulty,
            generated,
            expected,
        ))
    }

    fn commit_problem(&mut self, problem: Problem) -> Problem {
        self.next_problem_id = problem.id.value();
        self.events.emit(&SessionEvent::ProblemIssued {
            problem_id: problem.id,
            sub_type: problem.sub_type,
            difficulty: problem.difficulty,
        });
        self.pending = Some(problem.clone());
        self.state = SessionState::AwaitingAnswer;
        problem
    }

    fn complete(&mut self) -> Result<(), EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NotStarted)?;
        let completed_at = self.clock.now().max(session.started_at());
        let result = SessionResult::from_session(
            session,
            self.generator.domain(),
            completed_at,
            self.mastery.snapshot(),
        )?;

        info!(
            session_id = %result.session_id(),
            asked = result.questions_asked(),
            correct = result.correct_count(),
            longest_streak = result.longest_streak(),
            final_difficulty = %result.final_difficulty(),
            "session complete"
        );
        self.events.emit(&SessionEvent::Completed {
            session_id: result.session_id(),
            questions_asked: result.questions_asked(),
            correct_count: result.correct_count(),
        });

        self.result = Some(result);
        self.state = SessionState::Complete;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::domains::{ArithmeticGenerator, MoneyGenerator};
    use quiz_core::feedback::PlainFeedback;
    use quiz_core::model::{Domain, GeneratedProblem};
    use quiz_core::selector::SelectionError;
    use quiz_core::time::fixed_clock;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn engine() -> AdaptiveSessionEngine<ArithmeticGenerator> {
        AdaptiveSessionEngine::new(ArithmeticGenerator, EngineSettings::default())
            .unwrap()
            .with_seed(7)
            .with_clock(fixed_clock())
    }

    fn answer_correctly(
        engine: &mut AdaptiveSessionEngine<ArithmeticGenerator>,
        problem: &Problem,
    ) -> Outcome {
        engine
            .submit_answer(problem.id, &problem.correct_answer, 2_000)
            .unwrap()
    }

    /// Offers nothing above `Easy`, or another domain's sub-type when `foreign` is set.
    struct PatchyGenerator {
        foreign: bool,
    }

    impl ProblemGenerator for PatchyGenerator {
        fn domain(&self) -> Domain {
            Domain::Arithmetic
        }

        fn sub_types(&self, difficulty: Difficulty, _age_group: AgeGroup) -> Vec<SubType> {
            if self.foreign {
                vec![SubType::Addition, SubType::CoinCounting]
            } else if difficulty <= Difficulty::Easy {
                vec![SubType::Addition]
            } else {
                Vec::new()
            }
        }

        fn generate(
            &self,
            difficulty: Difficulty,
            sub_type: SubType,
            rng: &mut dyn RngCore,
        ) -> Result<GeneratedProblem, GeneratorError> {
            ArithmeticGenerator.generate(difficulty, sub_type, rng)
        }
    }

    #[test]
    fn construction_validates_catalogue() {
        let err = AdaptiveSessionEngine::new(
            PatchyGenerator { foreign: false },
            EngineSettings::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            ConfigError::EmptyCatalogue {
                difficulty: Difficulty::Medium,
                ..
            }
        ));

        let err = AdaptiveSessionEngine::new(
            PatchyGenerator { foreign: true },
            EngineSettings::default(),
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            ConfigError::ForeignSubType {
                sub_type: SubType::CoinCounting,
                domain: Domain::Arithmetic
            }
        );

        let ladder = DifficultyLadder::new(vec![Difficulty::Beginner, Difficulty::Easy]).unwrap();
        assert!(AdaptiveSessionEngine::new(
            PatchyGenerator { foreign: false },
            EngineSettings::default().with_ladder(ladder),
        )
        .is_ok());
    }

    #[test]
    fn start_rejects_bad_config_and_leaves_no_session() {
        let mut engine = engine();
        let err = engine.start(SessionConfig::new(0, Difficulty::Easy)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::InvalidMaxQuestions)
        ));
        assert_eq!(engine.state(), SessionState::Idle);
        assert!(engine.session().is_none());

        let err = engine
            .start(SessionConfig::new(3, Difficulty::Easy).with_focus(SubType::HourReading))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::ForeignSubType { .. })
        ));

        // Multiplication is for early primary only.
        let err = engine
            .start(
                SessionConfig::new(3, Difficulty::Easy)
                    .with_focus(SubType::Multiplication)
                    .with_age_group(AgeGroup::Preschool),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::FocusNotOffered(SubType::Multiplication))
        ));
    }

    /// Arithmetic problems until `broken` is set, then generation fails.
    #[derive(Default)]
    struct SwitchableGenerator {
        broken: AtomicBool,
    }

    impl ProblemGenerator for SwitchableGenerator {
        fn domain(&self) -> Domain {
            Domain::Arithmetic
        }

        fn sub_types(&self, difficulty: Difficulty, age_group: AgeGroup) -> Vec<SubType> {
            ArithmeticGenerator.sub_types(difficulty, age_group)
        }

        fn generate(
            &self,
            difficulty: Difficulty,
            sub_type: SubType,
            rng: &mut dyn RngCore,
        ) -> Result<GeneratedProblem, GeneratorError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(GeneratorError::Invalid("generator offline".into()));
            }
            ArithmeticGenerator.generate(difficulty, sub_type, rng)
        }
    }

    #[test]
    fn rejected_start_keeps_the_running_session() {
        let mut engine = engine();
        let problem = engine.start(SessionConfig::new(5, Difficulty::Easy)).unwrap();
        answer_correctly(&mut engine, &problem);

        let err = engine.start(SessionConfig::new(0, Difficulty::Easy)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::InvalidMaxQuestions)
        ));
        assert_eq!(engine.state(), SessionState::AnswerProcessed);
        let session = engine.session().unwrap();
        assert_eq!(session.questions_asked(), 1);
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.current_streak(), 1);

        let NextStep::Problem(next) = engine.next_problem().unwrap() else {
            panic!("expected a problem");
        };
        let err = engine
            .start(SessionConfig::new(3, Difficulty::Easy).with_focus(SubType::CoinCounting))
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert_eq!(engine.state(), SessionState::AwaitingAnswer);
        assert_eq!(engine.pending_problem(), Some(&next));
        assert!(engine.submit_answer(next.id, &next.correct_answer, 1_000).is_ok());
    }

    #[test]
    fn failed_first_problem_announces_nothing() {
        let mut engine =
            AdaptiveSessionEngine::new(SwitchableGenerator::default(), EngineSettings::default())
                .unwrap()
                .with_seed(4);
        let starts = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&starts);
        engine.on_event(move |event| {
            if matches!(event, SessionEvent::Started { .. }) {
                *sink.lock().unwrap() += 1;
            }
        });

        let problem = engine.start(SessionConfig::new(4, Difficulty::Easy)).unwrap();
        engine.generator().broken.store(true, Ordering::SeqCst);
        let err = engine.start(SessionConfig::new(4, Difficulty::Easy)).unwrap_err();
        assert!(matches!(err, EngineError::Generator(_)));

        assert_eq!(*starts.lock().unwrap(), 1);
        assert_eq!(engine.state(), SessionState::AwaitingAnswer);
        assert_eq!(engine.pending_problem(), Some(&problem));
        engine.generator().broken.store(false, Ordering::SeqCst);
        let outcome = engine
            .submit_answer(problem.id, &problem.correct_answer, 1_000)
            .unwrap();
        assert!(outcome.correct);
    }

    #[test]
    fn three_correct_answers_escalate_once_on_the_third() {
        let mut engine = engine();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        engine.on_event(move |event| {
            if let SessionEvent::DifficultyChanged { from, to } = event {
                sink.lock().unwrap().push((*from, *to));
            }
        });

        let mut problem = engine.start(SessionConfig::new(3, Difficulty::Easy)).unwrap();
        let mut difficulties = Vec::new();
        for round in 0..3 {
            let outcome = answer_correctly(&mut engine, &problem);
            assert!(outcome.correct);
            difficulties.push(outcome.new_difficulty);
            if round < 2 {
                match engine.next_problem().unwrap() {
                    NextStep::Problem(p) => problem = p,
                    NextStep::Complete(_) => panic!("session ended early"),
                }
            } else {
                assert!(outcome.session_complete);
            }
        }

        assert_eq!(
            difficulties,
            vec![Difficulty::Easy, Difficulty::Easy, Difficulty::Medium]
        );
        assert_eq!(
            *changes.lock().unwrap(),
            vec![(Difficulty::Easy, Difficulty::Medium)]
        );
    }

    #[test]
    fn answering_twice_is_rejected_without_side_effects() {
        let mut engine = engine();
        let problem = engine.start(SessionConfig::new(5, Difficulty::Easy)).unwrap();
        answer_correctly(&mut engine, &problem);
        let before = engine.session().unwrap().clone();

        let err = engine
            .submit_answer(problem.id, &problem.correct_answer, 1_000)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownProblem(id) if id == problem.id));

        let after = engine.session().unwrap();
        assert_eq!(after.questions_asked(), before.questions_asked());
        assert_eq!(after.correct_count(), before.correct_count());
        assert_eq!(after.current_streak(), before.current_streak());
        assert_eq!(after.history().len(), before.history().len());
        assert_eq!(engine.state(), SessionState::AnswerProcessed);
    }

    #[test]
    fn wrong_answer_is_an_outcome_and_resets_streak() {
        let mut engine = engine().with_feedback(PlainFeedback);
        let problem = engine.start(SessionConfig::new(5, Difficulty::Easy)).unwrap();
        answer_correctly(&mut engine, &problem);
        let NextStep::Problem(problem) = engine.next_problem().unwrap() else {
            panic!("expected a problem");
        };

        let outcome = engine
            .submit_answer(problem.id, &Answer::text("not a number"), 4_000)
            .unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.current_streak, 0);
        assert_eq!(outcome.correct_answer, problem.correct_answer);
        assert!(outcome.feedback.is_some());

        let session = engine.session().unwrap();
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.incorrect_count(), 1);
    }

    #[test]
    fn next_problem_repeats_the_pending_problem() {
        let mut engine = engine();
        let first = engine.start(SessionConfig::new(3, Difficulty::Easy)).unwrap();
        let NextStep::Problem(again) = engine.next_problem().unwrap() else {
            panic!("expected a problem");
        };
        assert_eq!(again, first);
    }

    #[test]
    fn end_requires_completion_and_discards_history() {
        let mut engine = engine();
        assert!(matches!(engine.end(), Err(EngineError::NotStarted)));

        let problem = engine.start(SessionConfig::new(1, Difficulty::Easy)).unwrap();
        engine.clock_mut().advance(chrono::Duration::seconds(12));
        assert!(matches!(
            engine.end(),
            Err(EngineError::NotComplete { asked: 0, max: 1 })
        ));

        answer_correctly(&mut engine, &problem);
        let NextStep::Complete(from_next) = engine.next_problem().unwrap() else {
            panic!("expected the result");
        };
        let result = engine.end().unwrap();
        assert_eq!(result, from_next);
        assert_eq!(result.questions_asked(), 1);
        assert_eq!(result.elapsed_ms(), 12_000);
        assert!((result.accuracy() - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.mastery().len(), 1);
        assert!(engine.session().is_none());
        assert_eq!(engine.state(), SessionState::Complete);
    }

    #[test]
    fn focus_session_only_asks_the_focus() {
        let mut engine = AdaptiveSessionEngine::new(MoneyGenerator, EngineSettings::default())
            .unwrap()
            .with_seed(3);
        let config = SessionConfig::new(6, Difficulty::Medium).with_focus(SubType::MakingChange);
        let mut problem = engine.start(config).unwrap();
        loop {
            assert_eq!(problem.sub_type, SubType::MakingChange);
            engine
                .submit_answer(problem.id, &problem.correct_answer, 3_000)
                .unwrap();
            match engine.next_problem().unwrap() {
                NextStep::Problem(p) => problem = p,
                NextStep::Complete(result) => {
                    assert_eq!(result.correct_count(), 6);
                    break;
                }
            }
        }
    }

    #[test]
    fn same_seed_issues_same_problems() {
        let run = || {
            let mut engine = engine();
            let mut prompts = Vec::new();
            let mut problem = engine.start(SessionConfig::new(6, Difficulty::Medium)).unwrap();
            loop {
                prompts.push(problem.prompt.clone());
                answer_correctly(&mut engine, &problem);
                match engine.next_problem().unwrap() {
                    NextStep::Problem(p) => problem = p,
                    NextStep::Complete(result) => return (prompts, result.session_id()),
                }
            }
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn loaded_mastery_promotes_on_the_tenth_attempt() {
        let key = SubType::Addition.skill_key();
        let record = SkillMastery::from_persisted(key.clone(), 9, 8, 1).unwrap();
        let mut engine = engine().with_mastery(HashMap::from([(key.clone(), record)]));
        let config = SessionConfig::new(1, Difficulty::Beginner).with_focus(SubType::Addition);
        let problem = engine.start(config).unwrap();

        let outcome = answer_correctly(&mut engine, &problem);
        assert!(outcome.promoted);
        assert_eq!(outcome.mastery.level(), 2);
        assert_eq!(engine.mastery().get(&key).unwrap().attempts(), 10);
    }

    #[test]
    fn selection_error_surfaces_as_engine_error() {
        let err: EngineError = SelectionError::NoCandidates.into();
        assert!(matches!(err, EngineError::Selection(SelectionError::NoCandidates)));
    }
}
