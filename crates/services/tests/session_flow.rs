use proptest::prelude::*;
use quiz_core::domains::generator_for;
use quiz_core::model::{AgeGroup, Answer, Difficulty, Domain, EngineSettings, SessionConfig};
use quiz_core::time::fixed_clock;
use services::{AdaptiveSessionEngine, NextStep, SessionState};

/// Answers according to `pattern`, cycling, until the session completes.
fn play(domain: Domain, seed: u64, max: u32, start: Difficulty, pattern: &[bool]) -> Vec<bool> {
    let settings = EngineSettings::default().with_age_group(AgeGroup::EarlyPrimary);
    let mut engine = AdaptiveSessionEngine::new(generator_for(domain), settings)
        .unwrap()
        .with_seed(seed)
        .with_clock(fixed_clock());

    let mut problem = engine.start(SessionConfig::new(max, start)).unwrap();
    let mut seen = Vec::new();
    for i in 0.. {
        assert_eq!(problem.domain, domain);
        let correct = pattern[i % pattern.len()];
        let answer = if correct {
            problem.correct_answer.clone()
        } else {
            problem.distractors[0].clone()
        };
        let outcome = engine.submit_answer(problem.id, &answer, 3_000).unwrap();
        assert_eq!(outcome.correct, correct);
        seen.push(outcome.correct);

        let session = engine.session().unwrap();
        assert_eq!(
            session.correct_count() + session.incorrect_count(),
            session.questions_asked()
        );
        assert!(engine.settings().ladder().contains(session.current_difficulty()));

        match engine.next_problem().unwrap() {
            NextStep::Problem(p) => problem = p,
            NextStep::Complete(result) => {
                assert_eq!(result.questions_asked(), max);
                assert_eq!(engine.state(), SessionState::Complete);
                break;
            }
        }
    }
    seen
}

#[test]
fn every_domain_plays_to_completion() {
    for domain in Domain::ALL {
        let answered = play(domain, 17, 12, Difficulty::Easy, &[true, true, false]);
        assert_eq!(answered.len(), 12);
    }
}

#[test]
fn struggling_learner_drops_to_the_bottom() {
    let settings = EngineSettings::default();
    let mut engine = AdaptiveSessionEngine::new(generator_for(Domain::Sequences), settings)
        .unwrap()
        .with_seed(5);
    let mut problem = engine.start(SessionConfig::new(12, Difficulty::Expert)).unwrap();
    loop {
        engine
            .submit_answer(problem.id, &Answer::Integer(-1), 9_000)
            .unwrap();
        match engine.next_problem().unwrap() {
            NextStep::Problem(p) => problem = p,
            NextStep::Complete(result) => {
                assert_eq!(result.final_difficulty(), Difficulty::Beginner);
                assert_eq!(result.correct_count(), 0);
                assert_eq!(result.longest_streak(), 0);
                break;
            }
        }
    }
}

#[test]
fn strong_learner_climbs_to_the_top() {
    let mut engine =
        AdaptiveSessionEngine::new(generator_for(Domain::Clock), EngineSettings::default())
            .unwrap()
            .with_seed(6);
    let mut problem = engine.start(SessionConfig::new(15, Difficulty::Beginner)).unwrap();
    loop {
        engine
            .submit_answer(problem.id, &problem.correct_answer.clone(), 1_000)
            .unwrap();
        match engine.next_problem().unwrap() {
            NextStep::Problem(p) => problem = p,
            NextStep::Complete(result) => {
                assert_eq!(result.final_difficulty(), Difficulty::Expert);
                assert_eq!(result.longest_streak(), 15);
                break;
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counters_and_streaks_stay_consistent(
        seed in any::<u64>(),
        max in 1u32..30,
        outcomes in proptest::collection::vec(any::<bool>(), 1..30),
        domain in prop_oneof![
            Just(Domain::Arithmetic),
            Just(Domain::Sequences),
            Just(Domain::Clock),
            Just(Domain::Money),
        ],
    ) {
        let answered = play(domain, seed, max, Difficulty::Medium, &outcomes);
        prop_assert_eq!(answered.len(), max as usize);

        let mut streak = 0u32;
        let mut longest = 0u32;
        for correct in &answered {
            streak = if *correct { streak + 1 } else { 0 };
            longest = longest.max(streak);
        }
        prop_assert!(longest <= max);
    }
}
