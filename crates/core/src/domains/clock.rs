use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::json;

use super::DISTRACTOR_COUNT;
use crate::generator::{GeneratorError, ProblemGenerator};
use crate::model::{AgeGroup, Answer, ComparisonRule, Difficulty, Domain, GeneratedProblem, SubType};

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DIAL: u32 = 12 * MINUTES_PER_HOUR;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClockGenerator;

/// A time on a twelve-hour dial. Hours run 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DialTime {
    hour: u32,
    minute: u32,
}

impl DialTime {
    fn from_minutes(total: u32) -> Self {
        let total = total % MINUTES_PER_DIAL;
        let hour = total / MINUTES_PER_HOUR;
        Self {
            hour: if hour == 0 { 12 } else { hour },
            minute: total % MINUTES_PER_HOUR,
        }
    }

    fn minutes(self) -> u32 {
        (self.hour % 12) * MINUTES_PER_HOUR + self.minute
    }

    fn shifted(self, minutes: i64) -> Self {
        let dial = i64::from(MINUTES_PER_DIAL);
        let shifted = (i64::from(self.minutes()) + minutes).rem_euclid(dial);
        Self::from_minutes(u32::try_from(shifted).unwrap_or(0))
    }

    fn label(self) -> String {
        format!("{}:{:02}", self.hour, self.minute)
    }
}

fn random_time(rng: &mut dyn RngCore, minute_step: u32) -> DialTime {
    let hour = rng.random_range(1..=12);
    let minute = minute_step * rng.random_range(0..MINUTES_PER_HOUR / minute_step);
    DialTime { hour, minute }
}

/// Common misreadings: hour off by one, hands swapped, half an hour out.
fn time_distractors(rng: &mut dyn RngCore, correct: DialTime, minute_step: u32) -> Vec<Answer> {
    let mut candidates = vec![
        correct.shifted(60),
        correct.shifted(-60),
        correct.shifted(i64::from(minute_step)),
        correct.shifted(-i64::from(minute_step)),
        correct.shifted(30),
    ];
    if correct.minute > 0 && correct.minute % 5 == 0 {
        candidates.push(DialTime {
            hour: correct.minute / 5,
            minute: (correct.hour % 12) * 5,
        });
    }
    candidates.shuffle(rng);

    let mut picked: Vec<String> = Vec::with_capacity(DISTRACTOR_COUNT);
    let correct_label = correct.label();
    for candidate in candidates {
        let label = candidate.label();
        if label != correct_label && !picked.contains(&label) {
            picked.push(label);
        }
        if picked.len() == DISTRACTOR_COUNT {
            break;
        }
    }
    picked.into_iter().map(Answer::Text).collect()
}

fn reading(time: DialTime) -> (String, serde_json::Value) {
    (
        "What time does the clock show?".to_string(),
        json!({ "kind": "analog_clock", "hour": time.hour, "minute": time.minute }),
    )
}

impl ProblemGenerator for ClockGenerator {
    fn domain(&self) -> Domain {
        Domain::Clock
    }

    fn sub_types(&self, difficulty: Difficulty, age_group: AgeGroup) -> Vec<SubType> {
        let mut offered = vec![SubType::HourReading];
        if difficulty >= Difficulty::Easy {
            offered.push(SubType::HalfHourReading);
        }
        if difficulty >= Difficulty::Medium && age_group >= AgeGroup::Kindergarten {
            offered.push(SubType::QuarterHourReading);
        }
        if difficulty >= Difficulty::Challenging && age_group >= AgeGroup::Kindergarten {
            offered.push(SubType::FiveMinuteReading);
        }
        if difficulty >= Difficulty::Expert && age_group >= AgeGroup::EarlyPrimary {
            offered.push(SubType::ElapsedTime);
        }
        offered
    }

    fn generate(
        &self,
        _difficulty: Difficulty,
        sub_type: SubType,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedProblem, GeneratorError> {
        let minute_step = match sub_type {
            SubType::HourReading => MINUTES_PER_HOUR,
            SubType::HalfHourReading => 30,
            SubType::QuarterHourReading => 15,
            SubType::FiveMinuteReading | SubType::ElapsedTime => 5,
            other => {
                return Err(GeneratorError::UnsupportedSubType {
                    domain: Domain::Clock,
                    sub_type: other,
                });
            }
        };

        let start = random_time(rng, minute_step);
        let (answer, prompt, display) = if sub_type == SubType::ElapsedTime {
            let elapsed = 15 * rng.random_range(1..=12_u32);
            let end = start.shifted(i64::from(elapsed));
            (
                end,
                format!(
                    "It is {}. What time will it be in {elapsed} minutes?",
                    start.label()
                ),
                json!({
                    "kind": "elapsed_time",
                    "hour": start.hour,
                    "minute": start.minute,
                    "elapsed_minutes": elapsed,
                }),
            )
        } else {
            let (prompt, display) = reading(start);
            (start, prompt, display)
        };

        Ok(GeneratedProblem {
            prompt,
            display,
            correct_answer: Answer::Text(answer.label()),
            distractors: time_distractors(rng, answer, minute_step),
            rule: ComparisonRule::Exact,
        })
    }

    fn expected_answer_ms(&self, sub_type: SubType, _difficulty: Difficulty) -> Option<u32> {
        Some(match sub_type {
            SubType::HourReading => 5_000,
            SubType::HalfHourReading => 7_000,
            SubType::QuarterHourReading => 9_000,
            SubType::FiveMinuteReading => 12_000,
            _ => 20_000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn dial_wraps_past_twelve() {
        let t = DialTime { hour: 11, minute: 45 };
        assert_eq!(t.shifted(30).label(), "12:15");
        assert_eq!(t.shifted(90).label(), "1:15");
        assert_eq!(DialTime { hour: 12, minute: 10 }.shifted(-20).label(), "11:50");
    }

    #[test]
    fn hour_reading_is_on_the_hour() {
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..20 {
            let p = ClockGenerator
                .generate(Difficulty::Beginner, SubType::HourReading, &mut rng)
                .unwrap();
            assert!(p.correct_answer.as_text().ends_with(":00"));
            assert_eq!(p.display["minute"], 0);
            assert_eq!(p.distractors.len(), DISTRACTOR_COUNT);
        }
    }

    #[test]
    fn quarter_reading_uses_quarter_minutes() {
        let mut rng = StdRng::seed_from_u64(32);
        for _ in 0..20 {
            let p = ClockGenerator
                .generate(Difficulty::Medium, SubType::QuarterHourReading, &mut rng)
                .unwrap();
            let minute = p.display["minute"].as_u64().unwrap();
            assert_eq!(minute % 15, 0);
        }
    }

    #[test]
    fn elapsed_time_answer_matches_shift() {
        let mut rng = StdRng::seed_from_u64(33);
        let p = ClockGenerator
            .generate(Difficulty::Expert, SubType::ElapsedTime, &mut rng)
            .unwrap();
        let start = DialTime {
            hour: u32::try_from(p.display["hour"].as_u64().unwrap()).unwrap(),
            minute: u32::try_from(p.display["minute"].as_u64().unwrap()).unwrap(),
        };
        let elapsed = p.display["elapsed_minutes"].as_i64().unwrap();
        assert_eq!(p.correct_answer, Answer::Text(start.shifted(elapsed).label()));
    }

    #[test]
    fn elapsed_time_needs_early_primary() {
        let g = ClockGenerator;
        assert!(!g
            .sub_types(Difficulty::Expert, AgeGroup::Kindergarten)
            .contains(&SubType::ElapsedTime));
        assert!(g
            .sub_types(Difficulty::Expert, AgeGroup::EarlyPrimary)
            .contains(&SubType::ElapsedTime));
    }
}
