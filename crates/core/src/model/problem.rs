use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::model::{Difficulty, Domain, ProblemId, SubType};

/// Slack added to tolerance comparisons so that `0.30 - 0.29` still counts as within a cent.
const TOLERANCE_SLACK: f64 = 1e-9;

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A value a learner can give, or the expected value of a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Integer(i64),
    Decimal(f64),
    Text(String),
    /// Index into the options shown with the problem.
    Choice(usize),
}

impl Answer {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Numeric reading of the answer. Text is parsed, with a leading `$` allowed.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Answer::Integer(v) => Some(*v as f64),
            Answer::Decimal(v) => Some(*v),
            Answer::Text(t) => t.trim().trim_start_matches('$').parse::<f64>().ok(),
            Answer::Choice(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Answer::Text(t) => Cow::Borrowed(t.trim()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Integer(v) => write!(f, "{v}"),
            Answer::Decimal(v) => write!(f, "{v:.2}"),
            Answer::Text(t) => f.write_str(t),
            Answer::Choice(i) => write!(f, "{i}"),
        }
    }
}

//
// ─── COMPARISON RULE ───────────────────────────────────────────────────────────
//

/// How a submitted answer is compared with the expected one. Chosen by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ComparisonRule {
    Exact,
    NumericTolerance { epsilon: f64 },
    CaseInsensitive,
    ChoiceIndex,
}

impl ComparisonRule {
    /// Currency amounts are accepted within one cent.
    pub const CURRENCY: ComparisonRule = ComparisonRule::NumericTolerance { epsilon: 0.01 };

    #[must_use]
    pub fn matches(&self, expected: &Answer, given: &Answer) -> bool {
        match self {
            ComparisonRule::Exact => match (expected, given) {
                (Answer::Text(a), Answer::Text(b)) => a.trim() == b.trim(),
                (Answer::Choice(a), Answer::Choice(b)) => a == b,
                (Answer::Integer(a), Answer::Integer(b)) => a == b,
                (Answer::Choice(_), _) | (_, Answer::Choice(_)) => false,
                _ => match (expected.as_number(), given.as_number()) {
                    #[allow(clippy::float_cmp)]
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                },
            },
            ComparisonRule::NumericTolerance { epsilon } => {
                match (expected.as_number(), given.as_number()) {
                    (Some(a), Some(b)) => (a - b).abs() <= epsilon + TOLERANCE_SLACK,
                    _ => false,
                }
            }
            ComparisonRule::CaseInsensitive => {
                expected.as_text().to_lowercase() == given.as_text().to_lowercase()
            }
            ComparisonRule::ChoiceIndex => match (expected, given) {
                (Answer::Choice(a), Answer::Choice(b)) => a == b,
                (Answer::Choice(a), Answer::Integer(b)) => usize::try_from(*b) == Ok(*a),
                _ => false,
            },
        }
    }
}

//
// ─── PROBLEMS ──────────────────────────────────────────────────────────────────
//

/// What a generator hands back; the engine adds identity and context.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProblem {
    pub prompt: String,
    /// Rendering data for the UI. Opaque to the engine.
    pub display: serde_json::Value,
    pub correct_answer: Answer,
    pub distractors: Vec<Answer>,
    pub rule: ComparisonRule,
}

/// A problem issued to the UI and awaiting an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub id: ProblemId,
    pub domain: Domain,
    pub sub_type: SubType,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub display: serde_json::Value,
    pub correct_answer: Answer,
    pub distractors: Vec<Answer>,
    pub rule: ComparisonRule,
    /// Advisory only; the engine never enforces it.
    pub expected_answer_ms: Option<u32>,
}

impl Problem {
    #[must_use]
    pub fn from_generated(
        id: ProblemId,
        sub_type: SubType,
        difficulty: Difficulty,
        generated: GeneratedProblem,
        expected_answer_ms: Option<u32>,
    ) -> Self {
        Self {
            id,
            domain: sub_type.domain(),
            sub_type,
            difficulty,
            prompt: generated.prompt,
            display: generated.display,
            correct_answer: generated.correct_answer,
            distractors: generated.distractors,
            rule: generated.rule,
            expected_answer_ms,
        }
    }

    #[must_use]
    pub fn is_correct(&self, answer: &Answer) -> bool {
        self.rule.matches(&self.correct_answer, answer)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
