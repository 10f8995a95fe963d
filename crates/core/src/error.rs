use thiserror::Error;

use crate::model::{AgeGroup, Difficulty, Domain, SubType};

/// Invalid engine or session configuration. No session is created when this is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("max questions must be > 0")]
    InvalidMaxQuestions,

    #[error("difficulty ladder cannot be empty")]
    EmptyLadder,

    #[error("difficulty ladder must be strictly ascending, {next} follows {previous}")]
    UnorderedLadder {
        previous: Difficulty,
        next: Difficulty,
    },

    #[error("difficulty {0} is not on the configured ladder")]
    DifficultyNotOnLadder(Difficulty),

    #[error("{domain} offers no sub-types at {difficulty} for {age_group}")]
    EmptyCatalogue {
        domain: Domain,
        difficulty: Difficulty,
        age_group: AgeGroup,
    },

    #[error("sub-type {sub_type} does not belong to {domain}")]
    ForeignSubType { sub_type: SubType, domain: Domain },

    #[error("focus sub-type {0} is not offered on this ladder")]
    FocusNotOffered(SubType),

    #[error(transparent)]
    Key(#[from] ParseKeyError),
}

/// A string key (difficulty, domain, age group, sub-type, skill) that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} key: {value:?}")]
pub struct ParseKeyError {
    kind: &'static str,
    value: String,
}

impl ParseKeyError {
    #[must_use]
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}
