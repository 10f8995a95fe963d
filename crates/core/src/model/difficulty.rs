use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseKeyError;

/// Named difficulty levels, ordered from easiest to hardest.
///
/// A domain plays on a ladder, which is an ascending subset of these levels
/// (see [`crate::ladder::DifficultyLadder`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Challenging,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Challenging,
        Difficulty::Expert,
    ];

    /// Stable key used in configuration and storage.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Challenging => "challenging",
            Difficulty::Expert => "expert",
        }
    }

    /// Zero-based position in the full ordering.
    #[must_use]
    pub fn rank(self) -> usize {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Challenging => 3,
            Difficulty::Expert => 4,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Difficulty {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.key() == key)
            .ok_or_else(|| ParseKeyError::new("difficulty", s))
    }
}
