use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseKeyError;

//
// ─── DOMAIN ────────────────────────────────────────────────────────────────────
//

/// Content area a generator produces problems for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Arithmetic,
    Sequences,
    Clock,
    Money,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Arithmetic,
        Domain::Sequences,
        Domain::Clock,
        Domain::Money,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Domain::Arithmetic => "arithmetic",
            Domain::Sequences => "sequences",
            Domain::Clock => "clock",
            Domain::Money => "money",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Domain {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.key() == key)
            .ok_or_else(|| ParseKeyError::new("domain", s))
    }
}

//
// ─── AGE GROUP ─────────────────────────────────────────────────────────────────
//

/// Age band of the learner. Generators use it to gate which sub-types are offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    /// Ages 3-4.
    Preschool,
    /// Ages 5-6.
    #[default]
    Kindergarten,
    /// Ages 7-8.
    EarlyPrimary,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [
        AgeGroup::Preschool,
        AgeGroup::Kindergarten,
        AgeGroup::EarlyPrimary,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            AgeGroup::Preschool => "preschool",
            AgeGroup::Kindergarten => "kindergarten",
            AgeGroup::EarlyPrimary => "early_primary",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AgeGroup {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        AgeGroup::ALL
            .into_iter()
            .find(|a| a.key() == key)
            .ok_or_else(|| ParseKeyError::new("age group", s))
    }
}

//
// ─── SUB-TYPE ──────────────────────────────────────────────────────────────────
//

/// A named kind of question within a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubType {
    // arithmetic
    Addition,
    Subtraction,
    Multiplication,
    MissingAddend,
    NumberComparison,
    // sequences
    CountingOn,
    SkipCounting,
    CountingBackwards,
    MissingNumber,
    // clock
    HourReading,
    HalfHourReading,
    QuarterHourReading,
    FiveMinuteReading,
    ElapsedTime,
    // money
    CoinCounting,
    AmountComparison,
    MakingChange,
    CoinCombination,
}

impl SubType {
    pub const ALL: [SubType; 18] = [
        SubType::Addition,
        SubType::Subtraction,
        SubType::Multiplication,
        SubType::MissingAddend,
        SubType::NumberComparison,
        SubType::CountingOn,
        SubType::SkipCounting,
        SubType::CountingBackwards,
        SubType::MissingNumber,
        SubType::HourReading,
        SubType::HalfHourReading,
        SubType::QuarterHourReading,
        SubType::FiveMinuteReading,
        SubType::ElapsedTime,
        SubType::CoinCounting,
        SubType::AmountComparison,
        SubType::MakingChange,
        SubType::CoinCombination,
    ];

    #[must_use]
    pub fn domain(self) -> Domain {
        match self {
            SubType::Addition
            | SubType::Subtraction
            | SubType::Multiplication
            | SubType::MissingAddend
            | SubType::NumberComparison => Domain::Arithmetic,
            SubType::CountingOn
            | SubType::SkipCounting
            | SubType::CountingBackwards
            | SubType::MissingNumber => Domain::Sequences,
            SubType::HourReading
            | SubType::HalfHourReading
            | SubType::QuarterHourReading
            | SubType::FiveMinuteReading
            | SubType::ElapsedTime => Domain::Clock,
            SubType::CoinCounting
            | SubType::AmountComparison
            | SubType::MakingChange
            | SubType::CoinCombination => Domain::Money,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            SubType::Addition => "addition",
            SubType::Subtraction => "subtraction",
            SubType::Multiplication => "multiplication",
            SubType::MissingAddend => "missing_addend",
            SubType::NumberComparison => "number_comparison",
            SubType::CountingOn => "counting_on",
            SubType::SkipCounting => "skip_counting",
            SubType::CountingBackwards => "counting_backwards",
            SubType::MissingNumber => "missing_number",
            SubType::HourReading => "hour_reading",
            SubType::HalfHourReading => "half_hour_reading",
            SubType::QuarterHourReading => "quarter_hour_reading",
            SubType::FiveMinuteReading => "five_minute_reading",
            SubType::ElapsedTime => "elapsed_time",
            SubType::CoinCounting => "coin_counting",
            SubType::AmountComparison => "amount_comparison",
            SubType::MakingChange => "making_change",
            SubType::CoinCombination => "coin_combination",
        }
    }

    /// Mastery key for this sub-type, e.g. `money.making_change`.
    #[must_use]
    pub fn skill_key(self) -> SkillKey {
        SkillKey(format!("{}.{}", self.domain().key(), self.key()))
    }

    /// All sub-types belonging to `domain`, in declaration order.
    pub fn in_domain(domain: Domain) -> impl Iterator<Item = SubType> {
        SubType::ALL.into_iter().filter(move |s| s.domain() == domain)
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SubType {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        SubType::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| ParseKeyError::new("sub-type", s))
    }
}

//
// ─── SKILL KEY ─────────────────────────────────────────────────────────────────
//

/// Key under which a [`crate::mastery::SkillMastery`] record is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillKey(String);

impl SkillKey {
    /// Validates a persisted key: non-empty, lowercase ASCII, digits, `_` and `.` only.
    ///
    /// # Errors
    ///
    /// Returns `ParseKeyError` for an empty key or one with other characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ParseKeyError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');
        if valid {
            Ok(Self(value))
        } else {
            Err(ParseKeyError::new("skill", value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sub-type this key was derived from, if any.
    #[must_use]
    pub fn sub_type(&self) -> Option<SubType> {
        SubType::ALL.into_iter().find(|s| s.skill_key() == *self)
    }
}

impl From<SubType> for SkillKey {
    fn from(sub_type: SubType) -> Self {
        sub_type.skill_key()
    }
}

impl fmt::Display for SkillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SkillKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillKey::new(s.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_domain_has_sub_types() {
        for domain in Domain::ALL {
            assert!(SubType::in_domain(domain).count() >= 4, "{domain}");
        }
    }

    #[test]
    fn skill_keys_are_namespaced_and_unique() {
        let key = SubType::MakingChange.skill_key();
        assert_eq!(key.as_str(), "money.making_change");
        assert_eq!(key.sub_type(), Some(SubType::MakingChange));

        let mut keys: Vec<_> = SubType::ALL.iter().map(|s| s.skill_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), SubType::ALL.len());
    }

    #[test]
    fn skill_key_rejects_bad_characters() {
        assert!(SkillKey::new("").is_err());
        assert!(SkillKey::new("Money.Change").is_err());
        assert!(SkillKey::new("money.making_change").is_ok());
    }

    #[test]
    fn keys_parse_back() {
        assert_eq!("skip_counting".parse::<SubType>().unwrap(), SubType::SkipCounting);
        assert_eq!("Money".parse::<Domain>().unwrap(), Domain::Money);
        assert_eq!(
            "early-primary".parse::<AgeGroup>().unwrap(),
            AgeGroup::EarlyPrimary
        );
        let err = "space".parse::<Domain>().unwrap_err();
        assert_eq!(err.value(), "space");
    }
}
