use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::SkillKey;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;
/// Attempts required before a skill can be promoted.
pub const PROMOTION_MIN_ATTEMPTS: u32 = 10;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A persisted mastery record that violates the counter invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MasteryError {
    #[error("successes ({successes}) exceed attempts ({attempts})")]
    SuccessesExceedAttempts { attempts: u32, successes: u32 },

    #[error("level {0} is outside 1..=5")]
    LevelOutOfRange(u8),
}

//
// ─── SKILL MASTERY ─────────────────────────────────────────────────────────────
//

/// Counters for one skill. `successes <= attempts` and `level` stays within `1..=5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSkillMastery")]
pub struct SkillMastery {
    skill_key: SkillKey,
    attempts: u32,
    successes: u32,
    level: u8,
}

/// Unchecked wire form; deserialization goes through [`SkillMastery::from_persisted`].
#[derive(Deserialize)]
struct RawSkillMastery {
    skill_key: SkillKey,
    attempts: u32,
    successes: u32,
    level: u8,
}

impl TryFrom<RawSkillMastery> for SkillMastery {
    type Error = MasteryError;

    fn try_from(raw: RawSkillMastery) -> Result<Self, Self::Error> {
        Self::from_persisted(raw.skill_key, raw.attempts, raw.successes, raw.level)
    }
}

impl SkillMastery {
    #[must_use]
    pub fn new(skill_key: SkillKey) -> Self {
        Self {
            skill_key,
            attempts: 0,
            successes: 0,
            level: MIN_LEVEL,
        }
    }

    /// Rehydrate a record from persistence.
    ///
    /// # Errors
    ///
    /// Returns `MasteryError` when the counters or level are out of range.
    pub fn from_persisted(
        skill_key: SkillKey,
        attempts: u32,
        successes: u32,
        level: u8,
    ) -> Result<Self, MasteryError> {
        if successes > attempts {
            return Err(MasteryError::SuccessesExceedAttempts {
                attempts,
                successes,
            });
        }
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(MasteryError::LevelOutOfRange(level));
        }
        Ok(Self {
            skill_key,
            attempts,
            successes,
            level,
        })
    }

    #[must_use]
    pub fn skill_key(&self) -> &SkillKey {
        &self.skill_key
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn successes(&self) -> u32 {
        self.successes
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// `successes / attempts`, or 0 for a skill never attempted.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.successes) / f64::from(self.attempts)
        }
    }

    /// Success rate of at least 0.8 over at least ten attempts.
    #[must_use]
    pub fn meets_promotion_threshold(&self) -> bool {
        self.attempts >= PROMOTION_MIN_ATTEMPTS
            && u64::from(self.successes) * 5 >= u64::from(self.attempts) * 4
    }

    #[must_use]
    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_LEVEL
    }

    fn record(&mut self, correct: bool) {
        self.attempts = self.attempts.saturating_add(1);
        if correct {
            self.successes = self.successes.saturating_add(1);
        }
    }

    fn promote(&mut self) -> bool {
        if self.level < MAX_LEVEL {
            self.level += 1;
            true
        } else {
            false
        }
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// When a skill that meets the threshold is promoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionPolicy {
    /// On every update that ends at or above the threshold, until the level cap.
    #[default]
    EveryUpdate,
    /// Only on the update that moves a skill from below the threshold to at or above it.
    OnCrossing,
}

/// Result of a single [`MasteryTracker::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteryUpdate {
    pub mastery: SkillMastery,
    pub promoted: bool,
}

/// Owns every mastery record for one learner.
#[derive(Debug, Clone, Default)]
pub struct MasteryTracker {
    records: HashMap<SkillKey, SkillMastery>,
    policy: PromotionPolicy,
}

impl MasteryTracker {
    #[must_use]
    pub fn new(policy: PromotionPolicy) -> Self {
        Self {
            records: HashMap::new(),
            policy,
        }
    }

    #[must_use]
    pub fn from_records(records: HashMap<SkillKey, SkillMastery>, policy: PromotionPolicy) -> Self {
        Self { records, policy }
    }

    #[must_use]
    pub fn policy(&self) -> PromotionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: PromotionPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn get(&self, key: &SkillKey) -> Option<&SkillMastery> {
        self.records.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record one answer for `key`, creating the record on first use, and apply promotion.
    pub fn update(&mut self, key: &SkillKey, correct: bool) -> MasteryUpdate {
        let policy = self.policy;
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| SkillMastery::new(key.clone()));

        let was_above = record.meets_promotion_threshold();
        record.record(correct);
        let now_above = record.meets_promotion_threshold();

        let eligible = match policy {
            PromotionPolicy::EveryUpdate => now_above,
            PromotionPolicy::OnCrossing => now_above && !was_above,
        };
        let promoted = eligible && record.promote();

        MasteryUpdate {
            mastery: record.clone(),
            promoted,
        }
    }

    /// All records, ordered by skill key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SkillMastery> {
        let mut all: Vec<SkillMastery> = self.records.values().cloned().collect();
        all.sort_by(|a, b| a.skill_key.cmp(&b.skill_key));
        all
    }

    #[must_use]
    pub fn into_records(self) -> HashMap<SkillKey, SkillMastery> {
        self.records
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SubType;

    fn key() -> SkillKey {
        SubType::Addition.skill_key()
    }

    fn tracker_with(attempts: u32, successes: u32, level: u8, policy: PromotionPolicy) -> MasteryTracker {
        let record = SkillMastery::from_persisted(key(), attempts, successes, level).unwrap();
        MasteryTracker::from_records(HashMap::from([(key(), record)]), policy)
    }

    #[test]
    fn deserializing_checks_counters() {
        let ok: SkillMastery = serde_json::from_str(
            r#"{"skill_key":"arithmetic.addition","attempts":4,"successes":3,"level":2}"#,
        )
        .unwrap();
        assert_eq!(ok.successes(), 3);

        let too_many = serde_json::from_str::<SkillMastery>(
            r#"{"skill_key":"arithmetic.addition","attempts":2,"successes":3,"level":1}"#,
        );
        assert!(too_many.is_err());
        let level_zero = serde_json::from_str::<SkillMastery>(
            r#"{"skill_key":"arithmetic.addition","attempts":2,"successes":1,"level":0}"#,
        );
        assert!(level_zero.is_err());
    }

    #[test]
    fn first_update_creates_record() {
        let mut tracker = MasteryTracker::default();
        let update = tracker.update(&key(), true);
        assert_eq!(update.mastery.attempts(), 1);
        assert_eq!(update.mastery.successes(), 1);
        assert_eq!(update.mastery.level(), 1);
        assert!(!update.promoted);
    }

    #[test]
    fn tenth_correct_attempt_promotes() {
        // 8/9 before, 9/10 after: crosses both the attempt floor and the 0.8 rate.
        let mut tracker = tracker_with(9, 8, 1, PromotionPolicy::EveryUpdate);
        let update = tracker.update(&key(), true);
        assert_eq!(update.mastery.attempts(), 10);
        assert_eq!(update.mastery.successes(), 9);
        assert_eq!(update.mastery.level(), 2);
        assert!(update.promoted);
    }

    #[test]
    fn exactly_eighty_percent_promotes() {
        let mut tracker = tracker_with(9, 7, 1, PromotionPolicy::EveryUpdate);
        let update = tracker.update(&key(), true);
        assert_eq!(update.mastery.successes(), 8);
        assert!(update.promoted);
    }

    #[test]
    fn every_update_keeps_promoting_until_cap() {
        let mut tracker = tracker_with(20, 20, 1, PromotionPolicy::EveryUpdate);
        let levels: Vec<u8> = (0..6)
            .map(|_| tracker.update(&key(), true).mastery.level())
            .collect();
        assert_eq!(levels, vec![2, 3, 4, 5, 5, 5]);
    }

    #[test]
    fn on_crossing_promotes_once() {
        let mut tracker = tracker_with(9, 8, 1, PromotionPolicy::OnCrossing);
        assert!(tracker.update(&key(), true).promoted);
        assert!(!tracker.update(&key(), true).promoted);
        assert_eq!(tracker.get(&key()).unwrap().level(), 2);
    }

    #[test]
    fn level_never_drops_on_failure() {
        let mut tracker = tracker_with(10, 10, 4, PromotionPolicy::EveryUpdate);
        for _ in 0..10 {
            tracker.update(&key(), false);
        }
        let record = tracker.get(&key()).unwrap();
        assert_eq!(record.level(), 4);
        assert_eq!(record.attempts(), 20);
        assert_eq!(record.successes(), 10);
    }

    #[test]
    fn persisted_records_are_validated() {
        assert_eq!(
            SkillMastery::from_persisted(key(), 3, 4, 1),
            Err(MasteryError::SuccessesExceedAttempts {
                attempts: 3,
                successes: 4
            })
        );
        assert_eq!(
            SkillMastery::from_persisted(key(), 3, 2, 0),
            Err(MasteryError::LevelOutOfRange(0))
        );
        assert_eq!(
            SkillMastery::from_persisted(key(), 3, 2, 6),
            Err(MasteryError::LevelOutOfRange(6))
        );
    }

    #[test]
    fn snapshot_is_sorted() {
        let mut tracker = MasteryTracker::default();
        tracker.update(&SubType::Subtraction.skill_key(), true);
        tracker.update(&SubType::Addition.skill_key(), false);
        let keys: Vec<String> = tracker
            .snapshot()
            .iter()
            .map(|m| m.skill_key().to_string())
            .collect();
        assert_eq!(keys, vec!["arithmetic.addition", "arithmetic.subtraction"]);
    }
}
