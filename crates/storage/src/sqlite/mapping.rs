use quiz_core::mastery::SkillMastery;
use quiz_core::model::{LearnerId, SkillKey};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn db<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn learner_to_i64(learner: LearnerId) -> Result<i64, StorageError> {
    id_i64("learner_id", learner.value())
}

pub(crate) fn learner_from_i64(v: i64) -> Result<LearnerId, StorageError> {
    u64::try_from(v)
        .map(LearnerId::new)
        .map_err(|_| StorageError::Serialization("learner_id sign overflow".into()))
}

pub(crate) fn mastery_from_columns(
    skill_key: &str,
    attempts: i64,
    successes: i64,
    level: i64,
) -> Result<SkillMastery, StorageError> {
    let key = SkillKey::new(skill_key).map_err(ser)?;
    let level = u8::try_from(level)
        .map_err(|_| StorageError::Serialization(format!("invalid level: {level}")))?;
    SkillMastery::from_persisted(
        key,
        u32_from_i64("attempts", attempts)?,
        u32_from_i64("successes", successes)?,
        level,
    )
    .map_err(ser)
}

/// JSON shape of one record in `session_results.mastery_json`.
#[derive(Debug, Serialize, Deserialize)]
struct MasteryJson {
    skill_key: String,
    attempts: u32,
    successes: u32,
    level: u8,
}

pub(crate) fn mastery_to_json(mastery: &[SkillMastery]) -> Result<String, StorageError> {
    let rows: Vec<MasteryJson> = mastery
        .iter()
        .map(|m| MasteryJson {
            skill_key: m.skill_key().to_string(),
            attempts: m.attempts(),
            successes: m.successes(),
            level: m.level(),
        })
        .collect();
    serde_json::to_string(&rows).map_err(ser)
}

pub(crate) fn mastery_from_json(json: &str) -> Result<Vec<SkillMastery>, StorageError> {
    let rows: Vec<MasteryJson> = serde_json::from_str(json).map_err(ser)?;
    rows.into_iter()
        .map(|row| {
            let key = SkillKey::new(row.skill_key).map_err(ser)?;
            SkillMastery::from_persisted(key, row.attempts, row.successes, row.level).map_err(ser)
        })
        .collect()
}
