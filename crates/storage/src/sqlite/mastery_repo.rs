use chrono::Utc;
use quiz_core::mastery::SkillMastery;
use quiz_core::model::{LearnerId, SkillKey};
use sqlx::Row;
use std::collections::HashMap;

use super::SqliteRepository;
use super::mapping::{db, learner_to_i64, mastery_from_columns, ser};
use crate::repository::{MasteryRepository, StorageError};

#[async_trait::async_trait]
impl MasteryRepository for SqliteRepository {
    async fn load_mastery(
        &self,
        learner: LearnerId,
    ) -> Result<HashMap<SkillKey, SkillMastery>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT skill_key, attempts, successes, level
                FROM skill_mastery
                WHERE learner_id = ?1
            ",
        )
        .bind(learner_to_i64(learner)?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("skill_key").map_err(ser)?;
            let record = mastery_from_columns(
                &key,
                row.try_get("attempts").map_err(ser)?,
                row.try_get("successes").map_err(ser)?,
                row.try_get("level").map_err(ser)?,
            )?;
            out.insert(record.skill_key().clone(), record);
        }
        Ok(out)
    }

    async fn save_mastery(
        &self,
        learner: LearnerId,
        mastery: &[SkillMastery],
    ) -> Result<(), StorageError> {
        let learner_id = learner_to_i64(learner)?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db)?;

        for record in mastery {
            sqlx::query(
                r"
                    INSERT INTO skill_mastery (
                        learner_id, skill_key, attempts, successes, level, updated_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(learner_id, skill_key) DO UPDATE SET
                        attempts = MAX(skill_mastery.attempts, excluded.attempts),
                        successes = CASE
                            WHEN excluded.attempts >= skill_mastery.attempts
                                THEN excluded.successes
                            ELSE skill_mastery.successes
                        END,
                        level = MAX(skill_mastery.level, excluded.level),
                        updated_at = excluded.updated_at
                ",
            )
            .bind(learner_id)
            .bind(record.skill_key().as_str())
            .bind(i64::from(record.attempts()))
            .bind(i64::from(record.successes()))
            .bind(i64::from(record.level()))
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }
}
