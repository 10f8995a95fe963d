use quiz_core::model::{Difficulty, Domain, LearnerId, SessionId, SessionResult};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    db, learner_from_i64, learner_to_i64, mastery_from_json, mastery_to_json, ser, u32_from_i64,
};
use crate::repository::{SessionResultRepository, SessionResultRow, StorageError};

fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let learner = learner_from_i64(row.try_get::<i64, _>("learner_id").map_err(ser)?)?;
    let session_id: SessionId = row
        .try_get::<String, _>("session_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let domain: Domain = row
        .try_get::<String, _>("domain")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let final_difficulty: Difficulty = row
        .try_get::<String, _>("final_difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let questions_asked = u32_from_i64(
        "questions_asked",
        row.try_get::<i64, _>("questions_asked").map_err(ser)?,
    )?;
    let correct_count = u32_from_i64(
        "correct_count",
        row.try_get::<i64, _>("correct_count").map_err(ser)?,
    )?;
    let longest_streak = u32_from_i64(
        "longest_streak",
        row.try_get::<i64, _>("longest_streak").map_err(ser)?,
    )?;
    let mastery = mastery_from_json(&row.try_get::<String, _>("mastery_json").map_err(ser)?)?;

    let result = SessionResult::from_persisted(
        session_id,
        domain,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        questions_asked,
        correct_count,
        longest_streak,
        final_difficulty,
        mastery,
    )
    .map_err(ser)?;

    Ok(SessionResultRow::new(id, learner, result))
}

#[async_trait::async_trait]
impl SessionResultRepository for SqliteRepository {
    async fn append_result(
        &self,
        learner: LearnerId,
        result: &SessionResult,
    ) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO session_results (
                    learner_id, session_id, domain, started_at, completed_at,
                    questions_asked, correct_count, longest_streak,
                    final_difficulty, mastery_json
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(learner_to_i64(learner)?)
        .bind(result.session_id().to_string())
        .bind(result.domain().key())
        .bind(result.started_at())
        .bind(result.completed_at())
        .bind(i64::from(result.questions_asked()))
        .bind(i64::from(result.correct_count()))
        .bind(i64::from(result.longest_streak()))
        .bind(result.final_difficulty().key())
        .bind(mastery_to_json(result.mastery())?)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref d) if d.is_unique_violation() => StorageError::Conflict,
            other => db(other),
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<SessionResultRow, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, learner_id, session_id, domain, started_at, completed_at,
                    questions_asked, correct_count, longest_streak,
                    final_difficulty, mastery_json
                FROM session_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results(
        &self,
        learner: LearnerId,
        limit: u32,
    ) -> Result<Vec<SessionResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, learner_id, session_id, domain, started_at, completed_at,
                    questions_asked, correct_count, longest_streak,
                    final_difficulty, mastery_json
                FROM session_results
                WHERE learner_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(learner_to_i64(learner)?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_result_row).collect()
    }
}
