use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies versioned schema migrations, recording each in `schema_migrations`.
///
/// Version 1 creates `skill_mastery` and `session_results` with their indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: mastery and session results.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS skill_mastery (
                    learner_id INTEGER NOT NULL,
                    skill_key TEXT NOT NULL,
                    attempts INTEGER NOT NULL CHECK (attempts >= 0),
                    successes INTEGER NOT NULL CHECK (successes >= 0 AND successes <= attempts),
                    level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 5),
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (learner_id, skill_key)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_results (
                    id INTEGER PRIMARY KEY,
                    learner_id INTEGER NOT NULL,
                    session_id TEXT NOT NULL UNIQUE,
                    domain TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    questions_asked INTEGER NOT NULL CHECK (questions_asked >= 0),
                    correct_count INTEGER NOT NULL
                        CHECK (correct_count >= 0 AND correct_count <= questions_asked),
                    longest_streak INTEGER NOT NULL CHECK (longest_streak >= 0),
                    final_difficulty TEXT NOT NULL,
                    mastery_json TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_results_learner_completed
                    ON session_results (learner_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
