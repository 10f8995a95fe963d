use async_trait::async_trait;
use quiz_core::mastery::SkillMastery;
use quiz_core::model::{LearnerId, SessionResult, SkillKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored session result with its row id and owner.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResultRow {
    pub id: i64,
    pub learner: LearnerId,
    pub result: SessionResult,
}

impl SessionResultRow {
    #[must_use]
    pub fn new(id: i64, learner: LearnerId, result: SessionResult) -> Self {
        Self {
            id,
            learner,
            result,
        }
    }
}

/// Repository contract for per-learner skill mastery.
#[async_trait]
pub trait MasteryRepository: Send + Sync {
    /// Load every mastery record for a learner. A learner with no records yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read or fail validation.
    async fn load_mastery(
        &self,
        learner: LearnerId,
    ) -> Result<HashMap<SkillKey, SkillMastery>, StorageError>;

    /// Insert or update the given records. Stored levels never decrease.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be stored.
    async fn save_mastery(
        &self,
        learner: LearnerId,
        mastery: &[SkillMastery],
    ) -> Result<(), StorageError>;
}

/// Repository contract for finished session results.
#[async_trait]
pub trait SessionResultRepository: Send + Sync {
    /// Append a result and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the session was already stored, or other storage errors.
    async fn append_result(
        &self,
        learner: LearnerId,
        result: &SessionResult,
    ) -> Result<i64, StorageError>;

    /// Fetch a result by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<SessionResultRow, StorageError>;

    /// Most recent results for a learner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the results cannot be read.
    async fn list_results(
        &self,
        learner: LearnerId,
        limit: u32,
    ) -> Result<Vec<SessionResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    mastery: Arc<Mutex<HashMap<(LearnerId, SkillKey), SkillMastery>>>,
    results: Arc<Mutex<Vec<SessionResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl MasteryRepository for InMemoryRepository {
    async fn load_mastery(
        &self,
        learner: LearnerId,
    ) -> Result<HashMap<SkillKey, SkillMastery>, StorageError> {
        let guard = self.mastery.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|((owner, _), _)| *owner == learner)
            .map(|((_, key), record)| (key.clone(), record.clone()))
            .collect())
    }

    async fn save_mastery(
        &self,
        learner: LearnerId,
        mastery: &[SkillMastery],
    ) -> Result<(), StorageError> {
        let mut guard = self.mastery.lock().map_err(poisoned)?;
        for record in mastery {
            let key = (learner, record.skill_key().clone());
            // Counters only move forward; a stale snapshot keeps the stored ones.
            let (attempts, successes, level) = match guard.get(&key) {
                Some(existing) if existing.attempts() > record.attempts() => (
                    existing.attempts(),
                    existing.successes(),
                    existing.level().max(record.level()),
                ),
                Some(existing) => (
                    record.attempts(),
                    record.successes(),
                    existing.level().max(record.level()),
                ),
                None => (record.attempts(), record.successes(), record.level()),
            };
            let merged = SkillMastery::from_persisted(
                record.skill_key().clone(),
                attempts,
                successes,
                level,
            )
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
            guard.insert(key, merged);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        learner: LearnerId,
        result: &SessionResult,
    ) -> Result<i64, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        if guard
            .iter()
            .any(|row| row.result.session_id() == result.session_id())
        {
            return Err(StorageError::Conflict);
        }
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("result id overflow".into()))?
            + 1;
        guard.push(SessionResultRow::new(id, learner, result.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<SessionResultRow, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(
        &self,
        learner: LearnerId,
        limit: u32,
    ) -> Result<Vec<SessionResultRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let mut rows: Vec<SessionResultRow> = guard
            .iter()
            .filter(|row| row.learner == learner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects so services can swap backends.
#[derive(Clone)]
pub struct Storage {
    pub mastery: Arc<dyn MasteryRepository>,
    pub results: Arc<dyn SessionResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let mastery: Arc<dyn MasteryRepository> = Arc::new(repo.clone());
        let results: Arc<dyn SessionResultRepository> = Arc::new(repo);
        Self { mastery, results }
    }
}
