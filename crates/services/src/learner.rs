use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use quiz_core::Clock;
use quiz_core::error::ConfigError;
use quiz_core::generator::ProblemGenerator;
use quiz_core::mastery::SkillMastery;
use quiz_core::model::{EngineSettings, LearnerId, SessionResult, SkillKey};
use storage::repository::{
    MasteryRepository, SessionResultRepository, SessionResultRow, Storage, StorageError,
};

use crate::engine::AdaptiveSessionEngine;
use crate::error::EngineError;

/// A write that failed and is held for [`LearnerService::flush_pending`].
#[derive(Debug, Clone)]
enum PendingWrite {
    Mastery {
        learner: LearnerId,
        records: Vec<SkillMastery>,
    },
    Result {
        learner: LearnerId,
        result: SessionResult,
    },
}

/// A completed session handed back by [`LearnerService::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSession {
    pub result: SessionResult,
    /// Row id of the stored result, `None` if the write was queued for retry.
    pub result_id: Option<i64>,
    /// Whether mastery and result were both written.
    pub persisted: bool,
}

/// Connects engines to persistence: loads mastery before a session and saves it after.
///
/// Storage failures never interrupt play. Reads fall back to empty records and failed
/// writes are kept in memory until [`LearnerService::flush_pending`] succeeds.
pub struct LearnerService {
    clock: Clock,
    mastery: Arc<dyn MasteryRepository>,
    results: Arc<dyn SessionResultRepository>,
    pending: Mutex<Vec<PendingWrite>>,
}

impl LearnerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        mastery: Arc<dyn MasteryRepository>,
        results: Arc<dyn SessionResultRepository>,
    ) -> Self {
        Self {
            clock,
            mastery,
            results,
            pending: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.mastery),
            Arc::clone(&storage.results),
        )
    }

    /// Mastery for `learner`: persisted records with any queued, unsaved snapshot on top.
    ///
    /// If storage is unavailable only the queued records are returned, or none.
    pub async fn load_mastery(&self, learner: LearnerId) -> HashMap<SkillKey, SkillMastery> {
        let mut records = match self.mastery.load_mastery(learner).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%learner, error = %err, "mastery unavailable, starting from defaults");
                HashMap::new()
            }
        };

        for record in self.queued_mastery(learner) {
            let newer = records
                .get(record.skill_key())
                .is_none_or(|stored| record.attempts() >= stored.attempts());
            if newer {
                records.insert(record.skill_key().clone(), record);
            }
        }
        records
    }

    /// Build an engine for `learner` with their persisted mastery and this service's clock.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the generator's catalogue does not fit `settings`.
    pub async fn open_engine<G: ProblemGenerator>(
        &self,
        learner: LearnerId,
        generator: G,
        settings: EngineSettings,
    ) -> Result<AdaptiveSessionEngine<G>, ConfigError> {
        let records = self.load_mastery(learner).await;
        Ok(AdaptiveSessionEngine::new(generator, settings)?
            .with_clock(self.clock)
            .with_mastery(records))
    }

    /// End the engine's completed session and persist mastery and the result.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` only if the session cannot be ended. Storage failures are
    /// queued and reported through `FinishedSession::persisted`.
    pub async fn finish<G: ProblemGenerator>(
        &self,
        learner: LearnerId,
        engine: &mut AdaptiveSessionEngine<G>,
    ) -> Result<FinishedSession, EngineError> {
        let result = engine.end()?;
        let records = engine.mastery_snapshot();
        // The engine started from any queued snapshot, so this one replaces it.
        self.drop_queued_mastery(learner);

        let mastery_saved = match self.mastery.save_mastery(learner, &records).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%learner, error = %err, "mastery save failed, queued for retry");
                self.enqueue(PendingWrite::Mastery { learner, records });
                false
            }
        };

        let result_id = match self.results.append_result(learner, &result).await {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(%learner, error = %err, "session result save failed, queued for retry");
                self.enqueue(PendingWrite::Result {
                    learner,
                    result: result.clone(),
                });
                None
            }
        };

        Ok(FinishedSession {
            persisted: mastery_saved && result_id.is_some(),
            result,
            result_id,
        })
    }

    /// Retry queued writes in order. Writes that fail again stay queued.
    ///
    /// # Errors
    ///
    /// Returns the last `StorageError` if any write is still pending afterwards.
    pub async fn flush_pending(&self) -> Result<usize, StorageError> {
        let queued = match self.pending.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(err) => return Err(StorageError::Connection(err.to_string())),
        };

        let mut written = 0;
        let mut failed = Vec::new();
        let mut last_error = None;
        for write in queued {
            match self.write(&write).await {
                Ok(()) => written += 1,
                Err(err) => {
                    last_error = Some(err);
                    failed.push(write);
                }
            }
        }

        if !failed.is_empty() {
            warn!(remaining = failed.len(), "pending writes still failing");
            // Keep retry order: earlier failures go before anything queued meanwhile.
            if let Ok(mut guard) = self.pending.lock() {
                failed.append(&mut *guard);
                *guard = failed;
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => {
                if written > 0 {
                    info!(written, "pending writes flushed");
                }
                Ok(written)
            }
        }
    }

    /// Number of writes waiting for [`LearnerService::flush_pending`].
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending.lock().map_or(0, |guard| guard.len())
    }

    /// Most recent stored results for `learner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the results cannot be read.
    pub async fn recent_results(
        &self,
        learner: LearnerId,
        limit: u32,
    ) -> Result<Vec<SessionResultRow>, StorageError> {
        self.results.list_results(learner, limit).await
    }

    async fn write(&self, write: &PendingWrite) -> Result<(), StorageError> {
        match write {
            PendingWrite::Mastery { learner, records } => {
                self.mastery.save_mastery(*learner, records).await
            }
            PendingWrite::Result { learner, result } => {
                match self.results.append_result(*learner, result).await {
                    // Stored by an earlier attempt that reported failure.
                    Ok(_) | Err(StorageError::Conflict) => Ok(()),
                    Err(err) => Err(err),
                }
            }
        }
    }

    /// Queued mastery records for `learner`, oldest snapshot first.
    fn queued_mastery(&self, learner: LearnerId) -> Vec<SkillMastery> {
        let Ok(guard) = self.pending.lock() else {
            return Vec::new();
        };
        guard
            .iter()
            .filter_map(|write| match write {
                PendingWrite::Mastery {
                    learner: queued,
                    records,
                } if *queued == learner => Some(records.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn drop_queued_mastery(&self, learner: LearnerId) {
        if let Ok(mut guard) = self.pending.lock() {
            guard.retain(|write| {
                !matches!(write, PendingWrite::Mastery { learner: queued, .. } if *queued == learner)
            });
        }
    }

    fn enqueue(&self, write: PendingWrite) {
        match self.pending.lock() {
            Ok(mut guard) => guard.push(write),
            Err(err) => warn!(error = %err, "pending write queue poisoned, write dropped"),
        }
    }
}
