use chrono::{DateTime, Utc};
use std::sync::Arc;

use tracing::{info, warn};

use quiz_core::model::{HistoryStats, PerformanceTier, QuizResult, QuizResultId};
use storage::repository::{HistoryRepository, InMemoryStore, Storage, StorageError};

use crate::error::SessionError;

/// Presentation-agnostic history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizHistoryItem {
    pub id: QuizResultId,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub tier: PerformanceTier,
}

impl QuizHistoryItem {
    #[must_use]
    pub fn from_result(result: &QuizResult) -> Self {
        Self {
            id: result.id(),
            completed_at: result.completed_at(),
            score: result.score(),
            total: result.total_questions(),
            percentage: result.percentage(),
            tier: result.tier(),
        }
    }
}

/// Read and append access to completed quiz results.
///
/// History is kept newest first. A stored list that no longer decodes is
/// treated as empty and replaced on the next append.
#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryRepository>) -> Self {
        Self { history }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Storage::over(Arc::new(InMemoryStore::new())).history)
    }

    /// Load all results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures other than an
    /// undecodable list.
    pub async fn results(&self) -> Result<Vec<QuizResult>, SessionError> {
        match self.history.load_history().await {
            Ok(results) => Ok(results),
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "discarding unreadable quiz history");
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load up to `limit` of the most recent results.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<QuizHistoryItem>, SessionError> {
        let results = self.results().await?;
        Ok(results
            .iter()
            .take(limit)
            .map(QuizHistoryItem::from_result)
            .collect())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn stats(&self) -> Result<HistoryStats, SessionError> {
        Ok(HistoryStats::from_results(&self.results().await?))
    }

    /// Insert `result` at its newest-first position and persist the whole list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the list cannot be loaded or saved.
    pub async fn record(&self, result: QuizResult) -> Result<(), SessionError> {
        let mut results = self.results().await?;
        let position = results
            .iter()
            .position(|existing| existing.completed_at() <= result.completed_at())
            .unwrap_or(results.len());
        info!(
            score = result.score(),
            total = result.total_questions(),
            percentage = result.percentage(),
            "recording quiz result"
        );
        results.insert(position, result);
        self.history.save_history(&results).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::time::fixed_now;
    use storage::repository::{KeyValueStore, keys};

    #[tokio::test]
    async fn record_keeps_newest_first() {
        let service = HistoryService::in_memory();
        let now = fixed_now();

        service
            .record(QuizResult::new(now, 1, 2).unwrap())
            .await
            .unwrap();
        service
            .record(QuizResult::new(now + Duration::hours(2), 2, 2).unwrap())
            .await
            .unwrap();
        service
            .record(QuizResult::new(now + Duration::hours(1), 0, 2).unwrap())
            .await
            .unwrap();

        let items = service.list_recent(10).await.unwrap();
        let scores: Vec<u32> = items.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![2, 0, 1]);
        assert_eq!(items[0].tier, PerformanceTier::Excellent);

        assert_eq!(service.list_recent(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stats_summarize_history() {
        let service = HistoryService::in_memory();
        let now = fixed_now();
        for (score, offset) in [(5_u32, 0_i64), (8, 1), (10, 2)] {
            service
                .record(QuizResult::new(now + Duration::minutes(offset), score, 10).unwrap())
                .await
                .unwrap();
        }
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.average_percentage, 76);
        assert_eq!(stats.best_percentage, 100);
    }

    #[tokio::test]
    async fn unreadable_history_is_reset() {
        let store = InMemoryStore::new();
        store.set(keys::HISTORY, "not json").await.unwrap();
        let service = HistoryService::new(Storage::over(Arc::new(store.clone())).history);

        assert!(service.results().await.unwrap().is_empty());

        service
            .record(QuizResult::new(fixed_now(), 1, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(service.results().await.unwrap().len(), 1);
    }
}
