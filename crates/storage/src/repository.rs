use async_trait::async_trait;
use quiz_core::model::{QuestionId, QuizResult, SavedProgress};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Keys under which quiz state is persisted.
pub mod keys {
    pub const QUESTION_IDS: &str = "savedQuestionIDs";
    pub const CURRENT_INDEX: &str = "savedCurrentIndex";
    pub const SCORE: &str = "savedScore";
    pub const QUIZ_STARTED: &str = "savedQuizStarted";
    pub const SELECTED_INDEX: &str = "savedSelectedIndex";
    pub const HISTORY: &str = "quizHistory";

    /// Every key belonging to the in-progress session record.
    pub const PROGRESS: [&str; 5] = [
        QUESTION_IDS,
        CURRENT_INDEX,
        SCORE,
        QUIZ_STARTED,
        SELECTED_INDEX,
    ];
}

/// Raw string key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Repository contract for the single in-progress session record.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the saved session, if a started one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a stored value cannot be decoded,
    /// or other storage errors.
    async fn load_progress(&self) -> Result<Option<SavedProgress>, StorageError>;

    /// Overwrite the saved session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, progress: &SavedProgress) -> Result<(), StorageError>;

    /// Delete the saved session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be removed.
    async fn clear_progress(&self) -> Result<(), StorageError>;
}

/// Repository contract for completed quiz results, stored newest first.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored list cannot be decoded,
    /// or other storage errors.
    async fn load_history(&self) -> Result<Vec<QuizResult>, StorageError>;

    /// Replace the whole history list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be stored.
    async fn save_history(&self, history: &[QuizResult]) -> Result<(), StorageError>;
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
}

/// Typed progress and history repositories layered over any `KeyValueStore`.
///
/// Each field is a JSON value under its own key.
#[derive(Clone)]
pub struct KeyValueRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KeyValueRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + Sync + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = encode(key, value)?;
        self.store.set(key, &raw).await
    }
}

#[async_trait]
impl ProgressRepository for KeyValueRepository {
    async fn load_progress(&self) -> Result<Option<SavedProgress>, StorageError> {
        let started: bool = self.get_json(keys::QUIZ_STARTED).await?.unwrap_or(false);
        if !started {
            return Ok(None);
        }
        let Some(question_ids) = self.get_json::<Vec<QuestionId>>(keys::QUESTION_IDS).await?
        else {
            return Ok(None);
        };
        let current_index = self.get_json(keys::CURRENT_INDEX).await?.unwrap_or(0);
        let score = self.get_json(keys::SCORE).await?.unwrap_or(0);
        let selected_index = self.get_json(keys::SELECTED_INDEX).await?;

        Ok(Some(SavedProgress {
            question_ids,
            current_index,
            score,
            started,
            selected_index,
        }))
    }

    async fn save_progress(&self, progress: &SavedProgress) -> Result<(), StorageError> {
        self.set_json(keys::QUESTION_IDS, &progress.question_ids)
            .await?;
        self.set_json(keys::CURRENT_INDEX, &progress.current_index)
            .await?;
        self.set_json(keys::SCORE, &progress.score).await?;
        self.set_json(keys::QUIZ_STARTED, &progress.started).await?;
        match progress.selected_index {
            Some(index) => self.set_json(keys::SELECTED_INDEX, &index).await,
            None => self.store.remove(keys::SELECTED_INDEX).await,
        }
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        for key in keys::PROGRESS {
            self.store.remove(key).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for KeyValueRepository {
    async fn load_history(&self) -> Result<Vec<QuizResult>, StorageError> {
        Ok(self.get_json(keys::HISTORY).await?.unwrap_or_default())
    }

    async fn save_history(&self, history: &[QuizResult]) -> Result<(), StorageError> {
        self.set_json(keys::HISTORY, history).await
    }
}

/// Simple in-memory key-value store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates progress and history repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub history: Arc<dyn HistoryRepository>,
}

impl Storage {
    /// Build typed repositories over an arbitrary key-value backend.
    #[must_use]
    pub fn over(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = KeyValueRepository::new(store);
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let history: Arc<dyn HistoryRepository> = Arc::new(repo);
        Self { progress, history }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::over(Arc::new(InMemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn repo_with_store() -> (KeyValueRepository, InMemoryStore) {
        let store = InMemoryStore::new();
        (KeyValueRepository::new(Arc::new(store.clone())), store)
    }

    fn progress() -> SavedProgress {
        SavedProgress {
            question_ids: vec![QuestionId::new("b"), QuestionId::new("a")],
            current_index: 1,
            score: 1,
            started: true,
            selected_index: Some(2),
        }
    }

    #[tokio::test]
    async fn progress_round_trips_through_named_keys() {
        let (repo, store) = repo_with_store();
        repo.save_progress(&progress()).await.unwrap();

        assert_eq!(
            store.get(keys::QUESTION_IDS).await.unwrap().as_deref(),
            Some(r#"["b","a"]"#)
        );
        assert_eq!(store.get(keys::QUIZ_STARTED).await.unwrap().as_deref(), Some("true"));

        let loaded = repo.load_progress().await.unwrap();
        assert_eq!(loaded, Some(progress()));
    }

    #[tokio::test]
    async fn clearing_progress_removes_every_key() {
        let (repo, store) = repo_with_store();
        repo.save_progress(&progress()).await.unwrap();
        repo.clear_progress().await.unwrap();

        for key in keys::PROGRESS {
            assert!(store.get(key).await.unwrap().is_none(), "{key} survived");
        }
        assert_eq!(repo.load_progress().await.unwrap(), None);
    }

    #[tokio::test]
    async fn saving_without_selection_drops_stale_selection() {
        let (repo, store) = repo_with_store();
        repo.save_progress(&progress()).await.unwrap();

        let mut next = progress();
        next.selected_index = None;
        next.current_index = 2;
        repo.save_progress(&next).await.unwrap();

        assert!(store.get(keys::SELECTED_INDEX).await.unwrap().is_none());
        assert_eq!(repo.load_progress().await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn unstarted_flag_hides_progress() {
        let (repo, store) = repo_with_store();
        store.set(keys::QUESTION_IDS, r#"["a"]"#).await.unwrap();
        assert_eq!(repo.load_progress().await.unwrap(), None);

        store.set(keys::QUIZ_STARTED, "false").await.unwrap();
        assert_eq!(repo.load_progress().await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_counters_default_to_zero() {
        let (repo, store) = repo_with_store();
        store.set(keys::QUIZ_STARTED, "true").await.unwrap();
        store.set(keys::QUESTION_IDS, r#"["a","b"]"#).await.unwrap();

        let loaded = repo.load_progress().await.unwrap().unwrap();
        assert_eq!(loaded.current_index, 0);
        assert_eq!(loaded.score, 0);
        assert_eq!(loaded.selected_index, None);
    }

    #[tokio::test]
    async fn corrupt_value_is_a_serialization_error() {
        let (repo, store) = repo_with_store();
        store.set(keys::HISTORY, "{oops").await.unwrap();
        let err = repo.load_history().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn history_round_trips_in_order() {
        let storage = Storage::in_memory();
        assert!(storage.history.load_history().await.unwrap().is_empty());

        let newer = QuizResult::new(fixed_now() + chrono::Duration::hours(1), 3, 4).unwrap();
        let older = QuizResult::new(fixed_now(), 1, 4).unwrap();
        storage
            .history
            .save_history(&[newer.clone(), older.clone()])
            .await
            .unwrap();

        let loaded = storage.history.load_history().await.unwrap();
        assert_eq!(loaded, vec![newer, older]);
    }
}
