use std::path::Path;
use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::question_bank::QuestionBank;
use crate::sessions::{HistoryService, QuizService};

/// Assembles app-facing services around one question bank and one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    bank: Arc<QuestionBank>,
    storage: Storage,
    history: Arc<HistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// `questions_path` overrides the bundled dataset; load failures fall back
    /// to the built-in questions rather than failing startup.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        questions_path: Option<&Path>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let bank = Arc::new(QuestionBank::load_or_default(questions_path));
        Ok(Self::from_parts(clock, bank, storage))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, bank: QuestionBank) -> Self {
        Self::from_parts(clock, Arc::new(bank), Storage::in_memory())
    }

    #[must_use]
    pub fn from_parts(clock: Clock, bank: Arc<QuestionBank>, storage: Storage) -> Self {
        let history = Arc::new(HistoryService::new(Arc::clone(&storage.history)));
        Self {
            clock,
            bank,
            storage,
            history,
        }
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    /// Build the quiz controller. The caller owns it and is its only mutator.
    #[must_use]
    pub fn quiz_service(&self) -> QuizService {
        QuizService::new(
            self.clock,
            Arc::clone(&self.bank),
            Arc::clone(&self.storage.progress),
            Arc::clone(&self.storage.history),
        )
    }
}
