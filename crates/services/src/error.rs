//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::model::{QuestionSetError, QuizResultError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors raised while loading the question dataset.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("failed to read question dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Dataset(#[from] QuestionSetError),
}

/// Errors emitted by quiz session services.
///
/// `Storage` is recoverable: the in-memory transition that triggered the
/// write has already been applied when it is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for quiz")]
    Empty,
    #[error("no quiz in progress")]
    NotStarted,
    #[error("a quiz is already in progress")]
    InProgress,
    #[error("quiz already completed")]
    Completed,
    #[error("choice {index} is out of range for a question with {len} choices")]
    InvalidChoice { index: usize, len: usize },
    #[error("an answer must be selected before advancing")]
    NoSelection,
    #[error(transparent)]
    Result(#[from] QuizResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
