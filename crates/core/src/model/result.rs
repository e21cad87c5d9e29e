use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuizResultId;
use crate::model::stats::PerformanceTier;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("a quiz result needs at least one question")]
    NoQuestions,

    #[error("score {score} exceeds total questions {total}")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// Summary of a completed quiz. Appended to history, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PersistedQuizResult")]
pub struct QuizResult {
    id: QuizResultId,
    completed_at: DateTime<Utc>,
    score: u32,
    total_questions: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedQuizResult {
    id: QuizResultId,
    completed_at: DateTime<Utc>,
    score: u32,
    total_questions: u32,
}

impl TryFrom<PersistedQuizResult> for QuizResult {
    type Error = QuizResultError;

    fn try_from(raw: PersistedQuizResult) -> Result<Self, Self::Error> {
        Self::from_persisted(raw.id, raw.completed_at, raw.score, raw.total_questions)
    }
}

impl QuizResult {
    /// Record a freshly completed quiz with a new id.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if `total_questions` is zero or `score` exceeds it.
    pub fn new(
        completed_at: DateTime<Utc>,
        score: u32,
        total_questions: u32,
    ) -> Result<Self, QuizResultError> {
        Self::from_persisted(
            QuizResultId::generate(),
            completed_at,
            score,
            total_questions,
        )
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if the counts are inconsistent.
    pub fn from_persisted(
        id: QuizResultId,
        completed_at: DateTime<Utc>,
        score: u32,
        total_questions: u32,
    ) -> Result<Self, QuizResultError> {
        if total_questions == 0 {
            return Err(QuizResultError::NoQuestions);
        }
        if score > total_questions {
            return Err(QuizResultError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        Ok(Self {
            id,
            completed_at,
            score,
            total_questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizResultId {
        self.id
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Score as a whole percentage, rounded half up.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        let score = u64::from(self.score);
        let total = u64::from(self.total_questions);
        // score <= total, so the quotient is at most 100.
        u32::try_from((200 * score + total) / (2 * total)).unwrap_or(100)
    }

    #[must_use]
    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::from_percentage(self.percentage())
    }
}
