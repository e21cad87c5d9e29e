use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{Question, QuizResult, SavedProgress};

use crate::error::SessionError;

//
// ─── TRANSITION OUTCOMES ───────────────────────────────────────────────────────
//

/// Outcome of `QuizSession::select_answer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// First answer for the current question; scored if correct.
    Recorded { index: usize, correct: bool },
    /// An answer was already chosen; nothing changed.
    AlreadyAnswered { selected: usize },
}

/// Outcome of `QuizSession::advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next,
    Finished,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz attempt over an ordered subset of questions.
///
/// Pure state: no persistence, no clock. `QuizService` wraps it with both.
#[derive(Clone, PartialEq)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    score: u32,
    selected: Option<usize>,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            questions,
            current: 0,
            score: 0,
            selected: None,
        })
    }

    /// Rebuild a session from persisted counters.
    ///
    /// Values are clamped so the session invariants hold even if the stored
    /// record disagrees with `questions`: the index is capped at the length,
    /// a selection that is not a valid choice is dropped, and the score is
    /// capped at one point per question reached.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn restore(
        questions: Vec<Question>,
        current: usize,
        score: u32,
        selected: Option<usize>,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(questions)?;
        session.current = current.min(session.questions.len());
        session.selected = selected.filter(|&index| {
            session
                .current_question()
                .is_some_and(|question| question.has_choice(index))
        });
        let reachable = session.current + usize::from(session.selected.is_some());
        session.score = score.min(u32::try_from(reachable).unwrap_or(u32::MAX));
        Ok(session)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Total number of questions in this session.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.questions.len()
    }

    /// Whether the current selection is correct; `None` before an answer.
    #[must_use]
    pub fn is_selection_correct(&self) -> Option<bool> {
        let question = self.current_question()?;
        self.selected.map(|index| question.is_correct(index))
    }

    /// Record an answer for the current question.
    ///
    /// Only the first selection per question counts; later calls report
    /// `Selection::AlreadyAnswered` and leave the score alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if every question has been passed, or
    /// `SessionError::InvalidChoice` if `index` is not one of the choices.
    pub fn select_answer(&mut self, index: usize) -> Result<Selection, SessionError> {
        let Some(question) = self.questions.get(self.current) else {
            return Err(SessionError::Completed);
        };
        if let Some(selected) = self.selected {
            return Ok(Selection::AlreadyAnswered { selected });
        }
        if !question.has_choice(index) {
            return Err(SessionError::InvalidChoice {
                index,
                len: question.choices().len(),
            });
        }

        let correct = question.is_correct(index);
        self.selected = Some(index);
        if correct {
            self.score += 1;
        }
        Ok(Selection::Recorded { index, correct })
    }

    /// Move past the answered question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if already finished, or
    /// `SessionError::NoSelection` if the current question is unanswered.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.selected.is_none() {
            return Err(SessionError::NoSelection);
        }

        self.selected = None;
        self.current += 1;
        if self.is_complete() {
            Ok(Advance::Finished)
        } else {
            Ok(Advance::Next)
        }
    }

    /// The persisted form of this session.
    #[must_use]
    pub fn to_saved_progress(&self) -> SavedProgress {
        SavedProgress {
            question_ids: self.questions.iter().map(|q| q.id().clone()).collect(),
            current_index: self.current,
            score: self.score,
            started: true,
            selected_index: self.selected,
        }
    }

    pub(crate) fn build_result(
        &self,
        completed_at: DateTime<Utc>,
    ) -> Result<QuizResult, SessionError> {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        Ok(QuizResult::new(completed_at, self.score, total)?)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
