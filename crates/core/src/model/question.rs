use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Wire shape of a question in the bundled dataset.
///
/// `id` and `explanation` may be omitted; everything else must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub question: String,
    pub choices: Vec<String>,
    pub correct_answer_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionRecord {
    /// Validate the record into a domain `Question`, generating an id if absent.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two choices
    /// are given, or the correct index is out of range.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        let id = match self.id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => QuestionId::new(raw),
            _ => QuestionId::generate(),
        };
        Question::new(
            id,
            self.question,
            self.choices,
            self.correct_answer_index,
            self.explanation,
        )
    }
}

/// A multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Vec<String>,
    correct_index: usize,
    explanation: Option<String>,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, there are fewer than
    /// two choices, or `correct_index` does not point at a choice.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if choices.len() < 2 {
            return Err(QuestionError::TooFewChoices {
                id,
                len: choices.len(),
            });
        }
        if correct_index >= choices.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                id,
                index: correct_index,
                len: choices.len(),
            });
        }
        let explanation = explanation.filter(|text| !text.trim().is_empty());

        Ok(Self {
            id,
            prompt,
            choices,
            correct_index,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Returns true if `index` addresses one of this question's choices.
    #[must_use]
    pub fn has_choice(&self, index: usize) -> bool {
        index < self.choices.len()
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

/// Parse and validate a whole dataset.
///
/// # Errors
///
/// Returns `QuestionSetError` if the JSON is malformed, the set is empty, any
/// record is invalid, or two records share an id.
pub fn parse_question_set(json: &str) -> Result<Vec<Question>, QuestionSetError> {
    let records: Vec<QuestionRecord> =
        serde_json::from_str(json).map_err(|err| QuestionSetError::Malformed(err.to_string()))?;
    if records.is_empty() {
        return Err(QuestionSetError::Empty);
    }

    let mut seen = HashSet::with_capacity(records.len());
    let mut questions = Vec::with_capacity(records.len());
    for (position, record) in records.into_iter().enumerate() {
        let question = record
            .into_question()
            .map_err(|source| QuestionSetError::InvalidRecord { position, source })?;
        if !seen.insert(question.id().clone()) {
            return Err(QuestionSetError::DuplicateId {
                id: question.id().clone(),
            });
        }
        questions.push(question);
    }
    Ok(questions)
}

//
// ─── QUESTION ERRORS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} needs at least two choices, got {len}")]
    TooFewChoices { id: QuestionId, len: usize },

    #[error("question {id} marks choice {index} correct but has only {len} choices")]
    CorrectIndexOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionSetError {
    #[error("malformed question dataset: {0}")]
    Malformed(String),

    #[error("question dataset is empty")]
    Empty,

    #[error("invalid question at position {position}: {source}")]
    InvalidRecord {
        position: usize,
        #[source]
        source: QuestionError,
    },

    #[error("duplicate question id: {id}")]
    DuplicateId { id: QuestionId },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn question_requires_two_choices() {
        let err = Question::new(QuestionId::new("q1"), "Pick", choices(&["only"]), 0, None)
            .unwrap_err();
        assert!(matches!(err, QuestionError::TooFewChoices { len: 1, .. }));
    }

    #[test]
    fn question_rejects_out_of_range_answer() {
        let err = Question::new(QuestionId::new("q1"), "Pick", choices(&["a", "b"]), 2, None)
            .unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 2, len: 2, .. }
        ));
    }

    #[test]
    fn question_rejects_blank_prompt() {
        let err = Question::new(QuestionId::new("q1"), "  ", choices(&["a", "b"]), 0, None)
            .unwrap_err();
        assert!(matches!(err, QuestionError::EmptyPrompt { .. }));
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let q = Question::new(
            QuestionId::new("q1"),
            "Pick",
            choices(&["a", "b"]),
            1,
            Some(" ".into()),
        )
        .unwrap();
        assert_eq!(q.explanation(), None);
        assert!(q.is_correct(1));
        assert!(q.has_choice(1));
        assert!(!q.has_choice(2));
    }

    #[test]
    fn parse_set_reads_camel_case_fields_and_defaults_id() {
        let json = r#"[
            {"id": "a", "question": "One?", "choices": ["x", "y"], "correctAnswerIndex": 1,
             "explanation": "because"},
            {"question": "Two?", "choices": ["x", "y", "z"], "correctAnswerIndex": 0}
        ]"#;
        let set = parse_question_set(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].id(), &QuestionId::new("a"));
        assert_eq!(set[0].explanation(), Some("because"));
        assert!(!set[1].id().as_str().is_empty());
        assert_eq!(set[1].correct_index(), 0);
    }

    #[test]
    fn parse_set_rejects_duplicates() {
        let json = r#"[
            {"id": "a", "question": "One?", "choices": ["x", "y"], "correctAnswerIndex": 1},
            {"id": "a", "question": "Two?", "choices": ["x", "y"], "correctAnswerIndex": 0}
        ]"#;
        let err = parse_question_set(json).unwrap_err();
        assert!(matches!(err, QuestionSetError::DuplicateId { .. }));
    }

    #[test]
    fn parse_set_reports_invalid_position() {
        let json = r#"[
            {"id": "a", "question": "One?", "choices": ["x", "y"], "correctAnswerIndex": 1},
            {"id": "b", "question": "Two?", "choices": ["x", "y"], "correctAnswerIndex": 5}
        ]"#;
        let err = parse_question_set(json).unwrap_err();
        assert!(matches!(err, QuestionSetError::InvalidRecord { position: 1, .. }));
    }

    #[test]
    fn parse_set_rejects_empty_and_garbage() {
        assert_eq!(parse_question_set("[]").unwrap_err(), QuestionSetError::Empty);
        assert!(matches!(
            parse_question_set("{not json").unwrap_err(),
            QuestionSetError::Malformed(_)
        ));
    }
}
