use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use quiz_core::model::{Question, QuestionId, QuestionSetError, parse_question_set};

use crate::error::QuestionBankError;

const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

const BUILTIN_QUESTIONS: &str = r#"[
    {"id": "builtin-1", "question": "What is the capital of France?",
     "choices": ["London", "Berlin", "Paris", "Madrid"], "correctAnswerIndex": 2},
    {"id": "builtin-2", "question": "Which planet is known as the Red Planet?",
     "choices": ["Venus", "Mars", "Jupiter", "Saturn"], "correctAnswerIndex": 1}
]"#;

/// Where the loaded questions came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    Bundled,
    File(PathBuf),
    BuiltIn,
}

/// Read-only question set, loaded once at startup.
#[derive(Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
    source: BankSource,
    fallback_reason: Option<QuestionBankError>,
}

impl QuestionBank {
    /// Build a bank from already validated questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Dataset` if the list is empty or ids repeat.
    pub fn from_questions(
        questions: Vec<Question>,
        source: BankSource,
    ) -> Result<Self, QuestionBankError> {
        if questions.is_empty() {
            return Err(QuestionSetError::Empty.into());
        }
        let mut by_id = HashMap::with_capacity(questions.len());
        for (position, question) in questions.iter().enumerate() {
            if by_id.insert(question.id().clone(), position).is_some() {
                return Err(QuestionSetError::DuplicateId {
                    id: question.id().clone(),
                }
                .into());
            }
        }
        Ok(Self {
            questions,
            by_id,
            source,
            fallback_reason: None,
        })
    }

    /// Parse a JSON dataset.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Dataset` if the JSON is malformed or invalid.
    pub fn from_json_str(json: &str, source: BankSource) -> Result<Self, QuestionBankError> {
        let questions = parse_question_set(json)?;
        Self::from_questions(questions, source)
    }

    /// Read and parse a dataset file.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Io` if the file cannot be read, or
    /// `QuestionBankError::Dataset` if its content is invalid.
    pub fn load_from_path(path: &Path) -> Result<Self, QuestionBankError> {
        let json = std::fs::read_to_string(path).map_err(|source| QuestionBankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, BankSource::File(path.to_path_buf()))
    }

    /// The dataset compiled into this crate, or the built-in pair if it fails to parse.
    #[must_use]
    pub fn bundled() -> Self {
        Self::from_json_str(BUNDLED_QUESTIONS, BankSource::Bundled)
            .unwrap_or_else(Self::fallback)
    }

    /// Load from `path` when given, otherwise the bundled dataset. Never fails:
    /// any load error yields the built-in default set and is kept as
    /// `fallback_reason`.
    #[must_use]
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let bank = match path {
            Some(path) => Self::load_from_path(path).unwrap_or_else(Self::fallback),
            None => Self::bundled(),
        };
        info!(
            count = bank.count(),
            source = ?bank.source,
            "question bank loaded"
        );
        bank
    }

    /// The two-question set used when no dataset can be loaded.
    #[must_use]
    pub fn builtin_default() -> Self {
        let questions = parse_question_set(BUILTIN_QUESTIONS).unwrap_or_default();
        let by_id = questions
            .iter()
            .enumerate()
            .map(|(position, q)| (q.id().clone(), position))
            .collect();
        Self {
            questions,
            by_id,
            source: BankSource::BuiltIn,
            fallback_reason: None,
        }
    }

    fn fallback(reason: QuestionBankError) -> Self {
        warn!(error = %reason, "question dataset unavailable, using built-in questions");
        let mut bank = Self::builtin_default();
        bank.fallback_reason = Some(reason);
        bank
    }

    #[must_use]
    pub fn all_questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.by_id.get(id).map(|&position| &self.questions[position])
    }

    #[must_use]
    pub fn source(&self) -> &BankSource {
        &self.source
    }

    /// The load error that forced the built-in set, if any.
    #[must_use]
    pub fn fallback_reason(&self) -> Option<&QuestionBankError> {
        self.fallback_reason.as_ref()
    }
}
