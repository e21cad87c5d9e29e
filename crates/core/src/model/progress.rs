use crate::model::ids::QuestionId;

/// Persisted shape of an in-flight quiz.
///
/// Holds question ids rather than questions so a resumed session is rebuilt
/// against whatever dataset is loaded at the time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SavedProgress {
    pub question_ids: Vec<QuestionId>,
    pub current_index: usize,
    pub score: u32,
    pub started: bool,
    pub selected_index: Option<usize>,
}

impl SavedProgress {
    /// Returns true when the record describes a started quiz that still has
    /// unanswered questions.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        self.started && self.current_index < self.question_ids.len()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.question_ids.len()
    }
}
