use quiz_core::model::SavedProgress;

/// What the start screen shows about a resumable quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedProgressInfo {
    /// 1-based position of the question the user will land on.
    pub current_question: usize,
    pub total_questions: usize,
    pub score: u32,
}

impl SavedProgressInfo {
    #[must_use]
    pub fn from_saved(saved: &SavedProgress) -> Self {
        Self {
            current_question: saved.current_index + 1,
            total_questions: saved.total_questions(),
            score: saved.score,
        }
    }
}
