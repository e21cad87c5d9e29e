use quiz_core::model::{Question, QuizResult};

/// Which screen a front-end should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Start,
    Config,
    Quiz,
    Results,
    History,
}

/// Coarse lifecycle state of the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizPhase {
    NotStarted,
    InProgress,
    Completed,
}

/// Presentation-facing copy of the quiz state, published after every transition.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings,
/// the front-end formats as it likes.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSnapshot {
    pub screen: Screen,
    pub phase: QuizPhase,
    pub current_index: usize,
    pub total_questions: usize,
    pub score: u32,
    pub selected_index: Option<usize>,
    pub current_question: Option<Question>,
    /// Set once the quiz completes; kept until the next start, restart or abandon.
    pub result: Option<QuizResult>,
    pub available_questions: usize,
}

impl QuizSnapshot {
    /// Snapshot of an idle controller.
    #[must_use]
    pub fn idle(available_questions: usize) -> Self {
        Self {
            screen: Screen::Start,
            phase: QuizPhase::NotStarted,
            current_index: 0,
            total_questions: 0,
            score: 0,
            selected_index: None,
            current_question: None,
            result: None,
            available_questions,
        }
    }

    /// Whether the current selection is correct; `None` before an answer.
    #[must_use]
    pub fn is_selection_correct(&self) -> Option<bool> {
        let question = self.current_question.as_ref()?;
        self.selected_index.map(|index| question.is_correct(index))
    }
}
