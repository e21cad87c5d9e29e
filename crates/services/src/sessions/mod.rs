mod history;
mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the quiz session subsystem.
pub use crate::error::SessionError;
pub use history::{HistoryService, QuizHistoryItem};
pub use plan::{MIN_QUIZ_LENGTH, QuizPlan, QuizPlanner};
pub use progress::SavedProgressInfo;
pub use service::{Advance, QuizSession, Selection};
pub use view::{QuizPhase, QuizSnapshot, Screen};
pub use workflow::{AnswerResult, QuizService};
