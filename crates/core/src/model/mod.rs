mod ids;
mod progress;
mod question;
mod result;
mod stats;

pub use ids::{ParseIdError, QuestionId, QuizResultId};

pub use progress::SavedProgress;
pub use question::{Question, QuestionError, QuestionRecord, QuestionSetError, parse_question_set};
pub use result::{QuizResult, QuizResultError};
pub use stats::{HistoryStats, PerformanceTier};
