#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod question_bank;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuestionBankError, SessionError};
pub use question_bank::{BankSource, QuestionBank};

pub use sessions::{
    Advance, AnswerResult, HistoryService, QuizHistoryItem, QuizPhase, QuizPlan, QuizPlanner,
    QuizService, QuizSession, QuizSnapshot, SavedProgressInfo, Screen, Selection,
};
