use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use quiz_core::model::{Question, QuizResult, SavedProgress};
use storage::repository::{HistoryRepository, ProgressRepository, StorageError};

use super::history::HistoryService;
use super::plan::QuizPlanner;
use super::progress::SavedProgressInfo;
use super::service::{Advance, QuizSession, Selection};
use super::view::{QuizPhase, QuizSnapshot, Screen};
use crate::error::SessionError;
use crate::{Clock, QuestionBank};

/// Result of selecting an answer for the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    pub selection: Selection,
    pub snapshot: QuizSnapshot,
}

enum QuizState {
    Idle,
    Configuring,
    Active(QuizSession),
    Finished {
        session: QuizSession,
        result: QuizResult,
    },
}

/// Owns the quiz session and writes every transition through to storage.
///
/// There is exactly one mutator: the application controller holding this
/// value. Every transition updates the in-memory state first, publishes a
/// snapshot to subscribers, then persists. A persistence failure is returned
/// as `SessionError::Storage` but does not roll the transition back.
pub struct QuizService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    progress: Arc<dyn ProgressRepository>,
    history: HistoryService,
    rng: StdRng,
    state: QuizState,
    showing_history: bool,
    notifier: watch::Sender<QuizSnapshot>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        progress: Arc<dyn ProgressRepository>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        let (notifier, _) = watch::channel(QuizSnapshot::idle(bank.count()));
        Self {
            clock,
            bank,
            progress,
            history: HistoryService::new(history),
            rng: StdRng::from_rng(&mut rand::rng()),
            state: QuizState::Idle,
            showing_history: false,
            notifier,
        }
    }

    /// Use a deterministic shuffle.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    /// Allowed `(min, max)` quiz lengths for the configuration step.
    #[must_use]
    pub fn length_bounds(&self) -> (usize, usize) {
        QuizPlanner::new(self.bank.all_questions()).bounds()
    }

    /// Receive a fresh snapshot after every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QuizSnapshot> {
        self.notifier.subscribe()
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        match &self.state {
            QuizState::Active(session) | QuizState::Finished { session, .. } => Some(session),
            QuizState::Idle | QuizState::Configuring => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match &self.state {
            QuizState::Active(session) => session.current_question(),
            _ => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        match self.state {
            QuizState::Idle | QuizState::Configuring => QuizPhase::NotStarted,
            QuizState::Active(_) => QuizPhase::InProgress,
            QuizState::Finished { .. } => QuizPhase::Completed,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        if self.showing_history {
            return Screen::History;
        }
        match self.state {
            QuizState::Idle => Screen::Start,
            QuizState::Configuring => Screen::Config,
            QuizState::Active(_) => Screen::Quiz,
            QuizState::Finished { .. } => Screen::Results,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        let mut snapshot = QuizSnapshot::idle(self.bank.count());
        snapshot.screen = self.screen();
        snapshot.phase = self.phase();
        if let Some(session) = self.session() {
            snapshot.current_index = session.current_index();
            snapshot.total_questions = session.total_questions();
            snapshot.score = session.score();
            snapshot.selected_index = session.selected_index();
            snapshot.current_question = session.current_question().cloned();
        }
        if let QuizState::Finished { result, .. } = &self.state {
            snapshot.result = Some(result.clone());
        }
        snapshot
    }

    fn publish(&self) -> QuizSnapshot {
        let snapshot = self.snapshot();
        self.notifier.send_replace(snapshot.clone());
        snapshot
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Open the configuration step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` while a quiz is on screen; suspend or
    /// abandon it first.
    pub fn show_config(&mut self) -> Result<QuizSnapshot, SessionError> {
        if matches!(self.state, QuizState::Active(_)) {
            return Err(SessionError::InProgress);
        }
        self.state = QuizState::Configuring;
        self.showing_history = false;
        Ok(self.publish())
    }

    /// Leave the configuration step without starting.
    pub fn cancel_config(&mut self) -> QuizSnapshot {
        if matches!(self.state, QuizState::Configuring) {
            self.state = QuizState::Idle;
        }
        self.publish()
    }

    pub fn show_history(&mut self) -> QuizSnapshot {
        self.showing_history = true;
        self.publish()
    }

    pub fn hide_history(&mut self) -> QuizSnapshot {
        self.showing_history = false;
        self.publish()
    }

    /// Leave the quiz screen but keep saved progress for a later `resume`.
    pub fn suspend(&mut self) -> QuizSnapshot {
        if matches!(self.state, QuizState::Active(_)) {
            info!("quiz suspended");
            self.state = QuizState::Idle;
        }
        self.publish()
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Start a new quiz of `clamp(requested, min(10, total), total)` shuffled
    /// questions, replacing any saved progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank has no questions, or
    /// `SessionError::Storage` if the new session could not be saved.
    pub async fn start(&mut self, requested: usize) -> Result<QuizSnapshot, SessionError> {
        let plan = QuizPlanner::new(self.bank.all_questions()).build_with_rng(requested, &mut self.rng);
        let session = QuizSession::new(plan.questions)?;
        info!(
            requested,
            length = session.total_questions(),
            available = plan.available,
            "quiz started"
        );

        let saved = session.to_saved_progress();
        self.state = QuizState::Active(session);
        self.showing_history = false;
        let snapshot = self.publish();
        self.save(&saved).await?;
        Ok(snapshot)
    }

    /// Answer the current question. Only the first answer per question counts.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` without a quiz,
    /// `SessionError::Completed` once it has finished,
    /// `SessionError::InvalidChoice` for an index outside the choices, or
    /// `SessionError::Storage` if the selection could not be saved.
    pub async fn select_answer(&mut self, index: usize) -> Result<AnswerResult, SessionError> {
        let session = match &mut self.state {
            QuizState::Active(session) => session,
            QuizState::Finished { .. } => return Err(SessionError::Completed),
            QuizState::Idle | QuizState::Configuring => return Err(SessionError::NotStarted),
        };
        let selection = session.select_answer(index)?;
        let saved = session.to_saved_progress();

        if let Selection::AlreadyAnswered { selected } = selection {
            debug!(selected, ignored = index, "answer already selected");
            return Ok(AnswerResult {
                selection,
                snapshot: self.snapshot(),
            });
        }

        debug!(?selection, score = saved.score, "answer selected");
        let snapshot = self.publish();
        self.save(&saved).await?;
        Ok(AnswerResult {
            selection,
            snapshot,
        })
    }

    /// Move to the next question, completing the quiz after the last one.
    ///
    /// On completion one `QuizResult` is appended to history and saved
    /// progress is cleared. If the history write fails the saved progress is
    /// left in place, so resuming lands on the last question again. If the
    /// result was recorded but clearing fails, the progress is rewritten as
    /// not started so the same quiz cannot be recorded twice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` without a quiz,
    /// `SessionError::Completed` once it has finished,
    /// `SessionError::NoSelection` if the question is unanswered, or
    /// `SessionError::Storage` on persistence failures.
    pub async fn advance(&mut self) -> Result<QuizSnapshot, SessionError> {
        let (saved, finished) = {
            let session = match &mut self.state {
                QuizState::Active(session) => session,
                QuizState::Finished { .. } => return Err(SessionError::Completed),
                QuizState::Idle | QuizState::Configuring => {
                    return Err(SessionError::NotStarted);
                }
            };
            match session.advance()? {
                Advance::Next => (Some(session.to_saved_progress()), None),
                Advance::Finished => {
                    let result = session.build_result(self.clock.now())?;
                    (None, Some((session.clone(), result)))
                }
            }
        };

        if let Some((session, result)) = finished {
            let retired = SavedProgress {
                started: false,
                ..session.to_saved_progress()
            };
            info!(
                score = result.score(),
                total = result.total_questions(),
                "quiz completed"
            );
            self.state = QuizState::Finished {
                session,
                result: result.clone(),
            };
            let snapshot = self.publish();
            self.history.record(result).await?;
            if let Err(err) = self.clear().await {
                self.retire(retired).await;
                return Err(err);
            }
            return Ok(snapshot);
        }

        let snapshot = self.publish();
        if let Some(saved) = saved {
            self.save(&saved).await?;
        }
        Ok(snapshot)
    }

    /// Drop the current quiz and go back to the configuration step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if saved progress could not be cleared.
    pub async fn restart(&mut self) -> Result<QuizSnapshot, SessionError> {
        info!("quiz restarted");
        self.state = QuizState::Configuring;
        self.showing_history = false;
        let snapshot = self.publish();
        self.clear().await?;
        Ok(snapshot)
    }

    /// Drop the current quiz and its saved progress and return to the start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if saved progress could not be cleared.
    pub async fn abandon(&mut self) -> Result<QuizSnapshot, SessionError> {
        info!("quiz abandoned");
        self.state = QuizState::Idle;
        self.showing_history = false;
        let snapshot = self.publish();
        self.clear().await?;
        Ok(snapshot)
    }

    /// Rebuild the saved quiz, if any, and make it active.
    ///
    /// Saved question ids missing from the bank are dropped. A saved quiz
    /// that ends up empty or already past its last question is discarded.
    /// Returns `Ok(false)` when there was nothing to resume.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn resume(&mut self) -> Result<bool, SessionError> {
        let Some(saved) = self.load_saved().await? else {
            return Ok(false);
        };

        let saved_len = saved.question_ids.len();
        let questions: Vec<Question> = saved
            .question_ids
            .iter()
            .filter_map(|id| self.bank.get(id).cloned())
            .collect();
        if questions.len() < saved_len {
            debug!(
                dropped = saved_len - questions.len(),
                "saved quiz references unknown questions"
            );
        }

        if questions.is_empty() || saved.current_index >= questions.len() {
            warn!(
                remaining = questions.len(),
                index = saved.current_index,
                "discarding saved quiz that cannot be resumed"
            );
            self.clear().await?;
            return Ok(false);
        }

        let session = QuizSession::restore(
            questions,
            saved.current_index,
            saved.score,
            saved.selected_index,
        )?;
        info!(
            index = session.current_index(),
            total = session.total_questions(),
            score = session.score(),
            "quiz resumed"
        );
        let normalized = session.to_saved_progress();
        self.state = QuizState::Active(session);
        self.showing_history = false;
        self.publish();

        if normalized != saved {
            self.save(&normalized).await?;
        }
        Ok(true)
    }

    /// Whether a resumable quiz is saved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn has_saved_progress(&self) -> Result<bool, SessionError> {
        Ok(self.saved_progress_info().await?.is_some())
    }

    /// Position and score of the saved quiz, for the start screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn saved_progress_info(&self) -> Result<Option<SavedProgressInfo>, SessionError> {
        let saved = match self.progress.load_progress().await {
            Ok(saved) => saved,
            Err(StorageError::Serialization(_)) => None,
            Err(err) => return Err(err.into()),
        };
        Ok(saved
            .filter(SavedProgress::is_resumable)
            .map(|saved| SavedProgressInfo::from_saved(&saved)))
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────────
    //

    async fn load_saved(&self) -> Result<Option<SavedProgress>, SessionError> {
        match self.progress.load_progress().await {
            Ok(saved) => Ok(saved),
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "discarding unreadable saved quiz");
                self.clear().await?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, saved: &SavedProgress) -> Result<(), SessionError> {
        self.progress.save_progress(saved).await.map_err(|err| {
            warn!(error = %err, "failed to save quiz progress");
            SessionError::from(err)
        })
    }

    /// Best-effort write that makes a recorded quiz unresumable when
    /// clearing its progress failed.
    async fn retire(&self, saved: SavedProgress) {
        if let Err(err) = self.progress.save_progress(&saved).await {
            warn!(error = %err, "failed to retire completed quiz progress");
        }
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.progress.clear_progress().await.map_err(|err| {
            warn!(error = %err, "failed to clear saved quiz progress");
            SessionError::from(err)
        })
    }
}
