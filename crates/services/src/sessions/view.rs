use quiz_core::model::{LessonId, MatchSide, Question, VocabularyPair};

use super::state::{ActiveSession, SessionPhase};
use super::timer::{TimerHandle, TimerPurpose};

/// Aggregated view of pass progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionProgress {
    /// One-based position within the current pass.
    pub position: usize,
    pub pass_length: usize,
    pub deck_size: usize,
    pub repeat_mode: bool,
    /// Questions waiting for the repeat pass.
    pub deferred: usize,
}

/// Read-only picture of the controller handed to the rendering surface after
/// every transition.
///
/// Carries no pre-formatted strings beyond the question's own text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub lesson_id: Option<LessonId>,
    pub lesson_title: Option<String>,
    pub question: Option<Question>,
    pub progress: SessionProgress,
    /// Answer time left, while a question is open.
    pub time_left: Option<u32>,
    pub can_extend: bool,
    /// Handle the driver must pass to `tick`.
    pub timer: Option<TimerHandle>,
    pub matched: Vec<VocabularyPair>,
    pub pending_match: Option<(MatchSide, String)>,
    /// Wrong attempts on the current question so far.
    pub attempts: u32,
    /// Shown while the phase is `Explaining`.
    pub explanation: Option<String>,
}

impl SessionView {
    #[must_use]
    pub fn empty(phase: SessionPhase) -> Self {
        Self {
            phase,
            lesson_id: None,
            lesson_title: None,
            question: None,
            progress: SessionProgress::default(),
            time_left: None,
            can_extend: false,
            timer: None,
            matched: Vec::new(),
            pending_match: None,
            attempts: 0,
            explanation: None,
        }
    }

    pub(crate) fn of(phase: SessionPhase, session: &ActiveSession) -> Self {
        let question = session.current().cloned();
        let answering = phase == SessionPhase::AwaitingAnswer;
        let time_left = session
            .timer
            .as_ref()
            .filter(|t| t.purpose() == TimerPurpose::Answer)
            .map(super::timer::Countdown::remaining);
        let explanation = if phase == SessionPhase::Explaining {
            question.as_ref().and_then(|q| q.explanation.clone())
        } else {
            None
        };

        Self {
            phase,
            lesson_id: Some(session.lesson_id),
            lesson_title: Some(session.lesson_title.clone()),
            progress: SessionProgress {
                position: session.index + 1,
                pass_length: session.active.len(),
                deck_size: session.deck.len(),
                repeat_mode: session.repeat_mode,
                deferred: session.deferred.len(),
            },
            question,
            time_left,
            can_extend: answering && session.extend_available,
            timer: session.timer.as_ref().map(super::timer::Countdown::handle),
            matched: session.matched.clone(),
            pending_match: session.pending.clone(),
            attempts: session.attempts_for_current(),
            explanation,
        }
    }
}
