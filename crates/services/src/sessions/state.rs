use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    IncorrectAnswer, LessonId, MatchSide, Question, QuestionId, SessionSnapshot, TestResult,
    VocabularyPair, compute_score,
};
use quiz_core::time::elapsed_secs;

use super::timer::Countdown;

/// Where the controller is in the life of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No lesson running. A finished attempt returns here once its outcome
    /// has been handed out.
    Idle,
    /// A question is shown and its answer countdown runs.
    AwaitingAnswer,
    /// The current question was answered correctly; the explanation shows.
    Explaining,
}

/// What a controller call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The call did not apply in the current state; nothing changed.
    Ignored,
    Started,
    Resumed,
    Ticked { remaining: u32 },
    TimeExtended { remaining: u32 },
    /// Wrong answer; the question stays and the countdown keeps running.
    Incorrect,
    /// Right answer; the explanation countdown started.
    Correct,
    /// A matching word is waiting for its counterpart.
    MatchSelected,
    PairMatched,
    PairRejected,
    Advanced,
    /// The primary pass ended and the deferred questions come next.
    RepeatStarted { questions: usize },
    /// The attempt ended; reported exactly once, after which the controller is idle.
    Finished(SessionOutcome),
    Abandoned,
}

/// Everything a finished attempt hands to the result recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub lesson_id: LessonId,
    pub lesson_title: String,
    /// Size of the primary deck; repeated questions are not counted twice.
    pub total_questions: usize,
    pub incorrect_attempts: BTreeMap<QuestionId, u32>,
    pub incorrect_answers: Vec<IncorrectAnswer>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SessionOutcome {
    #[must_use]
    pub fn total_incorrect(&self) -> u32 {
        self.incorrect_attempts.values().sum()
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        compute_score(self.total_questions, self.total_incorrect())
    }

    /// Questions answered without a single miss.
    #[must_use]
    pub fn correct_answers(&self) -> usize {
        self.total_questions
            .saturating_sub(self.incorrect_attempts.len())
    }

    #[must_use]
    pub fn to_result(&self) -> TestResult {
        TestResult {
            lesson_id: self.lesson_id,
            lesson_title: self.lesson_title.clone(),
            score: self.score(),
            total_questions: self.total_questions,
            correct_answers: self.correct_answers(),
            incorrect_attempts: self.incorrect_attempts.clone(),
            incorrect_answers: self.incorrect_answers.clone(),
            time_spent_secs: elapsed_secs(self.started_at, self.completed_at),
            completed_at: self.completed_at,
        }
    }
}

/// State of the attempt in progress.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSession {
    pub(crate) lesson_id: LessonId,
    pub(crate) lesson_title: String,
    pub(crate) deck: Vec<Question>,
    pub(crate) active: Vec<QuestionId>,
    pub(crate) index: usize,
    pub(crate) repeat_mode: bool,
    pub(crate) deferred: Vec<QuestionId>,
    pub(crate) incorrect_attempts: BTreeMap<QuestionId, u32>,
    pub(crate) matched: Vec<VocabularyPair>,
    pub(crate) pending: Option<(MatchSide, String)>,
    pub(crate) timer: Option<Countdown>,
    pub(crate) extend_available: bool,
    pub(crate) started_at: DateTime<Utc>,
}

impl ActiveSession {
    pub(crate) fn new(
        lesson_id: LessonId,
        lesson_title: String,
        deck: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let active = deck.iter().map(|q| q.id).collect();
        Self {
            lesson_id,
            lesson_title,
            deck,
            active,
            index: 0,
            repeat_mode: false,
            deferred: Vec::new(),
            incorrect_attempts: BTreeMap::new(),
            matched: Vec::new(),
            pending: None,
            timer: None,
            extend_available: true,
            started_at,
        }
    }

    /// Rebuild from a snapshot; `None` if it does not describe a valid position.
    pub(crate) fn from_snapshot(lesson_title: String, snapshot: SessionSnapshot) -> Option<Self> {
        let known = |id: &QuestionId| snapshot.deck.iter().any(|q| q.id == *id);
        if snapshot.index >= snapshot.active.len()
            || !snapshot.active.iter().all(known)
            || !snapshot.deferred.iter().all(known)
        {
            return None;
        }

        Some(Self {
            lesson_id: snapshot.lesson_id,
            lesson_title,
            deck: snapshot.deck,
            active: snapshot.active,
            index: snapshot.index,
            repeat_mode: snapshot.repeat_mode,
            deferred: snapshot.deferred,
            incorrect_attempts: snapshot.incorrect_attempts,
            matched: Vec::new(),
            pending: None,
            timer: None,
            extend_available: !snapshot.time_extended,
            started_at: snapshot.started_at,
        })
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            lesson_id: self.lesson_id,
            deck: self.deck.clone(),
            active: self.active.clone(),
            index: self.index,
            repeat_mode: self.repeat_mode,
            deferred: self.deferred.clone(),
            incorrect_attempts: self.incorrect_attempts.clone(),
            time_extended: !self.extend_available,
            started_at: self.started_at,
        }
    }

    pub(crate) fn current_id(&self) -> Option<QuestionId> {
        self.active.get(self.index).copied()
    }

    pub(crate) fn current(&self) -> Option<&Question> {
        let id = self.current_id()?;
        self.deck.iter().find(|q| q.id == id)
    }

    /// Reset per-question state and arm the answer countdown.
    pub(crate) fn begin_question(&mut self, countdown: Countdown) {
        self.matched.clear();
        self.pending = None;
        self.extend_available = true;
        self.timer = Some(countdown);
    }

    pub(crate) fn record_miss(&mut self) {
        if let Some(id) = self.current_id() {
            *self.incorrect_attempts.entry(id).or_insert(0) += 1;
        }
    }

    pub(crate) fn attempts_for_current(&self) -> u32 {
        self.current_id()
            .and_then(|id| self.incorrect_attempts.get(&id).copied())
            .unwrap_or(0)
    }

    pub(crate) fn is_matched(&self, side: MatchSide, value: &str) -> bool {
        self.matched.iter().any(|p| match side {
            MatchSide::Term => p.term == value,
            MatchSide::Translation => p.translation == value,
        })
    }

    pub(crate) fn into_outcome(self, completed_at: DateTime<Utc>) -> SessionOutcome {
        let incorrect_answers = self
            .incorrect_attempts
            .iter()
            .filter_map(|(id, attempts)| {
                let question = self.deck.iter().find(|q| q.id == *id)?;
                Some(IncorrectAnswer {
                    question_id: *id,
                    prompt: question.prompt.clone(),
                    attempts: *attempts,
                    correct_answer: question.expected_answer(),
                })
            })
            .collect();

        SessionOutcome {
            lesson_id: self.lesson_id,
            lesson_title: self.lesson_title,
            total_questions: self.deck.len(),
            incorrect_attempts: self.incorrect_attempts,
            incorrect_answers,
            started_at: self.started_at,
            completed_at,
        }
    }
}
