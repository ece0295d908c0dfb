use quiz_core::evaluator::{Response, evaluate, evaluate_pair};
use quiz_core::model::{
    Lesson, MATCHING_ARITY, MatchSide, Question, QuizSettings, SessionSnapshot, VocabularyPair,
};

use super::state::{ActiveSession, SessionPhase, Step};
use super::timer::{TimerHandle, TimerIssuer, TimerPurpose};
use super::view::SessionView;
use crate::Clock;

/// State machine for one lesson attempt.
///
/// Every input is a plain method call returning a [`Step`]; calls that do not
/// apply in the current phase return [`Step::Ignored`] and change nothing.
/// Time only moves through [`SessionController::tick`], driven externally.
pub struct SessionController {
    settings: QuizSettings,
    clock: Clock,
    timers: TimerIssuer,
    phase: SessionPhase,
    session: Option<ActiveSession>,
}

impl SessionController {
    #[must_use]
    pub fn new(settings: QuizSettings, clock: Clock) -> Self {
        Self {
            settings,
            clock,
            timers: TimerIssuer::default(),
            phase: SessionPhase::Idle,
            session: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Handle of the countdown currently running, if any.
    #[must_use]
    pub fn active_timer(&self) -> Option<TimerHandle> {
        self.session
            .as_ref()
            .and_then(|s| s.timer.as_ref())
            .map(super::timer::Countdown::handle)
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        match &self.session {
            Some(session) => SessionView::of(self.phase, session),
            None => SessionView::empty(self.phase),
        }
    }

    /// Resumable picture of the attempt in progress.
    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(ActiveSession::snapshot)
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Start `lesson` from its first question, replacing any attempt in progress.
    pub fn start_lesson(&mut self, lesson: &Lesson) -> Step {
        if lesson.questions().is_empty() {
            return Step::Ignored;
        }
        let mut session = ActiveSession::new(
            lesson.id(),
            lesson.title().to_owned(),
            lesson.questions().to_vec(),
            self.clock.now(),
        );
        session.begin_question(self.timers.start(TimerPurpose::Answer, self.settings.answer_time()));
        tracing::debug!(lesson = %lesson.id(), questions = session.deck.len(), "lesson started");

        self.session = Some(session);
        self.phase = SessionPhase::AwaitingAnswer;
        Step::Started
    }

    /// Continue a saved attempt of `lesson` at the question it stopped on.
    pub fn resume(&mut self, lesson: &Lesson, snapshot: SessionSnapshot) -> Step {
        if snapshot.lesson_id != lesson.id() {
            return Step::Ignored;
        }
        let Some(mut session) = ActiveSession::from_snapshot(lesson.title().to_owned(), snapshot)
        else {
            tracing::debug!(lesson = %lesson.id(), "snapshot does not describe a valid position");
            return Step::Ignored;
        };
        let extend_available = session.extend_available;
        session.begin_question(self.timers.start(TimerPurpose::Answer, self.settings.answer_time()));
        session.extend_available = extend_available;
        tracing::debug!(lesson = %lesson.id(), index = session.index, "lesson resumed");

        self.session = Some(session);
        self.phase = SessionPhase::AwaitingAnswer;
        Step::Resumed
    }

    /// Drop the attempt without producing a result. Cancels every countdown.
    pub fn abandon(&mut self) -> Step {
        if self.phase == SessionPhase::Idle {
            return Step::Ignored;
        }
        if let Some(session) = self.session.take() {
            tracing::debug!(lesson = %session.lesson_id, "lesson abandoned");
        }
        self.phase = SessionPhase::Idle;
        Step::Abandoned
    }

    //
    // ─── TIME ──────────────────────────────────────────────────────────────────
    //

    /// Advance the live countdown by one unit.
    ///
    /// Ticks carrying any other handle are stale and ignored.
    pub fn tick(&mut self, handle: TimerHandle) -> Step {
        let Some(timer) = self.session.as_mut().and_then(|s| s.timer.as_mut()) else {
            return Step::Ignored;
        };
        if timer.handle() != handle {
            return Step::Ignored;
        }

        let purpose = timer.purpose();
        if !timer.tick() {
            return Step::Ticked {
                remaining: timer.remaining(),
            };
        }

        match purpose {
            TimerPurpose::Answer => {
                tracing::debug!("answer time ran out");
                self.give_up()
            }
            TimerPurpose::Explanation => self.advance(),
        }
    }

    /// Add the bonus to the answer countdown, once per question.
    pub fn extend_time(&mut self) -> Step {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Step::Ignored;
        }
        let bonus = self.settings.extend_bonus();
        let Some(session) = self.session.as_mut() else {
            return Step::Ignored;
        };
        let Some(timer) = session.timer.as_mut() else {
            return Step::Ignored;
        };
        if !session.extend_available {
            return Step::Ignored;
        }

        timer.extend(bonus);
        let remaining = timer.remaining();
        session.extend_available = false;
        Step::TimeExtended { remaining }
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Answer a multiple-choice or text-input question.
    pub fn submit_answer(&mut self, answer: &str) -> Step {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Step::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return Step::Ignored;
        };
        let Some(question) = session.current() else {
            return Step::Ignored;
        };
        if question.is_matching() {
            return Step::Ignored;
        }

        if evaluate(question, &Response::from(answer)) {
            let delay = self.settings.explanation_delay();
            self.start_explanation(delay)
        } else {
            session.record_miss();
            Step::Incorrect
        }
    }

    /// Pick a word in one column of a matching block.
    ///
    /// A pick on the same side as the pending one replaces it; a pick on the
    /// other side submits the pair. Words already matched cannot be picked.
    pub fn select_match(&mut self, side: MatchSide, value: &str) -> Step {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Step::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return Step::Ignored;
        };
        let Some(set) = session.current().and_then(Question::matching_set).cloned() else {
            return Step::Ignored;
        };
        if !set.contains(side, value) || session.is_matched(side, value) {
            return Step::Ignored;
        }

        let (term, translation) = match session.pending.take() {
            Some((pending_side, pending)) if pending_side != side => match side {
                MatchSide::Term => (value.to_owned(), pending),
                MatchSide::Translation => (pending, value.to_owned()),
            },
            _ => {
                session.pending = Some((side, value.to_owned()));
                return Step::MatchSelected;
            }
        };

        if !evaluate_pair(&set, &term, &translation) {
            session.record_miss();
            return Step::PairRejected;
        }

        session.matched.push(VocabularyPair::new(term, translation));
        if session.matched.len() < MATCHING_ARITY {
            return Step::PairMatched;
        }
        let delay = self.settings.matching_delay();
        self.start_explanation(delay)
    }

    /// Give up on the current question: count a miss, queue it for the repeat
    /// pass and move on at once.
    pub fn dont_know(&mut self) -> Step {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Step::Ignored;
        }
        self.give_up()
    }

    /// Skip what is left of the explanation pause.
    pub fn advance_now(&mut self) -> Step {
        if self.phase != SessionPhase::Explaining {
            return Step::Ignored;
        }
        self.advance()
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    fn start_explanation(&mut self, delay: u32) -> Step {
        let Some(session) = self.session.as_mut() else {
            return Step::Ignored;
        };
        session.pending = None;
        session.timer = Some(self.timers.start(TimerPurpose::Explanation, delay));
        self.phase = SessionPhase::Explaining;
        Step::Correct
    }

    fn give_up(&mut self) -> Step {
        let Some(session) = self.session.as_mut() else {
            return Step::Ignored;
        };
        session.record_miss();
        // The repeat pass runs once; misses there are counted but not queued again.
        if !session.repeat_mode {
            if let Some(id) = session.current_id() {
                session.deferred.push(id);
            }
        }
        self.advance()
    }

    fn advance(&mut self) -> Step {
        let Some(session) = self.session.as_mut() else {
            return Step::Ignored;
        };
        session.timer = None;

        if session.index + 1 < session.active.len() {
            session.index += 1;
            session.begin_question(self.timers.start(TimerPurpose::Answer, self.settings.answer_time()));
            self.phase = SessionPhase::AwaitingAnswer;
            return Step::Advanced;
        }

        if !session.repeat_mode && !session.deferred.is_empty() {
            session.active = std::mem::take(&mut session.deferred);
            session.index = 0;
            session.repeat_mode = true;
            let questions = session.active.len();
            session.begin_question(self.timers.start(TimerPurpose::Answer, self.settings.answer_time()));
            self.phase = SessionPhase::AwaitingAnswer;
            tracing::debug!(questions, "repeat pass started");
            return Step::RepeatStarted { questions };
        }

        self.finish()
    }

    fn finish(&mut self) -> Step {
        let Some(session) = self.session.take() else {
            return Step::Ignored;
        };
        let outcome = session.into_outcome(self.clock.now());
        tracing::debug!(
            lesson = %outcome.lesson_id,
            score = outcome.score(),
            "lesson finished"
        );
        self.phase = SessionPhase::Idle;
        Step::Finished(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::state::SessionOutcome;
    use quiz_core::model::{Direction, LessonId, MatchingSet, QuestionId, QuestionKind};
    use quiz_core::time::fixed_clock;

    fn multiple_choice(id: u32, correct: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            explanation: Some(format!("E{id}")),
            kind: QuestionKind::MultipleChoice {
                direction: Direction::TermToTranslation,
                options: vec![correct.to_owned(), "other".to_owned()],
                correct: correct.to_owned(),
            },
        }
    }

    fn text_input(id: u32, answer: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            explanation: Some(format!("E{id}")),
            kind: QuestionKind::TextInput {
                direction: Direction::TranslationToTerm,
                answer: answer.to_owned(),
            },
        }
    }

    fn matching(id: u32) -> Question {
        Question {
            id: QuestionId::new(id),
            prompt: "Match".into(),
            explanation: None,
            kind: QuestionKind::Matching(MatchingSet::new([
                VocabularyPair::new("mano", "ręka"),
                VocabularyPair::new("pierna", "noga"),
                VocabularyPair::new("nariz", "nos"),
                VocabularyPair::new("boca", "usta"),
            ])),
        }
    }

    fn lesson(questions: Vec<Question>) -> Lesson {
        Lesson::new(LessonId::new(1), "Body", "", questions, Vec::new()).unwrap()
    }

    fn controller() -> SessionController {
        SessionController::new(QuizSettings::default(), fixed_clock())
    }

    fn finished(step: Step) -> SessionOutcome {
        match step {
            Step::Finished(outcome) => outcome,
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    fn tick_until_done(ctl: &mut SessionController) -> Step {
        loop {
            let handle = ctl.active_timer().expect("a countdown is running");
            match ctl.tick(handle) {
                Step::Ticked { .. } => {}
                other => return other,
            }
        }
    }

    #[test]
    fn actions_without_a_lesson_are_ignored() {
        let mut ctl = controller();
        assert_eq!(ctl.submit_answer("x"), Step::Ignored);
        assert_eq!(ctl.dont_know(), Step::Ignored);
        assert_eq!(ctl.extend_time(), Step::Ignored);
        assert_eq!(ctl.advance_now(), Step::Ignored);
        assert_eq!(ctl.select_match(MatchSide::Term, "mano"), Step::Ignored);
        assert_eq!(ctl.abandon(), Step::Ignored);
        assert_eq!(ctl.view().phase, SessionPhase::Idle);
        assert!(ctl.snapshot().is_none());
    }

    #[test]
    fn wrong_then_right_answer_counts_one_attempt() {
        let mut ctl = controller();
        let lesson = lesson(vec![multiple_choice(0, "ręka"), text_input(1, "mano")]);
        assert_eq!(ctl.start_lesson(&lesson), Step::Started);
        assert_eq!(ctl.view().time_left, Some(30));

        assert_eq!(ctl.submit_answer("noga"), Step::Incorrect);
        assert_eq!(ctl.view().attempts, 1);
        assert_eq!(ctl.phase(), SessionPhase::AwaitingAnswer);

        assert_eq!(ctl.submit_answer("ręka"), Step::Correct);
        let view = ctl.view();
        assert_eq!(view.phase, SessionPhase::Explaining);
        assert_eq!(view.explanation.as_deref(), Some("E0"));
        assert_eq!(ctl.submit_answer("ręka"), Step::Ignored);

        assert_eq!(ctl.advance_now(), Step::Advanced);
        assert_eq!(ctl.submit_answer("La Mano"), Step::Correct);

        let outcome = finished(tick_until_done(&mut ctl));
        assert_eq!(outcome.total_questions, 2);
        assert_eq!(outcome.total_incorrect(), 1);
        assert_eq!(outcome.correct_answers(), 1);
        assert_eq!(outcome.score(), 50);
        assert_eq!(outcome.incorrect_answers[0].correct_answer, "ręka");
        assert_eq!(ctl.phase(), SessionPhase::Idle);
        assert!(ctl.snapshot().is_none());
    }

    #[test]
    fn explanation_lasts_the_configured_delay() {
        let mut ctl = controller();
        ctl.start_lesson(&lesson(vec![multiple_choice(0, "a"), multiple_choice(1, "b")]));
        ctl.submit_answer("a");

        let handle = ctl.active_timer().unwrap();
        assert_eq!(ctl.tick(handle), Step::Ticked { remaining: 1 });
        assert_eq!(ctl.tick(handle), Step::Advanced);
        assert_eq!(ctl.view().progress.position, 2);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let mut ctl = controller();
        ctl.start_lesson(&lesson(vec![multiple_choice(0, "a"), multiple_choice(1, "b")]));
        let answer_timer = ctl.active_timer().unwrap();

        ctl.submit_answer("a");
        assert_eq!(ctl.tick(answer_timer), Step::Ignored);
        let explanation_timer = ctl.active_timer().unwrap();
        assert_ne!(explanation_timer, answer_timer);

        ctl.advance_now();
        assert_eq!(ctl.tick(explanation_timer), Step::Ignored);
        assert_eq!(ctl.view().time_left, Some(30));
    }

    #[test]
    fn running_out_of_time_defers_the_question() {
        let settings = QuizSettings::new(3, 15, 2, 1, 50, 60).unwrap();
        let mut ctl = SessionController::new(settings, fixed_clock());
        ctl.start_lesson(&lesson(vec![multiple_choice(0, "a"), multiple_choice(1, "b")]));

        assert_eq!(tick_until_done(&mut ctl), Step::Advanced);
        let view = ctl.view();
        assert_eq!(view.progress.deferred, 1);
        assert_eq!(view.progress.position, 2);
    }

    #[test]
    fn extend_time_works_once_per_question() {
        let mut ctl = controller();
        ctl.start_lesson(&lesson(vec![multiple_choice(0, "a"), multiple_choice(1, "b")]));
        let handle = ctl.active_timer().unwrap();
        ctl.tick(handle);

        assert_eq!(ctl.extend_time(), Step::TimeExtended { remaining: 44 });
        assert!(!ctl.view().can_extend);
        assert_eq!(ctl.extend_time(), Step::Ignored);

        ctl.dont_know();
        assert!(ctl.view().can_extend);
        assert_eq!(ctl.extend_time(), Step::TimeExtended { remaining: 45 });
    }

    #[test]
    fn dont_know_on_last_question_enters_repeat_mode_once() {
        let mut ctl = controller();
        ctl.start_lesson(&lesson(vec![multiple_choice(0, "a"), multiple_choice(1, "b")]));

        assert_eq!(ctl.dont_know(), Step::Advanced);
        assert_eq!(ctl.dont_know(), Step::RepeatStarted { questions: 2 });
        let view = ctl.view();
        assert!(view.progress.repeat_mode);
        assert_eq!(view.progress.pass_length, 2);
        assert_eq!(view.question.unwrap().id, QuestionId::new(0));

        // Giving up again in the repeat pass counts but does not re-queue.
        assert_eq!(ctl.dont_know(), Step::Advanced);
        assert_eq!(ctl.submit_answer("b"), Step::Correct);
        let outcome = finished(ctl.advance_now());

        assert_eq!(outcome.total_questions, 2);
        assert_eq!(outcome.incorrect_attempts[&QuestionId::new(0)], 2);
        assert_eq!(outcome.incorrect_attempts[&QuestionId::new(1)], 1);
        assert_eq!(outcome.score(), 0);
        assert_eq!(ctl.advance_now(), Step::Ignored);
        assert_eq!(ctl.dont_know(), Step::Ignored);
    }

    #[test]
    fn ten_questions_three_misses_score_seventy() {
        let mut ctl = controller();
        let questions = (0..10).map(|i| multiple_choice(i, "a")).collect();
        ctl.start_lesson(&lesson(questions));

        for i in 0..10 {
            if i < 3 {
                ctl.submit_answer("other");
            }
            assert_eq!(ctl.submit_answer("a"), Step::Correct);
            if i < 9 {
                assert_eq!(ctl.advance_now(), Step::Advanced);
            }
        }
        let outcome = finished(ctl.advance_now());
        assert_eq!(outcome.score(), 70);
        assert_eq!(outcome.to_result().correct_answers, 7);
    }

    #[test]
    fn matching_accepts_picks_in_either_order() {
        let mut ctl = controller();
        ctl.start_lesson(&lesson(vec![matching(0), multiple_choice(1, "a")]));

        assert_eq!(ctl.submit_answer("mano"), Step::Ignored);
        assert_eq!(ctl.select_match(MatchSide::Term, "mano"), Step::MatchSelected);
        assert_eq!(ctl.select_match(MatchSide::Translation, "ręka"), Step::PairMatched);

        assert_eq!(ctl.select_match(MatchSide::Translation, "noga"), Step::MatchSelected);
        assert_eq!(ctl.select_match(MatchSide::Term, "pierna"), Step::PairMatched);

        // Matched words are locked.
        assert_eq!(ctl.select_match(MatchSide::Term, "mano"), Step::Ignored);
        // Words outside the block are ignored.
        assert_eq!(ctl.select_match(MatchSide::Term, "ojo"), Step::Ignored);

        // Same side replaces the pending pick.
        ctl.select_match(MatchSide::Term, "nariz");
        ctl.select_match(MatchSide::Term, "boca");
        assert_eq!(
            ctl.view().pending_match,
            Some((MatchSide::Term, "boca".to_owned()))
        );

        assert_eq!(ctl.select_match(MatchSide::Translation, "nos"), Step::PairRejected);
        assert_eq!(ctl.view().attempts, 1);
        assert!(ctl.view().pending_match.is_none());

        ctl.select_match(MatchSide::Term, "boca");
        ctl.select_match(MatchSide::Translation, "usta");
        ctl.select_match(MatchSide::Term, "nariz");
        assert_eq!(ctl.select_match(MatchSide::Translation, "nos"), Step::Correct);
        assert_eq!(ctl.view().matched.len(), 4);

        // Matching blocks pause for a single unit.
        let handle = ctl.active_timer().unwrap();
        assert_eq!(ctl.tick(handle), Step::Advanced);
    }

    #[test]
    fn abandon_cancels_timers_and_produces_no_result() {
        let mut ctl = controller();
        ctl.start_lesson(&lesson(vec![multiple_choice(0, "a")]));
        let handle = ctl.active_timer().unwrap();

        assert_eq!(ctl.abandon(), Step::Abandoned);
        assert_eq!(ctl.tick(handle), Step::Ignored);
        assert!(ctl.active_timer().is_none());
        assert_eq!(ctl.view(), SessionView::empty(SessionPhase::Idle));
    }

    #[test]
    fn snapshot_resumes_at_the_same_question() {
        let lesson = lesson(vec![
            multiple_choice(0, "a"),
            multiple_choice(1, "b"),
            multiple_choice(2, "c"),
        ]);
        let mut ctl = controller();
        ctl.start_lesson(&lesson);
        ctl.dont_know();
        ctl.submit_answer("x");
        let snapshot = ctl.snapshot().unwrap();
        assert_eq!(snapshot.index, 1);
        assert_eq!(snapshot.deferred, vec![QuestionId::new(0)]);

        let mut resumed = controller();
        assert_eq!(resumed.resume(&lesson, snapshot.clone()), Step::Resumed);
        let view = resumed.view();
        assert_eq!(view.question.unwrap().id, QuestionId::new(1));
        assert_eq!(view.attempts, 1);
        assert_eq!(view.time_left, Some(30));

        let mut bad = snapshot;
        bad.index = 7;
        assert_eq!(controller().resume(&lesson, bad), Step::Ignored);
    }

    #[test]
    fn resuming_keeps_a_used_extension() {
        let lesson = lesson(vec![multiple_choice(0, "a"), multiple_choice(1, "b")]);
        let mut ctl = controller();
        ctl.start_lesson(&lesson);
        assert!(matches!(ctl.extend_time(), Step::TimeExtended { .. }));
        let snapshot = ctl.snapshot().unwrap();
        assert!(snapshot.time_extended);
        assert_eq!(ctl.abandon(), Step::Abandoned);

        let mut resumed = controller();
        assert_eq!(resumed.resume(&lesson, snapshot), Step::Resumed);
        assert!(!resumed.view().can_extend);
        assert_eq!(resumed.extend_time(), Step::Ignored);

        resumed.submit_answer("a");
        resumed.advance_now();
        assert!(resumed.view().can_extend);
        assert!(!resumed.snapshot().unwrap().time_extended);
    }

    #[test]
    fn starting_a_new_lesson_replaces_the_old_one() {
        let mut ctl = controller();
        ctl.start_lesson(&lesson(vec![multiple_choice(0, "a"), multiple_choice(1, "b")]));
        ctl.dont_know();
        ctl.start_lesson(&lesson(vec![multiple_choice(5, "z")]));
        let view = ctl.view();
        assert_eq!(view.progress.position, 1);
        assert_eq!(view.progress.deferred, 0);
        assert_eq!(view.question.unwrap().id, QuestionId::new(5));
    }
}
