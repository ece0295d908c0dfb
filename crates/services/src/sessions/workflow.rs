use std::sync::Arc;

use quiz_core::model::{Lesson, LessonId, MatchSide, QuizSettings, SessionSnapshot, TestResult};
use storage::repository::SessionSnapshotRepository;

use super::controller::SessionController;
use super::state::Step;
use super::timer::TimerHandle;
use crate::Clock;
use crate::recorder::ResultRecorder;

/// Learner input forwarded by the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Tick(TimerHandle),
    Submit(String),
    Select(MatchSide, String),
    DontKnow,
    ExtendTime,
    AdvanceNow,
    Abandon,
}

/// Result of feeding one input through the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonLoopResult {
    pub step: Step,
    /// Set once, when the input finished the lesson.
    pub result: Option<TestResult>,
}

/// Orchestrates a controller with persistence: snapshots after every
/// transition, results on completion.
#[derive(Clone)]
pub struct LessonLoopService {
    clock: Clock,
    settings: QuizSettings,
    snapshots: Arc<dyn SessionSnapshotRepository>,
    recorder: ResultRecorder,
}

impl LessonLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        snapshots: Arc<dyn SessionSnapshotRepository>,
        recorder: ResultRecorder,
    ) -> Self {
        Self {
            clock,
            settings,
            snapshots,
            recorder,
        }
    }

    /// A fresh, idle controller using this loop's settings and clock.
    #[must_use]
    pub fn controller(&self) -> SessionController {
        SessionController::new(self.settings.clone(), self.clock)
    }

    /// Start `lesson`, discarding any saved attempt.
    pub async fn start(&self, controller: &mut SessionController, lesson: &Lesson) -> Step {
        if let Err(err) = self.snapshots.clear_snapshot().await {
            tracing::warn!(error = %err, "failed to clear saved session");
        }
        let step = controller.start_lesson(lesson);
        self.save(controller).await;
        step
    }

    /// The saved attempt, if one is still live. Read failures count as none.
    pub async fn saved(&self) -> Option<SessionSnapshot> {
        match self.snapshots.load_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read saved session");
                None
            }
        }
    }

    /// Lesson of the saved attempt, if any.
    pub async fn saved_lesson(&self) -> Option<LessonId> {
        self.saved().await.map(|s| s.lesson_id)
    }

    /// Resume the saved attempt if it belongs to one of `lessons`.
    pub async fn resume_saved(
        &self,
        controller: &mut SessionController,
        lessons: &[Lesson],
    ) -> Step {
        let Some(snapshot) = self.saved().await else {
            return Step::Ignored;
        };
        let Some(lesson) = lessons.iter().find(|l| l.id() == snapshot.lesson_id) else {
            tracing::debug!(lesson = %snapshot.lesson_id, "saved session refers to an unknown lesson");
            return Step::Ignored;
        };
        controller.resume(lesson, snapshot)
    }

    /// Apply `input`, then persist whatever the transition requires.
    pub async fn handle(
        &self,
        controller: &mut SessionController,
        input: SessionInput,
    ) -> LessonLoopResult {
        let step = match input {
            SessionInput::Tick(handle) => controller.tick(handle),
            SessionInput::Submit(answer) => controller.submit_answer(&answer),
            SessionInput::Select(side, value) => controller.select_match(side, &value),
            SessionInput::DontKnow => controller.dont_know(),
            SessionInput::ExtendTime => controller.extend_time(),
            SessionInput::AdvanceNow => controller.advance_now(),
            SessionInput::Abandon => controller.abandon(),
        };

        let result = match &step {
            Step::Finished(outcome) => {
                let result = self.recorder.record(outcome).await;
                if let Err(err) = self.snapshots.clear_snapshot().await {
                    tracing::warn!(error = %err, "failed to clear saved session");
                }
                Some(result)
            }
            // Countdown ticks change nothing worth resuming; an abandoned
            // attempt keeps its last snapshot.
            Step::Ignored | Step::Ticked { .. } | Step::Abandoned => None,
            _ => {
                self.save(controller).await;
                None
            }
        };

        LessonLoopResult { step, result }
    }

    async fn save(&self, controller: &SessionController) {
        let Some(snapshot) = controller.snapshot() else {
            return;
        };
        if let Err(err) = self
            .snapshots
            .save_snapshot(&snapshot, self.settings.snapshot_ttl())
            .await
        {
            tracing::warn!(error = %err, "failed to save session snapshot");
        }
    }
}
