use std::sync::Arc;

use quiz_core::model::{LessonProgress, QuizSettings, TestResult};
use storage::repository::{
    DailyActivityRepository, LessonProgressRepository, TestHistoryRepository,
};

use crate::Clock;
use crate::sessions::SessionOutcome;

/// Turns a finished attempt into a `TestResult` and persists it.
///
/// Each write stands on its own: a failure is logged and the remaining
/// writes still happen.
#[derive(Clone)]
pub struct ResultRecorder {
    clock: Clock,
    history_limit: usize,
    progress: Arc<dyn LessonProgressRepository>,
    history: Arc<dyn TestHistoryRepository>,
    activity: Arc<dyn DailyActivityRepository>,
}

impl ResultRecorder {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: &QuizSettings,
        progress: Arc<dyn LessonProgressRepository>,
        history: Arc<dyn TestHistoryRepository>,
        activity: Arc<dyn DailyActivityRepository>,
    ) -> Self {
        Self {
            clock,
            history_limit: settings.history_limit(),
            progress,
            history,
            activity,
        }
    }

    /// Score `outcome`, update lesson progress, history, last result and
    /// today's counter, and return the result.
    pub async fn record(&self, outcome: &SessionOutcome) -> TestResult {
        let result = outcome.to_result();
        let lesson_id = result.lesson_id;

        let mut progress = match self.progress.get_progress(lesson_id).await {
            Ok(stored) => stored.unwrap_or_else(|| LessonProgress::new(lesson_id)),
            Err(err) => {
                tracing::warn!(lesson = %lesson_id, error = %err, "failed to read lesson progress");
                LessonProgress::new(lesson_id)
            }
        };
        progress.record_completion(result.score, result.completed_at);
        if let Err(err) = self.progress.upsert_progress(&progress).await {
            tracing::warn!(lesson = %lesson_id, error = %err, "failed to save lesson progress");
        }

        if let Err(err) = self.history.append_result(&result, self.history_limit).await {
            tracing::warn!(lesson = %lesson_id, error = %err, "failed to append test result");
        }
        if let Err(err) = self.history.set_last_result(&result).await {
            tracing::warn!(lesson = %lesson_id, error = %err, "failed to save last result");
        }

        let today = self.clock.today();
        match self.activity.increment(today).await {
            Ok(count) => tracing::debug!(%today, count, "daily lesson counter updated"),
            Err(err) => tracing::warn!(%today, error = %err, "failed to update daily counter"),
        }

        tracing::info!(
            lesson = %lesson_id,
            score = result.score,
            time_spent_secs = result.time_spent_secs,
            "test result recorded"
        );
        result
    }
}
