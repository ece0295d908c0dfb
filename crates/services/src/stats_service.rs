use std::sync::Arc;

use quiz_core::model::{Lesson, TestResult};
use quiz_core::stats::{
    CHALLENGING_LIMIT, ChallengingLesson, DashboardStats, dashboard_stats, most_challenging,
};
use storage::repository::{DailyActivityRepository, TestHistoryRepository};

use crate::Clock;

/// Read-only statistics over the persisted history.
///
/// Read failures are logged and treated as empty data.
#[derive(Clone)]
pub struct StatisticsService {
    clock: Clock,
    history: Arc<dyn TestHistoryRepository>,
    activity: Arc<dyn DailyActivityRepository>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        history: Arc<dyn TestHistoryRepository>,
        activity: Arc<dyn DailyActivityRepository>,
    ) -> Self {
        Self {
            clock,
            history,
            activity,
        }
    }

    /// Dashboard numbers for `lessons` (as returned by the catalog).
    pub async fn dashboard(&self, lessons: &[Lesson]) -> DashboardStats {
        let progress: Vec<_> = lessons.iter().map(Lesson::progress_record).collect();
        let history = self.history().await;
        let today = self.clock.today();
        let completed_today = self.activity.completed_on(today).await.unwrap_or_else(|err| {
            tracing::warn!(%today, error = %err, "failed to read daily counter");
            0
        });
        dashboard_stats(&progress, &history, completed_today)
    }

    /// Lessons with the highest error rate.
    pub async fn most_challenging(&self) -> Vec<ChallengingLesson> {
        most_challenging(&self.history().await, CHALLENGING_LIMIT)
    }

    /// Stored results, most recent first.
    pub async fn history(&self) -> Vec<TestResult> {
        self.history.list_results().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to read test history");
            Vec::new()
        })
    }

    pub async fn last_result(&self) -> Option<TestResult> {
        self.history.last_result().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to read last result");
            None
        })
    }
}
