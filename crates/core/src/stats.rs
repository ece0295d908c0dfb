//! Aggregates over lesson progress and result history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{LessonId, LessonProgress, TestResult};

/// How many lessons the "most challenging" ranking returns by default.
pub const CHALLENGING_LIMIT: usize = 5;

/// Headline numbers for the learner's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_lessons: usize,
    /// Lessons whose progress reached 100.
    pub completed_lessons: usize,
    pub average_progress: u8,
    /// Mean accuracy over the result history.
    pub average_score: u8,
    pub average_best_score: u8,
    pub total_time_secs: u64,
    /// Results recorded in the history.
    pub attempts: usize,
    pub completed_today: u32,
}

/// A lesson ranked by how often the learner misses its questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengingLesson {
    pub lesson_id: LessonId,
    pub lesson_title: String,
    /// Wrong attempts per hundred questions asked, across all attempts.
    pub error_rate: f64,
    pub attempts: usize,
}

/// Build dashboard statistics.
///
/// `progress` holds one record per known lesson; lessons never attempted
/// count towards the total with zero progress.
#[must_use]
pub fn dashboard_stats(
    progress: &[LessonProgress],
    history: &[TestResult],
    completed_today: u32,
) -> DashboardStats {
    let total_lessons = progress.len();
    let completed_lessons = progress.iter().filter(|p| p.progress >= 100).count();
    let average_progress = rounded_mean(progress.iter().map(|p| f64::from(p.progress)));
    let average_best_score = rounded_mean(progress.iter().filter_map(|p| p.best_score).map(f64::from));
    let average_score = rounded_mean(history.iter().map(TestResult::accuracy));
    let total_time_secs = history.iter().map(|r| r.time_spent_secs).sum();

    DashboardStats {
        total_lessons,
        completed_lessons,
        average_progress,
        average_score,
        average_best_score,
        total_time_secs,
        attempts: history.len(),
        completed_today,
    }
}

/// Rank lessons by error rate, highest first, keeping at most `limit`.
///
/// Lessons without a single wrong attempt are left out.
#[must_use]
pub fn most_challenging(history: &[TestResult], limit: usize) -> Vec<ChallengingLesson> {
    #[derive(Default)]
    struct Tally {
        title: String,
        questions: usize,
        incorrect: u64,
        attempts: usize,
    }

    let mut tallies: BTreeMap<LessonId, Tally> = BTreeMap::new();
    for result in history {
        let tally = tallies.entry(result.lesson_id).or_default();
        if tally.title.is_empty() {
            tally.title.clone_from(&result.lesson_title);
        }
        tally.questions += result.total_questions;
        tally.incorrect += u64::from(result.total_incorrect());
        tally.attempts += 1;
    }

    let mut ranked: Vec<ChallengingLesson> = tallies
        .into_iter()
        .filter(|(_, t)| t.incorrect > 0 && t.questions > 0)
        .map(|(lesson_id, t)| {
            #[allow(clippy::cast_precision_loss)]
            let error_rate = t.incorrect as f64 / t.questions as f64 * 100.0;
            ChallengingLesson {
                lesson_id,
                lesson_title: t.title,
                error_rate,
                attempts: t.attempts,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.error_rate.total_cmp(&a.error_rate));
    ranked.truncate(limit);
    ranked
}

fn rounded_mean(values: impl Iterator<Item = f64>) -> u8 {
    let (sum, count) = values.fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mean = (sum / f64::from(count)).round().clamp(0.0, 100.0) as u8;
    mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;

    fn result(lesson: u64, title: &str, total: usize, correct: usize, misses: &[u32], secs: u64) -> TestResult {
        let incorrect_attempts: BTreeMap<_, _> = misses
            .iter()
            .enumerate()
            .map(|(i, n)| (QuestionId::new(u32::try_from(i).unwrap()), *n))
            .collect();
        TestResult {
            lesson_id: LessonId::new(lesson),
            lesson_title: title.into(),
            score: 0,
            total_questions: total,
            correct_answers: correct,
            incorrect_attempts,
            incorrect_answers: Vec::new(),
            time_spent_secs: secs,
            completed_at: fixed_now(),
        }
    }

    fn progress(lesson: u64, value: u8, best: Option<u8>) -> LessonProgress {
        LessonProgress {
            progress: value,
            best_score: best,
            ..LessonProgress::new(LessonId::new(lesson))
        }
    }

    #[test]
    fn empty_inputs_give_zeroes() {
        let stats = dashboard_stats(&[], &[], 0);
        assert_eq!(stats, DashboardStats::default());
        assert!(most_challenging(&[], CHALLENGING_LIMIT).is_empty());
    }

    #[test]
    fn dashboard_aggregates_progress_and_history() {
        let lessons = [progress(1, 100, Some(100)), progress(2, 50, Some(40)), progress(3, 0, None)];
        let history = [result(1, "Body", 10, 10, &[], 60), result(2, "Food", 10, 5, &[2, 3], 90)];

        let stats = dashboard_stats(&lessons, &history, 2);
        assert_eq!(stats.total_lessons, 3);
        assert_eq!(stats.completed_lessons, 1);
        assert_eq!(stats.average_progress, 50);
        assert_eq!(stats.average_best_score, 70);
        assert_eq!(stats.average_score, 75);
        assert_eq!(stats.total_time_secs, 150);
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.completed_today, 2);
    }

    #[test]
    fn challenging_lessons_are_ranked_by_error_rate() {
        let history = [
            result(1, "Body", 10, 9, &[1], 10),
            result(2, "Food", 10, 6, &[2, 2], 10),
            result(2, "Food", 10, 10, &[], 10),
            result(3, "Numbers", 10, 10, &[], 10),
        ];

        let ranked = most_challenging(&history, CHALLENGING_LIMIT);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].lesson_title, "Food");
        assert_eq!(ranked[0].attempts, 2);
        assert!((ranked[0].error_rate - 20.0).abs() < f64::EPSILON);
        assert_eq!(ranked[1].lesson_id, LessonId::new(1));
        assert!((ranked[1].error_rate - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ranking_respects_limit() {
        let history: Vec<_> = (1..=8).map(|i| result(i, "L", 10, 9, &[1], 1)).collect();
        assert_eq!(most_challenging(&history, CHALLENGING_LIMIT).len(), 5);
    }
}
