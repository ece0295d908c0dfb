use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, QuestionId};

/// Score for an attempt: `max(0, round((1 - incorrect / total) * 100))`.
///
/// An empty deck scores 0.
#[must_use]
pub fn compute_score(total_questions: usize, incorrect_attempts: u32) -> u8 {
    if total_questions == 0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = f64::from(incorrect_attempts) / total_questions as f64;
    let score = ((1.0 - ratio) * 100.0).round().clamp(0.0, 100.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = score as u8;
    score
}

/// One question the learner struggled with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectAnswer {
    pub question_id: QuestionId,
    pub prompt: String,
    pub attempts: u32,
    pub correct_answer: String,
}

/// Outcome of one finished lesson attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub lesson_id: LessonId,
    pub lesson_title: String,
    pub score: u8,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_attempts: BTreeMap<QuestionId, u32>,
    #[serde(default)]
    pub incorrect_answers: Vec<IncorrectAnswer>,
    pub time_spent_secs: u64,
    pub completed_at: DateTime<Utc>,
}

impl TestResult {
    /// Total number of wrong attempts across all questions.
    #[must_use]
    pub fn total_incorrect(&self) -> u32 {
        self.incorrect_attempts.values().sum()
    }

    /// Share of questions answered without any miss, in percent.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let accuracy = self.correct_answers as f64 / self.total_questions as f64 * 100.0;
        accuracy
    }

    /// Average seconds spent per question.
    #[must_use]
    pub fn average_time_per_question(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg = self.time_spent_secs as f64 / self.total_questions as f64;
        avg
    }
}
