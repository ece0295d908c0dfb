use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::question::Question;
use crate::model::vocabulary::VocabularyPair;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson has no questions")]
    NoQuestions,

    #[error("progress must be between 0 and 100, got {0}")]
    InvalidProgress(u8),
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Persisted progress of a lesson, independent of its (regenerated) questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: LessonId,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<DateTime<Utc>>,
}

impl LessonProgress {
    #[must_use]
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            progress: 0,
            best_score: None,
            last_completed: None,
        }
    }

    /// Fold a completed attempt into this progress.
    ///
    /// Progress and best score only ever move up.
    pub fn record_completion(&mut self, score: u8, completed_at: DateTime<Utc>) {
        let score = score.min(100);
        self.progress = self.progress.max(score);
        self.best_score = Some(self.best_score.map_or(score, |best| best.max(score)));
        self.last_completed = Some(completed_at);
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A lesson: its vocabulary source, the generated deck and the learner's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    id: LessonId,
    title: String,
    description: String,
    questions: Vec<Question>,
    vocabulary: Vec<VocabularyPair>,
    progress: u8,
    best_score: Option<u8>,
    last_completed: Option<DateTime<Utc>>,
}

impl Lesson {
    /// Creates a lesson with no recorded progress.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` for a blank title and
    /// `LessonError::NoQuestions` for an empty deck.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
        vocabulary: Vec<VocabularyPair>,
    ) -> Result<Self, LessonError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if questions.is_empty() {
            return Err(LessonError::NoQuestions);
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            questions,
            vocabulary,
            progress: 0,
            best_score: None,
            last_completed: None,
        })
    }

    /// Returns a copy of the lesson carrying the given persisted progress.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidProgress` if the stored progress exceeds 100.
    pub fn with_progress(mut self, progress: &LessonProgress) -> Result<Self, LessonError> {
        if progress.progress > 100 {
            return Err(LessonError::InvalidProgress(progress.progress));
        }
        self.progress = self.progress.max(progress.progress);
        self.best_score = match (self.best_score, progress.best_score) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.last_completed = progress.last_completed.or(self.last_completed);
        Ok(self)
    }

    /// The persisted projection of this lesson.
    #[must_use]
    pub fn progress_record(&self) -> LessonProgress {
        LessonProgress {
            lesson_id: self.id,
            progress: self.progress,
            best_score: self.best_score,
            last_completed: self.last_completed,
        }
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn vocabulary(&self) -> &[VocabularyPair] {
        &self.vocabulary
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn best_score(&self) -> Option<u8> {
        self.best_score
    }

    #[must_use]
    pub fn last_completed(&self) -> Option<DateTime<Utc>> {
        self.last_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuestionId;
    use crate::model::question::{Direction, QuestionKind};
    use crate::time::fixed_now;

    fn one_question() -> Vec<Question> {
        vec![Question {
            id: QuestionId::new(0),
            prompt: "What does \"ojo\" mean?".into(),
            explanation: None,
            kind: QuestionKind::TextInput {
                direction: Direction::TermToTranslation,
                answer: "oko".into(),
            },
        }]
    }

    #[test]
    fn rejects_blank_title_and_empty_deck() {
        let err = Lesson::new(LessonId::new(1), "  ", "", one_question(), Vec::new()).unwrap_err();
        assert_eq!(err, LessonError::EmptyTitle);

        let err = Lesson::new(LessonId::new(1), "Body", "", Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, LessonError::NoQuestions);
    }

    #[test]
    fn best_score_never_decreases() {
        let mut progress = LessonProgress::new(LessonId::new(1));
        progress.record_completion(60, fixed_now());
        progress.record_completion(80, fixed_now());
        assert_eq!(progress.best_score, Some(80));
        assert_eq!(progress.progress, 80);

        let mut progress = LessonProgress::new(LessonId::new(1));
        progress.record_completion(80, fixed_now());
        progress.record_completion(60, fixed_now());
        assert_eq!(progress.best_score, Some(80));
        assert_eq!(progress.progress, 80);
    }

    #[test]
    fn lesson_takes_persisted_progress() {
        let lesson = Lesson::new(LessonId::new(3), "Body", "", one_question(), Vec::new()).unwrap();
        let stored = LessonProgress {
            lesson_id: LessonId::new(3),
            progress: 75,
            best_score: Some(75),
            last_completed: Some(fixed_now()),
        };

        let lesson = lesson.with_progress(&stored).unwrap();
        assert_eq!(lesson.progress(), 75);
        assert_eq!(lesson.best_score(), Some(75));
        assert_eq!(lesson.progress_record(), stored);
    }

    #[test]
    fn rejects_out_of_range_progress() {
        let lesson = Lesson::new(LessonId::new(3), "Body", "", one_question(), Vec::new()).unwrap();
        let stored = LessonProgress {
            progress: 140,
            ..LessonProgress::new(LessonId::new(3))
        };
        assert_eq!(
            lesson.with_progress(&stored).unwrap_err(),
            LessonError::InvalidProgress(140)
        );
    }
}
