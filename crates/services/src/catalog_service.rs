use std::sync::Arc;

use quiz_core::model::{Lesson, LessonId, LessonProgress, VocabularySet};
use storage::repository::LessonProgressRepository;

/// Serves the lessons built at startup, merged with stored progress.
#[derive(Clone)]
pub struct LessonCatalogService {
    lessons: Arc<Vec<Lesson>>,
    progress: Arc<dyn LessonProgressRepository>,
}

impl LessonCatalogService {
    #[must_use]
    pub fn new(lessons: Vec<Lesson>, progress: Arc<dyn LessonProgressRepository>) -> Self {
        Self {
            lessons: Arc::new(lessons),
            progress,
        }
    }

    /// All lessons carrying their stored progress.
    ///
    /// If progress cannot be read, lessons are returned as generated.
    pub async fn lessons(&self) -> Vec<Lesson> {
        let stored = self.stored_progress().await;
        self.lessons
            .iter()
            .map(|lesson| merge(lesson.clone(), &stored))
            .collect()
    }

    /// One lesson with its stored progress.
    pub async fn lesson(&self, id: LessonId) -> Option<Lesson> {
        let lesson = self.lessons.iter().find(|l| l.id() == id)?.clone();
        let stored = self.stored_progress().await;
        Some(merge(lesson, &stored))
    }

    /// Vocabulary of every lesson, for flashcard browsing.
    #[must_use]
    pub fn vocabulary_sets(&self) -> Vec<VocabularySet> {
        self.lessons
            .iter()
            .map(|l| VocabularySet::new(l.title(), l.vocabulary().to_vec()))
            .collect()
    }

    async fn stored_progress(&self) -> Vec<LessonProgress> {
        match self.progress.list_progress().await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read lesson progress");
                Vec::new()
            }
        }
    }
}

fn merge(lesson: Lesson, stored: &[LessonProgress]) -> Lesson {
    let Some(progress) = stored.iter().find(|p| p.lesson_id == lesson.id()) else {
        return lesson;
    };
    let fallback = lesson.clone();
    lesson.with_progress(progress).unwrap_or_else(|err| {
        tracing::warn!(lesson = %fallback.id(), error = %err, "ignoring stored progress");
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::content::{builtin_sources, load_lessons};
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::Storage;

    fn catalog(storage: &Storage) -> LessonCatalogService {
        let lessons = load_lessons(builtin_sources(), &mut StdRng::seed_from_u64(3)).unwrap();
        LessonCatalogService::new(lessons, Arc::clone(&storage.progress))
    }

    #[tokio::test]
    async fn lessons_carry_stored_progress() {
        let storage = Storage::in_memory();
        let mut progress = LessonProgress::new(LessonId::new(2));
        progress.record_completion(85, fixed_now());
        storage.progress.upsert_progress(&progress).await.unwrap();

        let catalog = catalog(&storage);
        let lessons = catalog.lessons().await;
        assert_eq!(lessons.len(), builtin_sources().len());
        assert_eq!(lessons[0].progress(), 0);
        assert_eq!(lessons[1].progress(), 85);
        assert_eq!(lessons[1].best_score(), Some(85));

        let food = catalog.lesson(LessonId::new(2)).await.unwrap();
        assert_eq!(food.last_completed(), Some(fixed_now()));
        assert!(catalog.lesson(LessonId::new(99)).await.is_none());
    }

    #[tokio::test]
    async fn out_of_range_progress_is_ignored() {
        let storage = Storage::in_memory();
        let broken = LessonProgress {
            progress: 150,
            ..LessonProgress::new(LessonId::new(1))
        };
        storage.progress.upsert_progress(&broken).await.unwrap();

        let lesson = catalog(&storage).lesson(LessonId::new(1)).await.unwrap();
        assert_eq!(lesson.progress(), 0);
    }

    #[test]
    fn exposes_vocabulary_sets_in_lesson_order() {
        let sets = catalog(&Storage::in_memory()).vocabulary_sets();
        assert_eq!(sets[0].title, "Body parts");
        assert_eq!(sets[0].words.len(), 16);
    }
}
