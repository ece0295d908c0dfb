use std::sync::Arc;

use quiz_core::content::{builtin_sources, load_lessons};
use quiz_core::model::QuizSettings;
use rand::Rng;
use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::LessonCatalogService;
use crate::error::AppServicesError;
use crate::recorder::ResultRecorder;
use crate::sessions::LessonLoopService;
use crate::stats_service::StatisticsService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    settings: QuizSettings,
    catalog: Arc<LessonCatalogService>,
    lesson_loop: Arc<LessonLoopService>,
    statistics: Arc<StatisticsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or lesson loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        tracing::info!(db_url, "using sqlite storage");
        Self::from_storage(&storage, clock, settings, &mut rand::rng())
    }

    /// Build services over a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if lesson loading fails.
    pub fn in_memory(clock: Clock, settings: QuizSettings) -> Result<Self, AppServicesError> {
        let storage = Storage::in_memory_with_clock(clock);
        Self::from_storage(&storage, clock, settings, &mut rand::rng())
    }

    /// Build services over `storage`, generating lesson decks with `rng`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Lesson` if a built-in lesson is invalid.
    pub fn from_storage<R: Rng + ?Sized>(
        storage: &Storage,
        clock: Clock,
        settings: QuizSettings,
        rng: &mut R,
    ) -> Result<Self, AppServicesError> {
        let lessons = load_lessons(builtin_sources(), rng)?;
        tracing::debug!(lessons = lessons.len(), "lessons loaded");

        let catalog = Arc::new(LessonCatalogService::new(
            lessons,
            Arc::clone(&storage.progress),
        ));
        let recorder = ResultRecorder::new(
            clock,
            &settings,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.history),
            Arc::clone(&storage.activity),
        );
        let lesson_loop = Arc::new(LessonLoopService::new(
            clock,
            settings.clone(),
            Arc::clone(&storage.snapshots),
            recorder,
        ));
        let statistics = Arc::new(StatisticsService::new(
            clock,
            Arc::clone(&storage.history),
            Arc::clone(&storage.activity),
        ));

        Ok(Self {
            settings,
            catalog,
            lesson_loop,
            statistics,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<LessonCatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn lesson_loop(&self) -> Arc<LessonLoopService> {
        Arc::clone(&self.lesson_loop)
    }

    #[must_use]
    pub fn statistics(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.statistics)
    }
}
