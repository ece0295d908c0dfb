//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::LessonError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
}
