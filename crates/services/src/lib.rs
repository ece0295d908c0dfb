#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod recorder;
pub mod sessions;
pub mod stats_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::LessonCatalogService;
pub use error::AppServicesError;
pub use recorder::ResultRecorder;
pub use sessions::{
    LessonLoopResult, LessonLoopService, SessionController, SessionInput, SessionOutcome,
    SessionPhase, SessionProgress, SessionView, Step, TimerHandle,
};
pub use stats_service::StatisticsService;
