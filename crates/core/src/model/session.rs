use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, QuestionId};
use crate::model::question::Question;

/// Resumable state of an in-progress lesson attempt.
///
/// The deck is stored as generated for this attempt, since lessons shuffle a
/// fresh deck on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub lesson_id: LessonId,
    pub deck: Vec<Question>,
    /// Questions of the pass in progress (the whole deck, or the repeat queue).
    pub active: Vec<QuestionId>,
    pub index: usize,
    pub repeat_mode: bool,
    pub deferred: Vec<QuestionId>,
    pub incorrect_attempts: BTreeMap<QuestionId, u32>,
    /// Whether the current question already used its extra time.
    #[serde(default)]
    pub time_extended: bool,
    pub started_at: DateTime<Utc>,
}
