use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("answer time budget must be > 0")]
    InvalidAnswerTime,

    #[error("explanation delay must be > 0")]
    InvalidExplanationDelay,

    #[error("history limit must be > 0")]
    InvalidHistoryLimit,
}

/// Tunables for a quiz session, in timer units (one tick per unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    answer_time: u32,
    extend_bonus: u32,
    explanation_delay: u32,
    matching_delay: u32,
    history_limit: usize,
    snapshot_ttl_secs: u64,
}

impl Default for QuizSettings {
    /// 30 units to answer, one +15 extension, 2 units of explanation
    /// (1 after a matching block), the 50 most recent results kept, and an
    /// abandoned attempt resumable for a day.
    fn default() -> Self {
        Self {
            answer_time: 30,
            extend_bonus: 15,
            explanation_delay: 2,
            matching_delay: 1,
            history_limit: 50,
            snapshot_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl QuizSettings {
    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the answer budget, either delay, or the
    /// history limit is zero.
    pub fn new(
        answer_time: u32,
        extend_bonus: u32,
        explanation_delay: u32,
        matching_delay: u32,
        history_limit: usize,
        snapshot_ttl_secs: u64,
    ) -> Result<Self, SettingsError> {
        if answer_time == 0 {
            return Err(SettingsError::InvalidAnswerTime);
        }
        if explanation_delay == 0 || matching_delay == 0 {
            return Err(SettingsError::InvalidExplanationDelay);
        }
        if history_limit == 0 {
            return Err(SettingsError::InvalidHistoryLimit);
        }

        Ok(Self {
            answer_time,
            extend_bonus,
            explanation_delay,
            matching_delay,
            history_limit,
            snapshot_ttl_secs,
        })
    }

    #[must_use]
    pub fn answer_time(&self) -> u32 {
        self.answer_time
    }

    #[must_use]
    pub fn extend_bonus(&self) -> u32 {
        self.extend_bonus
    }

    #[must_use]
    pub fn explanation_delay(&self) -> u32 {
        self.explanation_delay
    }

    #[must_use]
    pub fn matching_delay(&self) -> u32 {
        self.matching_delay
    }

    #[must_use]
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    #[must_use]
    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }
}
