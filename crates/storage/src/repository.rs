use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use quiz_core::Clock;
use quiz_core::model::{LessonId, LessonProgress, SessionSnapshot, TestResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── KEY-VALUE CONTRACT ────────────────────────────────────────────────────────
//

/// Minimal key-value persistence contract every backing implements.
///
/// Values are JSON documents. An entry written with a TTL reads as absent
/// once the TTL has elapsed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing cannot be read.
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>)
    -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub(crate) fn expiry_for(
    now: DateTime<Utc>,
    ttl: Option<Duration>,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    ttl.map(|ttl| {
        chrono::Duration::from_std(ttl)
            .map(|delta| now + delta)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    })
    .transpose()
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

/// Simple in-memory store for short-lived state and tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Clock,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Clock::default_clock())
    }

    /// Store that judges expiry against `clock`.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let now = self.clock.now();
        match guard.get(key) {
            Some(entry) if entry.expires_at.is_some_and(|at| at <= now) => {
                guard.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let expires_at = expiry_for(self.clock.now(), ttl)?;
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

//
// ─── VERSIONED VALUES ──────────────────────────────────────────────────────────
//

/// Current layout version of every persisted value.
pub const SCHEMA_VERSION: u32 = 1;

pub mod keys {
    //! Store keys used by the typed repositories.

    use chrono::NaiveDate;

    pub const LESSON_PROGRESS: &str = "lesson_progress";
    pub const TEST_HISTORY: &str = "test_results";
    pub const LAST_RESULT: &str = "last_test_result";
    pub const SESSION_SNAPSHOT: &str = "session_snapshot";

    /// Per-day completed-lesson counter, e.g. `daily_activity:2023-11-14`.
    #[must_use]
    pub fn daily_activity(day: NaiveDate) -> String {
        format!("daily_activity:{}", day.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

fn seal<T: Serialize>(data: &T) -> Result<Value, StorageError> {
    serde_json::to_value(Envelope {
        version: SCHEMA_VERSION,
        data,
    })
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Unwrap an envelope; a value written under another version reads as absent.
fn open<T: DeserializeOwned>(key: &str, value: Value) -> Result<Option<T>, StorageError> {
    let version = value.get("version").and_then(Value::as_u64);
    if version != Some(u64::from(SCHEMA_VERSION)) {
        tracing::debug!(key, ?version, "ignoring value with unknown layout version");
        return Ok(None);
    }
    serde_json::from_value::<Envelope<T>>(value)
        .map(|envelope| Some(envelope.data))
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

#[async_trait]
pub trait LessonProgressRepository: Send + Sync {
    /// All stored progress records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn list_progress(&self) -> Result<Vec<LessonProgress>, StorageError>;

    /// Progress for one lesson, if it was ever recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn get_progress(&self, id: LessonId) -> Result<Option<LessonProgress>, StorageError>;

    /// Insert or replace the progress record of `progress.lesson_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError>;
}

#[async_trait]
pub trait TestHistoryRepository: Send + Sync {
    /// Stored results, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be read.
    async fn list_results(&self) -> Result<Vec<TestResult>, StorageError>;

    /// Prepend `result`, keeping at most `limit` entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be stored.
    async fn append_result(&self, result: &TestResult, limit: usize) -> Result<(), StorageError>;

    /// The most recently finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read.
    async fn last_result(&self) -> Result<Option<TestResult>, StorageError>;

    /// Store `result` as the most recently finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set_last_result(&self, result: &TestResult) -> Result<(), StorageError>;
}

#[async_trait]
pub trait DailyActivityRepository: Send + Sync {
    /// Lessons completed on `day`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counter cannot be read.
    async fn completed_on(&self, day: NaiveDate) -> Result<u32, StorageError>;

    /// Count one more completed lesson on `day`, returning the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counter cannot be updated.
    async fn increment(&self, day: NaiveDate) -> Result<u32, StorageError>;
}

#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// The saved in-progress attempt, if one is still live.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be read.
    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Save the in-progress attempt, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(
        &self,
        snapshot: &SessionSnapshot,
        ttl: Duration,
    ) -> Result<(), StorageError>;

    /// Drop any saved attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be removed.
    async fn clear_snapshot(&self) -> Result<(), StorageError>;
}

/// Typed repositories implemented over any `KeyValueStore`.
#[derive(Clone)]
pub struct KvRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(value) => open(key, value),
            None => Ok(None),
        }
    }

    /// Current value ahead of a read-modify-write. A value that no longer
    /// deserializes is logged and treated as absent so the write replaces it.
    async fn read_for_update<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.read(key).await {
            Err(StorageError::Serialization(err)) => {
                tracing::warn!(key, error = %err, "replacing unreadable stored value");
                Ok(None)
            }
            other => other,
        }
    }

    async fn write<T: Serialize + Sync>(
        &self,
        key: &str,
        data: &T,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let value = seal(data)?;
        self.store.set(key, value, ttl).await?;
        tracing::debug!(key, "stored value");
        Ok(())
    }
}

#[async_trait]
impl LessonProgressRepository for KvRepository {
    async fn list_progress(&self) -> Result<Vec<LessonProgress>, StorageError> {
        Ok(self
            .read::<Vec<LessonProgress>>(keys::LESSON_PROGRESS)
            .await?
            .unwrap_or_default())
    }

    async fn get_progress(&self, id: LessonId) -> Result<Option<LessonProgress>, StorageError> {
        let all = self.list_progress().await?;
        Ok(all.into_iter().find(|p| p.lesson_id == id))
    }

    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        let mut all = self
            .read_for_update::<Vec<LessonProgress>>(keys::LESSON_PROGRESS)
            .await?
            .unwrap_or_default();
        match all.iter_mut().find(|p| p.lesson_id == progress.lesson_id) {
            Some(existing) => *existing = progress.clone(),
            None => all.push(progress.clone()),
        }
        all.sort_by_key(|p| p.lesson_id);
        self.write(keys::LESSON_PROGRESS, &all, None).await
    }
}

#[async_trait]
impl TestHistoryRepository for KvRepository {
    async fn list_results(&self) -> Result<Vec<TestResult>, StorageError> {
        Ok(self
            .read::<Vec<TestResult>>(keys::TEST_HISTORY)
            .await?
            .unwrap_or_default())
    }

    async fn append_result(&self, result: &TestResult, limit: usize) -> Result<(), StorageError> {
        let mut history = self
            .read_for_update::<Vec<TestResult>>(keys::TEST_HISTORY)
            .await?
            .unwrap_or_default();
        history.insert(0, result.clone());
        history.truncate(limit);
        self.write(keys::TEST_HISTORY, &history, None).await
    }

    async fn last_result(&self) -> Result<Option<TestResult>, StorageError> {
        self.read(keys::LAST_RESULT).await
    }

    async fn set_last_result(&self, result: &TestResult) -> Result<(), StorageError> {
        self.write(keys::LAST_RESULT, result, None).await
    }
}

#[async_trait]
impl DailyActivityRepository for KvRepository {
    async fn completed_on(&self, day: NaiveDate) -> Result<u32, StorageError> {
        Ok(self
            .read::<u32>(&keys::daily_activity(day))
            .await?
            .unwrap_or(0))
    }

    async fn increment(&self, day: NaiveDate) -> Result<u32, StorageError> {
        let key = keys::daily_activity(day);
        let count = self
            .read_for_update::<u32>(&key)
            .await?
            .unwrap_or(0)
            .saturating_add(1);
        self.write(&key, &count, None).await?;
        Ok(count)
    }
}

#[async_trait]
impl SessionSnapshotRepository for KvRepository {
    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        self.read(keys::SESSION_SNAPSHOT).await
    }

    async fn save_snapshot(
        &self,
        snapshot: &SessionSnapshot,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        self.write(keys::SESSION_SNAPSHOT, snapshot, Some(ttl)).await
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        self.store.remove(keys::SESSION_SNAPSHOT).await
    }
}

/// Aggregates the typed repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn LessonProgressRepository>,
    pub history: Arc<dyn TestHistoryRepository>,
    pub activity: Arc<dyn DailyActivityRepository>,
    pub snapshots: Arc<dyn SessionSnapshotRepository>,
}

impl Storage {
    /// Typed repositories over an arbitrary key-value backing.
    #[must_use]
    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = KvRepository::new(store);
        let progress: Arc<dyn LessonProgressRepository> = Arc::new(repo.clone());
        let history: Arc<dyn TestHistoryRepository> = Arc::new(repo.clone());
        let activity: Arc<dyn DailyActivityRepository> = Arc::new(repo.clone());
        let snapshots: Arc<dyn SessionSnapshotRepository> = Arc::new(repo);
        Self {
            progress,
            history,
            activity,
            snapshots,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    /// In-memory storage whose expiry follows `clock`.
    #[must_use]
    pub fn in_memory_with_clock(clock: Clock) -> Self {
        Self::from_store(Arc::new(InMemoryStore::with_clock(clock)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use quiz_core::time::{fixed_clock, fixed_now};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn result(lesson: u64, score: u8) -> TestResult {
        TestResult {
            lesson_id: LessonId::new(lesson),
            lesson_title: format!("Lesson {lesson}"),
            score,
            total_questions: 10,
            correct_answers: 10,
            incorrect_attempts: BTreeMap::from([(QuestionId::new(2), 1)]),
            incorrect_answers: Vec::new(),
            time_spent_secs: 30,
            completed_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn in_memory_store_round_trips_and_removes() {
        let store = InMemoryStore::new();
        store.set("k", json!({"a": 1}), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = InMemoryStore::with_clock(fixed_clock());
        store
            .set("gone", json!(1), Some(Duration::ZERO))
            .await
            .unwrap();
        store
            .set("live", json!(2), Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(store.get("gone").await.unwrap(), None);
        assert_eq!(store.get("live").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn values_are_wrapped_in_a_versioned_envelope() {
        let store = Arc::new(InMemoryStore::new());
        let repo = KvRepository::new(store.clone());
        let day = fixed_now().date_naive();
        repo.increment(day).await.unwrap();

        let raw = store.get("daily_activity:2023-11-14").await.unwrap();
        assert_eq!(raw, Some(json!({"version": 1, "data": 1})));
    }

    #[tokio::test]
    async fn unknown_version_reads_as_missing() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(
                keys::TEST_HISTORY,
                json!({"version": 99, "data": "whatever"}),
                None,
            )
            .await
            .unwrap();
        let repo = KvRepository::new(store);
        assert!(repo.list_results().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_is_a_serialization_error() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(keys::LAST_RESULT, json!({"version": 1, "data": 5}), None)
            .await
            .unwrap();
        let repo = KvRepository::new(store);
        assert!(matches!(
            repo.last_result().await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn writes_replace_values_that_no_longer_deserialize() {
        let store = Arc::new(InMemoryStore::new());
        let day = fixed_now().date_naive();
        for (key, data) in [
            (keys::TEST_HISTORY.to_owned(), json!("garbage")),
            (keys::LESSON_PROGRESS.to_owned(), json!(7)),
            (keys::daily_activity(day), json!([1, 2])),
        ] {
            store
                .set(&key, json!({"version": 1, "data": data}), None)
                .await
                .unwrap();
        }
        let repo = KvRepository::new(store);

        repo.append_result(&result(1, 70), 50).await.unwrap();
        repo.upsert_progress(&LessonProgress::new(LessonId::new(1)))
            .await
            .unwrap();
        assert_eq!(repo.increment(day).await.unwrap(), 1);

        assert_eq!(repo.list_results().await.unwrap().len(), 1);
        assert_eq!(repo.list_progress().await.unwrap().len(), 1);
        assert_eq!(repo.completed_on(day).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn progress_upsert_replaces_per_lesson() {
        let storage = Storage::in_memory();
        let mut progress = LessonProgress::new(LessonId::new(2));
        progress.record_completion(60, fixed_now());
        storage.progress.upsert_progress(&progress).await.unwrap();
        storage
            .progress
            .upsert_progress(&LessonProgress::new(LessonId::new(1)))
            .await
            .unwrap();

        progress.record_completion(80, fixed_now());
        storage.progress.upsert_progress(&progress).await.unwrap();

        let all = storage.progress.list_progress().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].lesson_id, LessonId::new(1));
        let stored = storage
            .progress
            .get_progress(LessonId::new(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.best_score, Some(80));
    }

    #[tokio::test]
    async fn history_is_capped_most_recent_first() {
        let storage = Storage::in_memory();
        for score in 0..51 {
            storage
                .history
                .append_result(&result(1, score), 50)
                .await
                .unwrap();
        }

        let history = storage.history.list_results().await.unwrap();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].score, 50);
        assert_eq!(history[49].score, 1);
    }

    #[tokio::test]
    async fn last_result_and_daily_counter() {
        let storage = Storage::in_memory();
        assert!(storage.history.last_result().await.unwrap().is_none());
        storage.history.set_last_result(&result(3, 90)).await.unwrap();
        assert_eq!(
            storage.history.last_result().await.unwrap().unwrap().score,
            90
        );

        let day = fixed_now().date_naive();
        assert_eq!(storage.activity.completed_on(day).await.unwrap(), 0);
        assert_eq!(storage.activity.increment(day).await.unwrap(), 1);
        assert_eq!(storage.activity.increment(day).await.unwrap(), 2);
        assert_eq!(
            storage.activity.completed_on(day.succ_opt().unwrap()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn snapshot_save_load_clear() {
        let storage = Storage::in_memory_with_clock(fixed_clock());
        let snapshot = SessionSnapshot {
            lesson_id: LessonId::new(4),
            deck: Vec::new(),
            active: vec![QuestionId::new(1)],
            index: 0,
            repeat_mode: false,
            deferred: Vec::new(),
            incorrect_attempts: BTreeMap::new(),
            time_extended: false,
            started_at: fixed_now(),
        };
        storage
            .snapshots
            .save_snapshot(&snapshot, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            storage.snapshots.load_snapshot().await.unwrap(),
            Some(snapshot.clone())
        );

        storage.snapshots.clear_snapshot().await.unwrap();
        assert!(storage.snapshots.load_snapshot().await.unwrap().is_none());

        storage
            .snapshots
            .save_snapshot(&snapshot, Duration::ZERO)
            .await
            .unwrap();
        assert!(storage.snapshots.load_snapshot().await.unwrap().is_none());
    }
}
